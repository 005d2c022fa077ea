//! A simple program demonstrates how to use `fanout-agent` as a library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use fanout_agent::core::{LocalTask, TaskRuntime};
use fanout_agent::{Config, build_agent};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let agent = match build_agent(&config) {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("failed to set up the agent: {err}");
            return;
        }
    };
    let system_prompt = config
        .instructions
        .as_ref()
        .map(|instructions| instructions.to_system_prompt());

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let mut task: Option<LocalTask> = None;
    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Follow-up inputs continue the same conversation.
        let is_follow_up = task.is_some();
        let task = task.get_or_insert_with(|| {
            let new_task = LocalTask::new(line);
            match &system_prompt {
                Some(prompt) => new_task.with_system_prompt(prompt.clone()),
                None => new_task,
            }
        });
        if is_follow_up {
            task.add_input(line);
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let result = agent.run(task).await;
        progress_bar.finish_and_clear();

        match result {
            Ok(report) => {
                let bar = if report.is_success {
                    BAR_CHAR.bright_cyan().to_string()
                } else {
                    BAR_CHAR.bright_red().to_string()
                };
                println!("{bar}🤖 {}", report.result.bright_white());
                if !report.used_tools.is_empty() {
                    println!(
                        "{bar}{}",
                        format!("tools: {}", report.used_tools.join(", "))
                            .dimmed()
                    );
                }
                println!(
                    "{bar}{}",
                    format!(
                        "{} steps, {} tokens (output: {}, input: {}) in {:.2?}",
                        report.steps,
                        report.usage.total_tokens,
                        report.usage.completion_tokens,
                        report.usage.prompt_tokens,
                        report.elapsed
                    )
                    .dimmed()
                );
            }
            Err(err) => {
                println!("{}❌ {}", BAR_CHAR.bright_red(), err.bright_red());
                if !task.is_finished() {
                    warn!("the last input is kept in the conversation");
                }
            }
        }
        println!();
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
