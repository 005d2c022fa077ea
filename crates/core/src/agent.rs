mod local_task;

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::time::Duration;

use async_trait::async_trait;
use fanout_agent_model::{
    ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelTool, ToolCallRequest, ToolChoice, Usage,
};
use tokio::time::Instant;
use tracing::Instrument;

use crate::model_client::ModelClient;
use crate::tool::{CallResult, FunctionCall, Registry, execute_calls};
pub use local_task::LocalTask;

const DEFAULT_MAX_STEPS: usize = 32;

/// The task an [`AgentLoop`] works on.
///
/// A runtime owns the conversation state and decides when the task is
/// done. Hosting environments that route some tools to remote services
/// implement [`run_cloud_tools`](TaskRuntime::run_cloud_tools) and return
/// only the remaining calls from
/// [`pending_local_calls`](TaskRuntime::pending_local_calls).
#[async_trait]
pub trait TaskRuntime: Send {
    /// Returns `true` once no further model round is needed.
    fn is_finished(&self) -> bool;

    /// Returns the messages to send to the model in the next round.
    fn messages(&self) -> Vec<ModelMessage>;

    /// Returns the tool choice for the next round.
    fn tool_choice(&self) -> Option<ToolChoice> {
        None
    }

    /// Returns tools served by the runtime itself, offered to the model
    /// next to the local ones.
    fn cloud_tools(&self) -> Vec<ModelTool> {
        vec![]
    }

    /// Records a model response.
    fn record_response(&mut self, response: &ModelResponse);

    /// Runs the calls the runtime serves itself and records their results.
    ///
    /// Calls the runtime doesn't serve may come back with placeholder
    /// results, which are discarded if the call is also returned from
    /// [`pending_local_calls`](TaskRuntime::pending_local_calls).
    async fn run_cloud_tools(
        &mut self,
        calls: &[ToolCallRequest],
    ) -> Vec<CallResult> {
        let _ = calls;
        vec![]
    }

    /// Returns the calls that must be executed locally.
    fn pending_local_calls(
        &mut self,
        calls: &[ToolCallRequest],
    ) -> Vec<FunctionCall>;

    /// Records the results of local calls.
    fn record_tool_results(&mut self, results: &[CallResult]);

    /// Receives the accumulated token usage after every round.
    fn report_metrics(&mut self, usage: &Usage, model_id: &str) {
        let _ = (usage, model_id);
    }

    /// Returns the final result of the task.
    fn outcome(&self) -> TaskOutcome;
}

/// The final result of a task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskOutcome {
    /// The answer to report.
    pub result: String,
    /// Whether the task completed successfully.
    pub is_success: bool,
}

/// Summary of one [`AgentLoop::run`].
#[derive(Clone, Debug)]
pub struct ExecutionReport {
    /// The answer to report.
    pub result: String,
    /// Whether the task completed successfully.
    pub is_success: bool,
    /// Number of model rounds.
    pub steps: usize,
    /// Tokens used across all rounds.
    pub usage: Usage,
    /// Names of the tools called, in call order.
    pub used_tools: Vec<String>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Errors that stop an [`AgentLoop::run`].
#[derive(Debug)]
pub enum AgentError {
    /// The model provider failed, after retries if the error was transient.
    Model(Box<dyn ModelProviderError>),
    /// The task was not finished within the step limit.
    MaxStepsExceeded(usize),
}

impl Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Model(err) => write!(f, "model request failed: {err}"),
            AgentError::MaxStepsExceeded(steps) => {
                write!(f, "task not finished after {steps} steps")
            }
        }
    }
}

impl StdError for AgentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AgentError::Model(err) => Some(err.as_ref()),
            AgentError::MaxStepsExceeded(_) => None,
        }
    }
}

/// Drives a [`TaskRuntime`]: calls the model, runs the requested tools and
/// feeds the results back until the runtime is finished.
pub struct AgentLoop {
    model_client: ModelClient,
    registry: Registry,
    temperature: f32,
    max_steps: usize,
}

impl AgentLoop {
    /// Creates a loop over the given model provider and local tools.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        registry: Registry,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry,
            temperature: 0.0,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Sets the sampling temperature. Defaults to `0.0`.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum number of model rounds per run.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets how long transient model errors are retried.
    #[inline]
    pub fn with_max_retry_time(mut self, max_retry_time: Duration) -> Self {
        self.model_client.set_max_retry_time(max_retry_time);
        self
    }

    /// Sets the delay before the first retry of a transient model error.
    #[inline]
    pub fn with_initial_retry_interval(mut self, interval: Duration) -> Self {
        self.model_client.set_initial_retry_interval(interval);
        self
    }

    /// Returns the local tools.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the task until the runtime reports it finished.
    pub async fn run<R>(
        &self,
        runtime: &mut R,
    ) -> Result<ExecutionReport, AgentError>
    where
        R: TaskRuntime + ?Sized,
    {
        info!("🪄 Starting Agent Loop");
        let start = Instant::now();
        let mut usage = Usage::default();
        let mut used_tools = vec![];
        let mut step = 0;

        while !runtime.is_finished() {
            if step == self.max_steps {
                warn!("giving up after {step} steps");
                return Err(AgentError::MaxStepsExceeded(step));
            }
            step += 1;
            info!("🔍 Step {step}");

            let step_usage = self
                .run_step(runtime, &mut used_tools)
                .instrument(debug_span!("agent step", step))
                .await?;
            usage += step_usage;
            runtime.report_metrics(&usage, self.model_client.model_id());

            info!(
                "🔢 Step {step} tokens used: {} (output: {}, input: {})",
                step_usage.total_tokens,
                step_usage.completion_tokens,
                step_usage.prompt_tokens
            );
        }

        let elapsed = start.elapsed();
        info!("✨ Execution duration: {elapsed:.2?}");
        info!(
            "🔢 Total tokens used: {} (output: {}, input: {})",
            usage.total_tokens, usage.completion_tokens, usage.prompt_tokens
        );

        let TaskOutcome { result, is_success } = runtime.outcome();
        Ok(ExecutionReport {
            result,
            is_success,
            steps: step,
            usage,
            used_tools,
            elapsed,
        })
    }

    async fn run_step<R>(
        &self,
        runtime: &mut R,
        used_tools: &mut Vec<String>,
    ) -> Result<Usage, AgentError>
    where
        R: TaskRuntime + ?Sized,
    {
        let mut tools = self.registry.definitions();
        tools.extend(runtime.cloud_tools());
        let request = ModelRequest {
            messages: runtime.messages(),
            tools,
            tool_choice: runtime.tool_choice(),
            temperature: Some(self.temperature),
        };

        let response = self
            .model_client
            .send_request(&request)
            .await
            .map_err(AgentError::Model)?;
        runtime.record_response(&response);

        let mut cloud_results = runtime.run_cloud_tools(&response.tool_calls).await;
        let local_calls = runtime.pending_local_calls(&response.tool_calls);

        // Cloud results for calls that turned out to be local are
        // placeholders.
        let local_ids: HashSet<String> =
            local_calls.iter().map(|c| c.call_id.clone()).collect();
        cloud_results.retain(|r| !local_ids.contains(&r.call_id));

        let local_results = execute_calls(local_calls, &self.registry).await;
        if !local_results.is_empty() {
            runtime.record_tool_results(&local_results);
        }

        for result in cloud_results.iter().chain(&local_results) {
            let emoji = if result.is_success() { "✅" } else { "❌" };
            info!("{emoji} {}", result.function_name);
            used_tools.push(result.function_name.clone());
        }

        Ok(response.usage.unwrap_or_default())
    }
}
