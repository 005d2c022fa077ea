//! An out-of-the-box agent that assembles the built-in tools and an OpenAI
//! compatible model provider.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring the agent loop into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod tools;

use fanout_agent_core::AgentLoop;
use fanout_agent_openai_model::{OpenAIConfig, OpenAIProvider};

pub use config::{Config, ConfigError, Instructions};

/// Re-exports of [`fanout_agent_core`] crate.
pub mod core {
    pub use fanout_agent_core::*;
}

/// Builds an agent loop over the OpenAI provider and the built-in tools.
pub fn build_agent(config: &Config) -> Result<AgentLoop, Box<dyn std::error::Error>> {
    let mut openai = OpenAIConfig::new(config.api_key.clone());
    if let Some(base_url) = &config.base_url {
        openai = openai.with_base_url(base_url);
    }
    if let Some(model) = &config.model {
        openai = openai.with_model(model.clone());
    }
    let provider = OpenAIProvider::new(openai);

    let mut agent = AgentLoop::new(provider, tools::builtin_registry()?);
    if let Some(max_steps) = config.max_steps {
        agent = agent.with_max_steps(max_steps);
    }
    info!(
        "agent ready with {} local tools",
        agent.registry().len()
    );
    Ok(agent)
}
