//! Core logic including the agent loop, tool registry and the concurrent
//! tool call executor.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod model_client;
pub mod tool;

pub use agent::{
    AgentError, AgentLoop, ExecutionReport, LocalTask, TaskOutcome,
    TaskRuntime,
};
