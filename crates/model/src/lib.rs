//! An abstraction layer for different LLMs.
//!
//! This crate establishes an unified protocol for the agent to talk with
//! chat-completion style models: what is sent (messages and tool
//! definitions), what comes back (text, tool call requests and token
//! usage), and how a provider reports failures.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;
mod usage;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use usage::*;
