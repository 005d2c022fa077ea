//! Tool call supports.
//!
//! A [`Tool`] is a named function with a declared set of parameters. Tools
//! are collected into a [`Registry`] once, and batches of [`FunctionCall`]s
//! requested by the model are executed against it with [`execute_calls`].

mod call;
mod error;
mod executor;
mod function;
mod registry;

use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::Instrument;

pub use call::{CallError, CallOutcome, CallResult, FunctionCall, reported_success};
pub use error::{Error, ErrorKind};
pub use executor::execute_calls;
pub use function::FnTool;
pub use registry::{Registry, RegistryBuilder, RegistryError};

/// The result of a type-erased tool call.
pub type ToolResult = Result<Value, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state.
///
/// The tool can be context-aware, meaning it can access additional information
/// about the current execution context, such as the working directory or the
/// current user. To do this, make the context an immutable state of the tool,
/// which can be set during initialization, and copy it when executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// The payload the tool returns on success.
    ///
    /// If the serialized payload is an object with a boolean `success`
    /// field, that field decides whether the call is reported as
    /// successful. See [`reported_success`].
    type Output: Serialize + Send + 'static;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    ///
    /// The schema must describe an object. Its `properties` are the only
    /// argument names a call may pass.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    /// Blocking work should be moved off the async runtime (for example with
    /// `tokio::task::spawn_blocking`), so sibling calls keep running.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, Error>> + Send + 'static;
}

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(
        &self,
        arguments: Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    fn execute(
        &self,
        arguments: Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let input: T::Input = match serde_json::from_value(Value::Object(arguments)) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("invalid input: {err}");
                return Box::pin(std::future::ready(ToolResult::Err(
                    Error::execution_error().with_reason(reason),
                )));
            }
        };

        let fut = self.0.execute(input);
        Box::pin(
            async move {
                let output = fut.await?;
                serde_json::to_value(output).map_err(|err| {
                    Error::execution_error()
                        .with_reason(format!("unserializable output: {err}"))
                })
            }
            .instrument(debug_span!("tool execute")),
        )
    }
}
