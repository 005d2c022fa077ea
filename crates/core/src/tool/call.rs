use std::fmt::Display;

use fanout_agent_model::{ToolCallRequest, ToolCallResult};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Value, json};

use super::ErrorKind;

/// A function call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionCall {
    /// Identifier assigned by the caller, echoed back in the result.
    pub call_id: String,
    /// Name of the function to call.
    pub name: String,
    /// Named arguments.
    pub arguments: Map<String, Value>,
    /// Set when the model's arguments couldn't be parsed. Such a call
    /// fails without running the function.
    pub arguments_error: Option<String>,
}

impl From<ToolCallRequest> for FunctionCall {
    #[inline]
    fn from(req: ToolCallRequest) -> Self {
        Self {
            call_id: req.id,
            name: req.name,
            arguments: req.arguments,
            arguments_error: req.arguments_error,
        }
    }
}

/// Why a single call failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallError {
    kind: ErrorKind,
    message: String,
    error: String,
    invalid_arguments: Vec<String>,
}

impl CallError {
    /// The requested function is not registered.
    pub fn unknown_function(name: &str) -> Self {
        let error = format!("Function {name} not found");
        Self {
            kind: ErrorKind::UnknownFunction,
            message: format!("Error executing {name}: {error}"),
            error,
            invalid_arguments: vec![],
        }
    }

    /// The call passed argument names that the function doesn't accept.
    pub fn invalid_arguments(name: &str, rejected: Vec<String>) -> Self {
        let message =
            format!("Invalid parameters for {name}: {}", rejected.join(", "));
        Self {
            kind: ErrorKind::InvalidArguments,
            error: message.clone(),
            message,
            invalid_arguments: rejected,
        }
    }

    /// The function failed while running.
    pub fn execution_error(name: &str, cause: impl Display) -> Self {
        let error = cause.to_string();
        Self {
            kind: ErrorKind::ExecutionError,
            message: format!("Error executing {name}: {error}"),
            error,
            invalid_arguments: vec![],
        }
    }

    /// Returns the kind of the failure.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns a human readable summary.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the stringified cause.
    #[inline]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Returns the rejected argument names, sorted. Empty unless the kind
    /// is [`ErrorKind::InvalidArguments`].
    #[inline]
    pub fn invalid_arguments_list(&self) -> &[String] {
        &self.invalid_arguments
    }

    fn to_payload(&self) -> Value {
        let mut payload = json!({
            "success": false,
            "message": self.message,
            "error": self.error,
        });
        if self.kind == ErrorKind::InvalidArguments {
            payload["invalid_params"] = json!(self.invalid_arguments);
        }
        payload
    }
}

/// How a call ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    /// The function returned a payload.
    Completed {
        /// The payload exactly as returned.
        payload: Value,
        /// The success flag decided by [`reported_success`].
        success: bool,
    },
    /// The call could not be performed or the function failed.
    Failed(CallError),
}

/// The result of one [`FunctionCall`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallResult {
    /// The originating call identifier.
    pub call_id: String,
    /// The function that was requested.
    pub function_name: String,
    /// How the call ended.
    pub outcome: CallOutcome,
}

impl CallResult {
    /// Creates a result for a function that returned `payload`.
    pub fn completed<S1, S2>(call_id: S1, function_name: S2, payload: Value) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let success = reported_success(&payload);
        Self {
            call_id: call_id.into(),
            function_name: function_name.into(),
            outcome: CallOutcome::Completed { payload, success },
        }
    }

    /// Creates a failed result.
    pub fn failed<S1, S2>(call_id: S1, function_name: S2, error: CallError) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            call_id: call_id.into(),
            function_name: function_name.into(),
            outcome: CallOutcome::Failed(error),
        }
    }

    /// Returns `true` if the call succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            CallOutcome::Completed { success, .. } => *success,
            CallOutcome::Failed(_) => false,
        }
    }

    /// Returns the failure, if the call failed.
    #[inline]
    pub fn error(&self) -> Option<&CallError> {
        match &self.outcome {
            CallOutcome::Completed { .. } => None,
            CallOutcome::Failed(err) => Some(err),
        }
    }

    /// Returns the structured payload reported back to the model.
    ///
    /// Successful payloads are passed through unchanged; failures become
    /// `{"success": false, "message": ..., "error": ...}`, with an extra
    /// `invalid_params` list for rejected arguments.
    pub fn payload(&self) -> Value {
        match &self.outcome {
            CallOutcome::Completed { payload, .. } => payload.clone(),
            CallOutcome::Failed(err) => err.to_payload(),
        }
    }

    /// Converts the result into a tool message for the model.
    pub fn to_model_result(&self) -> ToolCallResult {
        let content = match &self.outcome {
            CallOutcome::Completed {
                payload: Value::String(text),
                ..
            } => text.clone(),
            _ => self.payload().to_string(),
        };
        ToolCallResult {
            id: self.call_id.clone(),
            content,
        }
    }
}

impl Serialize for CallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CallResult", 4)?;
        state.serialize_field("function_name", &self.function_name)?;
        state.serialize_field("tool_call_id", &self.call_id)?;
        state.serialize_field("is_success", &self.is_success())?;
        state.serialize_field("result", &self.payload())?;
        state.end()
    }
}

/// Decides whether a returned payload counts as a success.
///
/// A payload may report its own status through a boolean `success` field
/// (e.g. `{"success": false, "message": "File not found"}`), which is then
/// taken as is. A payload without one, including any non-object payload, is
/// treated as a success. Tools that can fail without returning an error
/// should therefore always set `success` explicitly.
pub fn reported_success(payload: &Value) -> bool {
    match payload.get("success") {
        Some(Value::Bool(success)) => *success,
        Some(other) => {
            debug!("ignoring non-boolean `success` field: {other}");
            true
        }
        None => {
            debug!("payload has no `success` field, assuming success");
            true
        }
    }
}
