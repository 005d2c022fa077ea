use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::{AssistantMessage, ModelMessage};
use crate::usage::Usage;

/// A complete response from the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated text, if any.
    pub content: Option<String>,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
    /// Tokens consumed by this request, if the provider reports them.
    pub usage: Option<Usage>,
}

impl ModelResponse {
    /// Converts the response into a message that can be appended to the
    /// conversation history.
    #[inline]
    pub fn to_message(&self) -> ModelMessage {
        ModelMessage::Assistant(AssistantMessage {
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
        })
    }
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model needs to call a tool.
    ToolCalls,
    /// The model has finished generating text.
    Stop,
    /// The output hit the token limit.
    Length,
    /// The output was filtered by the provider.
    ContentFilter,
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// Named arguments to pass to the tool.
    pub arguments: Map<String, Value>,
    /// Why the arguments sent by the model couldn't be read as an object.
    /// `arguments` is empty when this is set, and the call must not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_message_keeps_tool_calls() {
        let Value::Object(arguments) = json!({ "file_path": "/tmp/a.txt" })
        else {
            unreachable!()
        };
        let resp = ModelResponse {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_owned(),
                name: "read_file".to_owned(),
                arguments,
                arguments_error: None,
            }],
            finish_reason: Some(ModelFinishReason::ToolCalls),
            usage: None,
        };

        let ModelMessage::Assistant(msg) = resp.to_message() else {
            panic!("expected an assistant message");
        };
        assert!(msg.content.is_none());
        assert_eq!(msg.tool_calls, resp.tool_calls);
    }
}
