use fanout_agent_model::{
    ModelFinishReason, ModelMessage, ModelRequest, ModelResponse, ModelTool,
    ToolCallRequest, ToolChoice, Usage as ModelUsage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::OpenAIConfig;

// ------------------------------
// Types shared in both directions
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionToolCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub r#type: String,
    pub function: FunctionToolCall,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    let tools: Vec<_> = req.tools.iter().map(create_tool).collect();
    ChatCompletionRequest {
        model: config.model().to_owned(),
        messages: req.messages.iter().map(create_message).collect(),
        // The API rejects `tool_choice` without any tools.
        tool_choice: if tools.is_empty() { None } else { req.tool_choice },
        tools,
        temperature: req.temperature,
    }
}

fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(msg) if msg.tool_calls.is_empty() => {
            // Some compatible servers reject a null content without tool calls.
            Message::Assistant {
                content: Some(msg.content.clone().unwrap_or_default()),
                tool_calls: None,
            }
        }
        ModelMessage::Assistant(msg) => Message::Assistant {
            content: msg.content.clone(),
            tool_calls: Some(
                msg.tool_calls.iter().map(create_tool_call).collect(),
            ),
        },
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[inline]
fn create_tool_call(req: &ToolCallRequest) -> ToolCall {
    ToolCall {
        id: req.id.clone(),
        r#type: "function".to_owned(),
        function: FunctionToolCall {
            name: req.name.clone(),
            arguments: Value::Object(req.arguments.clone()).to_string(),
        },
    }
}

/// Converts the first choice of a completion into a [`ModelResponse`].
///
/// Returns `None` if the completion has no choices at all.
pub fn create_response(completion: ChatCompletion) -> Option<ModelResponse> {
    let choice = completion.choices.into_iter().next()?;
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let (arguments, arguments_error) =
                match parse_arguments(&call.function.arguments) {
                    Ok(arguments) => (arguments, None),
                    Err(reason) => {
                        warn!(
                            "bad arguments for {} ({reason}): {}",
                            call.function.name, call.function.arguments
                        );
                        (Map::new(), Some(reason))
                    }
                };
            ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments,
                arguments_error,
            }
        })
        .collect();
    Some(ModelResponse {
        content: choice.message.content.filter(|c| !c.is_empty()),
        tool_calls,
        finish_reason: choice.finish_reason.as_deref().and_then(finish_reason),
        usage: completion.usage.map(|usage| ModelUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }),
    })
}

/// Empty arguments mean "no arguments". Anything else must be an object.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(raw) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(other) => Err(format!("expected a JSON object, found {other}")),
        Err(err) => Err(err.to_string()),
    }
}

#[inline]
fn finish_reason(reason: &str) -> Option<ModelFinishReason> {
    match reason {
        "tool_calls" | "function_call" => Some(ModelFinishReason::ToolCalls),
        "stop" => Some(ModelFinishReason::Stop),
        "length" => Some(ModelFinishReason::Length),
        "content_filter" => Some(ModelFinishReason::ContentFilter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use fanout_agent_model::AssistantMessage;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a helpful assistant.".to_owned()),
                ModelMessage::User("Hello".to_owned()),
            ],
            tools: vec![ModelTool {
                name: "read_file".to_owned(),
                description: "Reads a file.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "file_path": { "type": "string" } }
                }),
            }],
            tool_choice: Some(ToolChoice::Required),
            temperature: Some(0.0),
        };
        let config = OpenAIConfig::new("xxx").with_model("custom");

        let body = serde_json::to_value(create_request(&request, &config))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "Hello" }
                ],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "read_file",
                        "description": "Reads a file.",
                        "parameters": {
                            "type": "object",
                            "properties": { "file_path": { "type": "string" } }
                        }
                    }
                }],
                "tool_choice": "required",
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_tool_choice_needs_tools() {
        let request = ModelRequest {
            messages: vec![ModelMessage::User("Hello".to_owned())],
            tool_choice: Some(ToolChoice::Required),
            ..Default::default()
        };
        let config = OpenAIConfig::new("xxx");
        let body = serde_json::to_value(create_request(&request, &config))
            .unwrap();
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_assistant_tool_calls_round_trip_to_wire() {
        let arguments = json!({ "file_path": "/tmp/a.txt" })
            .as_object()
            .cloned()
            .unwrap();
        let msg = ModelMessage::Assistant(AssistantMessage {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_owned(),
                name: "read_file".to_owned(),
                arguments,
                arguments_error: None,
            }],
        });
        let wire = serde_json::to_value(create_message(&msg)).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert_eq!(wire["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            wire["tool_calls"][0]["function"]["arguments"],
            r#"{"file_path":"/tmp/a.txt"}"#
        );
    }

    #[test]
    fn test_create_response() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_a",
                            "type": "function",
                            "function": {
                                "name": "read_file",
                                "arguments": "{\"file_path\":\"notes.md\"}"
                            }
                        },
                        {
                            "id": "call_b",
                            "type": "function",
                            "function": { "name": "noop", "arguments": "" }
                        }
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 50,
                "completion_tokens": 8,
                "total_tokens": 58
            }
        }))
        .unwrap();

        let resp = create_response(completion).unwrap();
        assert!(resp.content.is_none());
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::ToolCalls));
        assert_eq!(resp.tool_calls.len(), 2);
        assert_eq!(resp.tool_calls[0].arguments["file_path"], "notes.md");
        assert!(resp.tool_calls[0].arguments_error.is_none());
        assert!(resp.tool_calls[1].arguments.is_empty());
        assert!(resp.tool_calls[1].arguments_error.is_none());
        assert_eq!(resp.usage.unwrap().total_tokens, 58);
    }

    #[test]
    fn test_truncated_arguments_are_kept_as_error() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-2",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_a",
                        "type": "function",
                        "function": {
                            "name": "read_file",
                            "arguments": "{\"file_path\": \"/etc/pass"
                        }
                    }]
                },
                "finish_reason": "length"
            }]
        }))
        .unwrap();

        let resp = create_response(completion).unwrap();
        let call = &resp.tool_calls[0];
        assert_eq!(call.id, "call_a");
        assert!(call.arguments.is_empty());
        assert!(call.arguments_error.is_some());
    }

    #[test]
    fn test_malformed_arguments() {
        assert!(parse_arguments("{not json").is_err());
        assert_eq!(
            parse_arguments("[1, 2]").unwrap_err(),
            "expected a JSON object, found [1,2]"
        );
        assert!(parse_arguments("  ").unwrap().is_empty());
    }

    #[test]
    fn test_assistant_without_content_or_calls() {
        let msg = ModelMessage::Assistant(AssistantMessage {
            content: None,
            tool_calls: vec![],
        });
        let wire = serde_json::to_value(create_message(&msg)).unwrap();
        assert_eq!(wire, json!({ "role": "assistant", "content": "" }));
    }
}
