use fanout_agent_model::{
    ModelFinishReason, ModelMessage, ModelResponse, ToolCallRequest,
};

use super::{TaskOutcome, TaskRuntime};
use crate::conversation::Conversation;
use crate::tool::{CallResult, FunctionCall};

/// A task whose tools all run locally.
///
/// The task is finished when the model answers without calling a tool.
/// It can be continued with [`add_input`](LocalTask::add_input), keeping
/// the whole conversation.
#[derive(Clone, Debug, Default)]
pub struct LocalTask {
    conversation: Conversation,
    finished: bool,
    result: String,
    is_success: bool,
}

impl LocalTask {
    /// Creates a task from the user's input.
    pub fn new<S: Into<String>>(input: S) -> Self {
        let mut task = Self::default();
        task.add_input(input);
        task
    }

    /// Prepends a system prompt to the conversation.
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.conversation
            .insert(0, ModelMessage::System(prompt.into()));
        self
    }

    /// Adds another user message and marks the task as unfinished.
    pub fn add_input<S: Into<String>>(&mut self, input: S) {
        self.conversation.push(ModelMessage::User(input.into()));
        self.finished = false;
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

impl TaskRuntime for LocalTask {
    #[inline]
    fn is_finished(&self) -> bool {
        self.finished
    }

    fn messages(&self) -> Vec<ModelMessage> {
        self.conversation.messages()
    }

    fn record_response(&mut self, response: &ModelResponse) {
        self.conversation.push(response.to_message());
        if !response.tool_calls.is_empty() {
            return;
        }

        self.finished = true;
        self.result = response.content.clone().unwrap_or_default();
        self.is_success = !matches!(
            response.finish_reason,
            Some(ModelFinishReason::Length | ModelFinishReason::ContentFilter)
        );
    }

    fn pending_local_calls(
        &mut self,
        calls: &[ToolCallRequest],
    ) -> Vec<FunctionCall> {
        calls.iter().cloned().map(FunctionCall::from).collect()
    }

    fn record_tool_results(&mut self, results: &[CallResult]) {
        for result in results {
            self.conversation
                .push(ModelMessage::Tool(result.to_model_result()));
        }
    }

    fn outcome(&self) -> TaskOutcome {
        TaskOutcome {
            result: self.result.clone(),
            is_success: self.finished && self.is_success,
        }
    }
}

#[cfg(test)]
mod tests {
    use fanout_agent_model::AssistantMessage;
    use serde_json::{Map, json};

    use super::*;

    fn tool_call(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments: Map::new(),
            arguments_error: None,
        }
    }

    #[test]
    fn test_finishes_without_tool_calls() {
        let mut task = LocalTask::new("Hi").with_system_prompt("Be brief");
        assert!(!task.is_finished());

        task.record_response(&ModelResponse {
            content: Some("Hello".to_owned()),
            finish_reason: Some(ModelFinishReason::Stop),
            ..Default::default()
        });
        assert!(task.is_finished());
        assert_eq!(
            task.outcome(),
            TaskOutcome {
                result: "Hello".to_owned(),
                is_success: true
            }
        );

        let messages = task.messages();
        assert_eq!(messages[0], ModelMessage::System("Be brief".to_owned()));
        assert_eq!(messages[1], ModelMessage::User("Hi".to_owned()));
        assert_eq!(messages.len(), 3);

        task.add_input("More");
        assert!(!task.is_finished());
    }

    #[test]
    fn test_tool_calls_keep_task_running() {
        let mut task = LocalTask::new("Read it");
        let calls = vec![tool_call("call_1", "read_file")];
        task.record_response(&ModelResponse {
            tool_calls: calls.clone(),
            finish_reason: Some(ModelFinishReason::ToolCalls),
            ..Default::default()
        });
        assert!(!task.is_finished());

        let pending = task.pending_local_calls(&calls);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].call_id, "call_1");

        task.record_tool_results(&[CallResult::completed(
            "call_1",
            "read_file",
            json!({ "success": true }),
        )]);
        let messages = task.messages();
        assert!(matches!(
            &messages[1],
            ModelMessage::Assistant(AssistantMessage { tool_calls, .. })
                if tool_calls.len() == 1
        ));
        assert!(matches!(&messages[2], ModelMessage::Tool(r) if r.id == "call_1"));
        assert_eq!(
            task.conversation().items()[1].transcript(),
            "[calling read_file]"
        );
    }

    #[test]
    fn test_truncated_answer_is_not_success() {
        let mut task = LocalTask::new("Write a novel");
        task.record_response(&ModelResponse {
            content: Some("Once upon".to_owned()),
            finish_reason: Some(ModelFinishReason::Length),
            ..Default::default()
        });
        assert!(task.is_finished());
        assert!(!task.outcome().is_success);
    }
}
