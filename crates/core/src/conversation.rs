//! Conversation-related types.

use fanout_agent_model::ModelMessage;

/// Represents a conversation.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    /// Returns the items in this conversation.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the messages to send to the model.
    pub fn messages(&self) -> Vec<ModelMessage> {
        self.items.iter().map(|item| item.msg.clone()).collect()
    }

    pub(crate) fn push(&mut self, msg: ModelMessage) {
        let transcript = transcript_of(&msg);
        self.items.push(Item { msg, transcript });
    }

    pub(crate) fn insert(&mut self, index: usize, msg: ModelMessage) {
        let transcript = transcript_of(&msg);
        self.items.insert(index, Item { msg, transcript });
    }
}

/// An item in the conversation.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
}

impl Item {
    /// Returns the message of this item.
    #[inline]
    pub fn message(&self) -> &ModelMessage {
        &self.msg
    }

    /// Returns the transcript of this item.
    ///
    /// The transcript is a string representation of the message item,
    /// which can be exported later. But transcript alone is not enough
    /// to reconstruct the message item.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

fn transcript_of(msg: &ModelMessage) -> String {
    match msg {
        ModelMessage::System(text) | ModelMessage::User(text) => text.clone(),
        ModelMessage::Assistant(msg) => {
            let calls: Vec<_> =
                msg.tool_calls.iter().map(|c| c.name.as_str()).collect();
            match (&msg.content, calls.is_empty()) {
                (Some(content), true) => content.clone(),
                (Some(content), false) => {
                    format!("{content}\n[calling {}]", calls.join(", "))
                }
                (None, false) => format!("[calling {}]", calls.join(", ")),
                (None, true) => String::new(),
            }
        }
        ModelMessage::Tool(result) => result.content.clone(),
    }
}
