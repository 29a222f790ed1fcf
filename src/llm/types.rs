//! Common types for LLM interactions

use crate::state_machine::{Message, Role};

/// LLM request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, messages: Vec<LlmMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            max_tokens: None,
        }
    }
}

/// Message in a completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub text: String,
}

impl LlmMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

impl From<&Message> for LlmMessage {
    fn from(msg: &Message) -> Self {
        match msg.role {
            Role::User => LlmMessage::user(msg.content.clone()),
            Role::Responder => LlmMessage::assistant(msg.content.clone()),
            // Providers only understand user/assistant turns here
            Role::Tool => LlmMessage::user(format!(
                "Result of task {}:\n{}",
                msg.origin_id, msg.content
            )),
            Role::System => LlmMessage::user(format!("[system] {}", msg.content)),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// LLM response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Usage,
}

impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Usage::default(),
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_role_mapping() {
        let user = LlmMessage::from(&Message::user("hi"));
        assert_eq!(user.role, MessageRole::User);

        let responder = LlmMessage::from(&Message::responder("analyst", "hello"));
        assert_eq!(responder, LlmMessage::assistant("hello"));

        let tool = LlmMessage::from(&Message::tool("shard-doc", "3 shards"));
        assert_eq!(tool.role, MessageRole::User);
        assert_eq!(tool.text, "Result of task shard-doc:\n3 shards");
    }
}
