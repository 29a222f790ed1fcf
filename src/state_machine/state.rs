//! Conversation and dispatcher state types

use super::action::Action;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin id used for messages synthesized by the dispatcher itself
pub const DISPATCHER_ORIGIN: &str = "dispatcher";

/// Sender reported for messages produced by the task node
pub const TOOL_SENDER: &str = "tool";

/// Sender reported for the external caller
pub const USER_SENDER: &str = "user";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Responder,
    Tool,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Responder => "responder",
            Role::Tool => "tool",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message. Never edited once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub origin_id: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, origin_id: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            origin_id: origin_id.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, USER_SENDER)
    }

    pub fn responder(responder_id: &str, content: impl Into<String>) -> Self {
        Self::new(Role::Responder, content, responder_id)
    }

    pub fn tool(task_name: &str, content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content, task_name)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, DISPATCHER_ORIGIN)
    }

    /// The sender name reported to the caller when this message ends a turn.
    ///
    /// Task output is always reported as `tool`, whatever task produced it.
    pub fn sender(&self) -> &str {
        match self.role {
            Role::Tool => TOOL_SENDER,
            _ => &self.origin_id,
        }
    }
}

/// Working state of one conversation as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub history: Vec<Message>,
    pub last_sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<Action>,
}

impl ConversationState {
    /// Start a turn: prior history plus the incoming message
    pub fn for_turn(mut history: Vec<Message>, incoming: Message) -> Self {
        let last_sender = incoming.sender().to_string();
        history.push(incoming);
        Self {
            history,
            last_sender,
            pending_action: None,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.history.last()
    }

    /// Append the output of a node and record its sender
    pub fn append(&mut self, message: Message) {
        self.last_sender = message.sender().to_string();
        self.history.push(message);
    }
}

/// Dispatcher loop state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchState {
    Deciding,
    RunningResponder { id: String },
    RunningTask { name: String },
    Terminated,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Terminated)
    }

    /// Whether executing this state counts as a hop
    pub fn is_hop(&self) -> bool {
        matches!(
            self,
            DispatchState::RunningResponder { .. } | DispatchState::RunningTask { .. }
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::Deciding => f.write_str("DECIDING"),
            DispatchState::RunningResponder { id } => write!(f, "RUNNING_RESPONDER({id})"),
            DispatchState::RunningTask { name } => write!(f, "RUNNING_TASK({name})"),
            DispatchState::Terminated => f.write_str("TERMINATED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_messages_report_tool_sender() {
        let msg = Message::tool("execute-checklist", "done");
        assert_eq!(msg.origin_id, "execute-checklist");
        assert_eq!(msg.sender(), "tool");
    }

    #[test]
    fn test_for_turn_appends_incoming() {
        let state = ConversationState::for_turn(vec![Message::user("earlier")], Message::user("now"));
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.last_sender, "user");
        assert_eq!(state.last_message().map(|m| m.content.as_str()), Some("now"));
        assert!(state.pending_action.is_none());
    }

    #[test]
    fn test_append_tracks_sender() {
        let mut state = ConversationState::for_turn(vec![], Message::user("hi"));
        state.append(Message::responder("analyst", "hello"));
        assert_eq!(state.last_sender, "analyst");
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_state_display() {
        let state = DispatchState::RunningResponder {
            id: "analyst".to_string(),
        };
        assert_eq!(state.to_string(), "RUNNING_RESPONDER(analyst)");
        assert!(state.is_hop());
        assert!(!DispatchState::Deciding.is_hop());
        assert!(DispatchState::Terminated.is_terminal());
    }
}
