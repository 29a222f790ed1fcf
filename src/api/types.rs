//! API request and response types

use crate::registry::ResponderDescriptor;
use crate::response_log::LogEntry;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Final message of a turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub sender: String,
}

/// Service status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Public view of a responder
#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub id: String,
    pub title: String,
    pub when_to_use: String,
}

impl From<&ResponderDescriptor> for AgentInfo {
    fn from(d: &ResponderDescriptor) -> Self {
        Self {
            id: d.id.clone(),
            title: d.title.clone(),
            when_to_use: d.when_to_use.clone(),
        }
    }
}

/// Response with the registered responders
#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentInfo>,
}

/// Response with the available workflows
#[derive(Debug, Serialize)]
pub struct WorkflowsResponse {
    pub workflows: Vec<String>,
}

/// Response for session deletion
#[derive(Debug, Serialize)]
pub struct SessionDeleteResponse {
    pub status: &'static str,
    pub message: String,
}

/// Response with a session's response log
#[derive(Debug, Serialize)]
pub struct SessionLogsResponse {
    pub session_id: String,
    pub logs: Vec<LogEntry>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
