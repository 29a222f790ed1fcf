//! Routing decisions produced by the decision step

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A task requested from message text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInvocation {
    pub task_name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl TaskInvocation {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            params: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// What the dispatcher does next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    RouteToResponder { id: String },
    RouteToTask(TaskInvocation),
    Terminate,
    /// A route whose target is not registered. Never executed.
    Unknown { id: String },
}

impl Action {
    pub fn route_to_responder(id: impl Into<String>) -> Self {
        Action::RouteToResponder { id: id.into() }
    }
}
