//! Task node: one-shot execution of a named task template

use super::template::substitute_params;
use super::{complete_bounded, NodeError};
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::registry::Registry;
use crate::state_machine::{Message, TaskInvocation};
use std::fmt::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Instruction sent as the only user turn of a task completion
pub const TASK_FOLLOW_UP: &str =
    "Based on the task instructions and the conversation context, what is the next step or the final result?";

const CONTEXT_HEADER: &str = "--- CONVERSATION CONTEXT ---";

pub struct TaskNode<'a> {
    registry: &'a Registry,
    llm: &'a dyn LlmService,
    timeout: Duration,
}

impl<'a> TaskNode<'a> {
    pub fn new(registry: &'a Registry, llm: &'a dyn LlmService, timeout: Duration) -> Self {
        Self {
            registry,
            llm,
            timeout,
        }
    }

    /// Compose the task prompt: substituted template, then the transcript
    pub fn compose_prompt(template: &str, invocation: &TaskInvocation, history: &[Message]) -> String {
        let mut prompt = substitute_params(template, &invocation.params);
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADER);
        prompt.push('\n');
        for msg in history {
            let _ = writeln!(prompt, "{}: {}", msg.role, msg.content);
        }
        prompt
    }

    /// Run a task and return its tool message.
    ///
    /// A missing template is an error; a failed completion is reported in
    /// the returned message instead.
    pub async fn run(
        &self,
        invocation: &TaskInvocation,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<Message, NodeError> {
        let name = &invocation.task_name;
        let template = self
            .registry
            .resolve_task(name)
            .ok_or_else(|| NodeError::TaskNotFound(name.clone()))?;

        tracing::info!(task = %name, params = ?invocation.params, "Running task");

        let request = LlmRequest::new(
            Self::compose_prompt(template, invocation, history),
            vec![LlmMessage::user(TASK_FOLLOW_UP)],
        );

        match complete_bounded(self.llm, &request, self.timeout, cancel).await? {
            Ok(response) => {
                tracing::info!(task = %name, "Task completed");
                Ok(Message::tool(name, response.text))
            }
            Err(e) => {
                tracing::warn!(task = %name, error = %e, "Task completion failed");
                Ok(Message::tool(name, format!("Task '{name}' failed: {e}")))
            }
        }
    }
}
