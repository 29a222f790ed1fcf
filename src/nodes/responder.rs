//! Responder node: one specialist answering with the full history

use super::template::{escape_literal_braces, render};
use super::{complete_bounded, CompletionError, NodeError};
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::registry::ResponderDescriptor;
use crate::state_machine::Message;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ResponderNode<'a> {
    descriptor: &'a ResponderDescriptor,
    llm: &'a dyn LlmService,
    timeout: Duration,
}

impl<'a> ResponderNode<'a> {
    pub fn new(descriptor: &'a ResponderDescriptor, llm: &'a dyn LlmService, timeout: Duration) -> Self {
        Self {
            descriptor,
            llm,
            timeout,
        }
    }

    /// System prompt for this responder given the latest message
    pub fn system_prompt(&self, history: &[Message]) -> String {
        let latest = history.last().map(|m| m.content.clone()).unwrap_or_default();
        let vars = HashMap::from([("input", latest)]);
        render(&escape_literal_braces(&self.descriptor.prompt_template), &vars)
    }

    /// Produce exactly one responder message. No retries.
    pub async fn invoke(
        &self,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<Message, NodeError> {
        let id = &self.descriptor.id;
        tracing::info!(responder = %id, messages = history.len(), "Invoking responder");

        let request = LlmRequest::new(
            self.system_prompt(history),
            history.iter().map(LlmMessage::from).collect(),
        );

        match complete_bounded(self.llm, &request, self.timeout, cancel).await? {
            Ok(response) => {
                tracing::debug!(responder = %id, len = response.text.len(), "Responder answered");
                Ok(Message::responder(id, response.text))
            }
            Err(cause) => Err(CompletionError {
                responder_id: id.clone(),
                cause,
            }
            .into()),
        }
    }
}
