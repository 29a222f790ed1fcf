//! Execution nodes: responders and tasks
//!
//! Each node execution makes exactly one completion call and produces
//! exactly one message.

mod responder;
mod task;
pub mod template;

pub use responder::ResponderNode;
pub use task::TaskNode;

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A responder's completion call failed or timed out
#[derive(Debug, Error)]
#[error("Responder {responder_id} failed: {cause}")]
pub struct CompletionError {
    pub responder_id: String,
    #[source]
    pub cause: LlmError,
}

/// Errors raised by a node into the dispatcher
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("Cancelled")]
    Cancelled,
}

/// Issue one completion bounded by `limit` and abandoned on cancellation.
///
/// The outer error is only ever [`NodeError::Cancelled`].
async fn complete_bounded(
    llm: &dyn LlmService,
    request: &LlmRequest,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<Result<LlmResponse, LlmError>, NodeError> {
    tokio::select! {
        biased;

        () = cancel.cancelled() => {
            tracing::info!("Completion abandoned: turn cancelled");
            Err(NodeError::Cancelled)
        }

        result = tokio::time::timeout(limit, llm.complete(request)) => {
            Ok(result.unwrap_or_else(|_| Err(LlmError::timeout(limit))))
        }
    }
}
