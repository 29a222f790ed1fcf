//! Mock implementations for testing
//!
//! These mocks enable dispatcher and node tests without real I/O.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock LLM
// ============================================================================

/// Mock LLM that returns queued responses in order
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Fallback when the queue is empty
    repeat: Mutex<Option<String>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same text once the queue is drained
    pub fn always(text: impl Into<String>) -> Self {
        let llm = Self::new();
        *llm.repeat.lock().unwrap() = Some(text.into());
        llm
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<LlmResponse, LlmError> {
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        match self.repeat.lock().unwrap().as_ref() {
            Some(text) => Ok(LlmResponse::text(text.clone())),
            None => Err(LlmError::network("No mock response queued")),
        }
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Delayed Mock LLM (for timeout and cancellation testing)
// ============================================================================

/// Mock LLM that sleeps before answering
pub struct DelayedMockLlm {
    inner: MockLlm,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockLlm {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockLlm::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.inner.queue_response(response);
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl LlmService for DelayedMockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_response()
    }

    fn model_id(&self) -> &str {
        "delayed-mock"
    }
}
