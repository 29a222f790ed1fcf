//! HTTP API for the crew router

mod handlers;
mod hooks;
mod types;

pub use handlers::create_router;
pub use hooks::ReplyHook;

use crate::response_log::ResponseLogger;
use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub logger: Arc<ResponseLogger>,
    /// Post-processing steps for each reply; the response log is always first
    pub reply_hooks: Arc<Vec<Arc<dyn ReplyHook>>>,
}

impl AppState {
    pub fn new(
        sessions: SessionManager,
        logger: ResponseLogger,
        extra_hooks: Vec<Arc<dyn ReplyHook>>,
    ) -> Self {
        let logger = Arc::new(logger);
        let mut reply_hooks: Vec<Arc<dyn ReplyHook>> = vec![logger.clone()];
        reply_hooks.extend(extra_hooks);
        Self {
            sessions: Arc::new(sessions),
            logger,
            reply_hooks: Arc::new(reply_hooks),
        }
    }
}
