//! Post-processing steps run on every reply
//!
//! Each step runs in its own task after the response is sent. Failures are
//! logged and never reach the caller.

use crate::response_log::ResponseLogger;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A reply as handed to post-processing
#[derive(Debug, Clone)]
pub struct Reply {
    pub session_id: String,
    pub content: String,
    pub sender: String,
    pub metadata: Value,
}

/// A best-effort consumer of finished replies (logging, document extraction)
#[async_trait]
pub trait ReplyHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_reply(&self, reply: &Reply) -> Result<(), String>;
}

#[async_trait]
impl ReplyHook for ResponseLogger {
    fn name(&self) -> &'static str {
        "response_log"
    }

    async fn on_reply(&self, reply: &Reply) -> Result<(), String> {
        self.log_response(
            &reply.session_id,
            &reply.content,
            &reply.sender,
            reply.metadata.clone(),
        )
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
    }
}

/// Hand a reply to every hook without waiting on any of them
pub fn dispatch_reply(hooks: &[Arc<dyn ReplyHook>], reply: Reply) {
    let reply = Arc::new(reply);
    for hook in hooks {
        let hook = hook.clone();
        let reply = reply.clone();
        tokio::spawn(async move {
            if let Err(e) = hook.on_reply(&reply).await {
                tracing::warn!(
                    hook = hook.name(),
                    session_id = %reply.session_id,
                    error = %e,
                    "Reply post-processing failed"
                );
            }
        });
    }
}
