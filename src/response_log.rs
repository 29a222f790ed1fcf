//! Per-session response log
//!
//! Every reply sent to a caller is written as one JSON document under
//! `<log_dir>/<session>/`. File names start with a sortable timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseLogError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Session id must not be empty")]
    EmptySessionId,
}

/// One logged reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub session_id: String,
    pub sender: String,
    pub created_at: DateTime<Utc>,
    pub response_length: usize,
    pub metadata: Value,
    pub content: String,
}

/// Listing entry for a logged reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

pub struct ResponseLogger {
    root: PathBuf,
}

impl ResponseLogger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn session_dir(&self, session_id: &str) -> Result<PathBuf, ResponseLogError> {
        if session_id.is_empty() {
            return Err(ResponseLogError::EmptySessionId);
        }
        Ok(self.root.join(encode_dir_name(session_id)))
    }

    /// Write one reply and return the path of the new file
    pub async fn log_response(
        &self,
        session_id: &str,
        content: &str,
        sender: &str,
        metadata: Value,
    ) -> Result<PathBuf, ResponseLogError> {
        let dir = self.session_dir(session_id)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| io_error(&dir, source))?;

        let created_at = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}_{}.json",
            created_at.format("%Y%m%d_%H%M%S_%6f"),
            suffix.get(..8).unwrap_or(&suffix)
        );
        let path = dir.join(file_name);

        let record = ResponseRecord {
            session_id: session_id.to_string(),
            sender: sender.to_string(),
            created_at,
            response_length: content.chars().count(),
            metadata,
            content: content.to_string(),
        };
        let body = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| io_error(&path, source))?;

        tracing::debug!(session_id = %session_id, path = %path.display(), "Response logged");
        Ok(path)
    }

    /// Logged replies for a session, oldest first. Unknown sessions are empty.
    pub async fn list_logs(&self, session_id: &str) -> Result<Vec<LogEntry>, ResponseLogError> {
        let dir = self.session_dir(session_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(&dir, source)),
        };

        let mut logs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| io_error(&dir, source))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read(&path)
                .await
                .map_err(|source| io_error(&path, source))?;
            match serde_json::from_slice::<ResponseRecord>(&raw) {
                Ok(record) => logs.push(LogEntry {
                    file_name: entry.file_name().to_string_lossy().into_owned(),
                    created_at: record.created_at,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable log file");
                }
            }
        }

        logs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(logs)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ResponseLogError {
    ResponseLogError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Directory name for a session id.
///
/// Bytes outside `[A-Za-z0-9_-]` become `%XX`. Since `%` itself is always
/// escaped, distinct ids never share a directory and none can leave the root.
fn encode_dir_name(session_id: &str) -> String {
    let mut out = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
