//! HTTP request handlers

use super::types::{
    AgentInfo, AgentsResponse, ChatRequest, ChatResponse, ErrorResponse, SessionDeleteResponse,
    SessionLogsResponse, StatusResponse, WorkflowsResponse,
};
use super::hooks::{dispatch_reply, Reply};
use super::AppState;
use crate::runtime::TurnOutcome;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

const SYSTEM_SENDER: &str = "system";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/chat", post(chat))
        .route("/agents", get(list_agents))
        .route("/workflows", get(list_workflows))
        .route("/session/:id", delete(delete_session))
        .route("/session/:id/logs", get(session_logs))
        .with_state(state)
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "Crew router is running",
    })
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session_id = req.session_id.trim().to_string();
    if session_id.is_empty() {
        return Err(AppError::BadRequest("session_id is required".to_string()));
    }

    // Dropping this handler (client gone) cancels the turn. The turn itself
    // runs in its own task so a cancelled turn still records its input.
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let sessions = state.sessions.clone();
    let turn_session = session_id.clone();
    let result = tokio::spawn(async move {
        sessions
            .process_turn(&turn_session, req.message, cancel)
            .await
    })
    .await
    .map_err(|e| AppError::Internal(format!("Turn task failed: {e}")))?;
    guard.disarm();

    let (response, metadata) = match result {
        Ok(outcome) => reply_from_outcome(&outcome),
        Err(e) => (
            ChatResponse {
                message: e.user_message(),
                sender: SYSTEM_SENDER.to_string(),
            },
            json!({ "error": true }),
        ),
    };

    dispatch_reply(
        &state.reply_hooks,
        Reply {
            session_id,
            content: response.message.clone(),
            sender: response.sender.clone(),
            metadata,
        },
    );

    Ok(Json(response))
}

fn reply_from_outcome(outcome: &TurnOutcome) -> (ChatResponse, Value) {
    let message = outcome
        .final_message()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    let trace: Vec<String> = outcome.trace.iter().map(ToString::to_string).collect();
    (
        ChatResponse {
            message,
            sender: outcome.final_sender().to_string(),
        },
        json!({
            "hops": outcome.hops,
            "trace": trace,
            "hop_limit_reached": outcome.hop_limit_reached(),
        }),
    )
}

// ============================================================
// Registry listings
// ============================================================

async fn list_agents(State(state): State<AppState>) -> Json<AgentsResponse> {
    let agents = state
        .sessions
        .dispatcher()
        .registry()
        .responders()
        .into_iter()
        .map(AgentInfo::from)
        .collect();
    Json(AgentsResponse { agents })
}

async fn list_workflows() -> Json<WorkflowsResponse> {
    Json(WorkflowsResponse {
        workflows: Vec::new(),
    })
}

// ============================================================
// Sessions
// ============================================================

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDeleteResponse>, AppError> {
    let existed = state
        .sessions
        .clear(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(if existed {
        SessionDeleteResponse {
            status: "success",
            message: format!("Session {id} cleared"),
        }
    } else {
        SessionDeleteResponse {
            status: "not_found",
            message: format!("Session {id} not found"),
        }
    }))
}

async fn session_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionLogsResponse>, AppError> {
    let logs = state
        .logger
        .list_logs(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(SessionLogsResponse {
        session_id: id,
        logs,
    }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
