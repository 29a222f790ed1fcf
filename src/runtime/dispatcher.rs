//! Dispatcher loop
//!
//! Drives the state machine for one turn: decide, execute the chosen node,
//! append its message, decide again. Each responder or task execution is a
//! hop, and a turn never runs more than `max_hops` of them.

use crate::llm::LlmService;
use crate::nodes::{NodeError, ResponderNode, TaskNode};
use crate::registry::Registry;
use crate::state_machine::{
    decide, transition, Action, ConversationState, DispatchState, Message, Role, TransitionError,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Reply text used when a turn fails after the user's message arrived
pub const ERROR_REPLY_PREFIX: &str = "I'm sorry, I encountered an error: ";

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub default_responder: String,
    pub max_hops: usize,
    pub completion_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_responder: "analyst".to_string(),
            max_hops: 8,
            completion_timeout: Duration::from_secs(120),
        }
    }
}

/// The hop budget ran out before the conversation settled
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Hop limit of {limit} reached; stopping this turn")]
pub struct HopLimitExceeded {
    pub limit: usize,
}

/// Failures that end a turn without a reply
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown responder: {0}")]
    UnknownResponder(String),
    #[error("Turn cancelled")]
    Cancelled,
    #[error("Session store error: {0}")]
    Store(String),
    #[error("Dispatcher invariant violated: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Text shown to the caller in place of a reply
    pub fn user_message(&self) -> String {
        format!("{ERROR_REPLY_PREFIX}{self}")
    }
}

impl From<TransitionError> for DispatchError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::UnknownResponder(id) => DispatchError::UnknownResponder(id),
            other @ TransitionError::InvalidTransition { .. } => {
                DispatchError::Internal(other.to_string())
            }
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Conversation after the turn, incoming message included
    pub state: ConversationState,
    /// Messages added by this turn, starting with the incoming one
    pub appended: Vec<Message>,
    /// Every dispatcher state visited, in order
    pub trace: Vec<DispatchState>,
    pub hops: usize,
}

impl TurnOutcome {
    pub fn final_message(&self) -> Option<&Message> {
        self.state.last_message()
    }

    pub fn final_sender(&self) -> &str {
        &self.state.last_sender
    }

    pub fn hop_limit_reached(&self) -> bool {
        self.final_message()
            .is_some_and(|m| m.role == Role::System)
    }
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    llm: Arc<dyn LlmService>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, llm: Arc<dyn LlmService>, config: DispatchConfig) -> Self {
        Self {
            registry,
            llm,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one turn to termination.
    ///
    /// `history` is the session so far; `incoming` is appended before the
    /// first decision. Nothing is persisted here.
    pub async fn process_turn(
        &self,
        history: Vec<Message>,
        incoming: Message,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DispatchError> {
        let turn_start = history.len();
        let mut convo = ConversationState::for_turn(history, incoming);
        let mut state = DispatchState::Deciding;
        let mut trace = vec![state.clone()];
        let mut hops = 0;

        while !state.is_terminal() {
            if cancel.is_cancelled() {
                tracing::info!(hops, "Turn cancelled");
                return Err(DispatchError::Cancelled);
            }

            state = match state {
                DispatchState::Deciding => {
                    let action = decide(
                        convo.last_message(),
                        &self.config.default_responder,
                        &self.registry,
                    );
                    let next = transition(&state, &action)?;
                    tracing::debug!(from = %state, to = %next, "Transition");

                    if next.is_hop() && hops >= self.config.max_hops {
                        let limit = HopLimitExceeded {
                            limit: self.config.max_hops,
                        };
                        tracing::warn!(hops, next = %next, "{limit}");
                        convo.append(Message::system(limit.to_string()));
                        DispatchState::Terminated
                    } else {
                        // Only hops carry an action; a finished turn leaves none behind
                        convo.pending_action = next.is_hop().then_some(action);
                        next
                    }
                }
                DispatchState::RunningResponder { .. } | DispatchState::RunningTask { .. } => {
                    let action = convo.pending_action.take().ok_or_else(|| {
                        DispatchError::Internal(format!("no pending action in {state}"))
                    })?;
                    let message = self.execute(&action, &convo.history, cancel).await?;
                    convo.append(message);
                    hops += 1;
                    DispatchState::Deciding
                }
                DispatchState::Terminated => DispatchState::Terminated,
            };
            trace.push(state.clone());
        }

        tracing::info!(hops, final_sender = %convo.last_sender, "Turn finished");

        let appended = convo.history[turn_start..].to_vec();
        Ok(TurnOutcome {
            state: convo,
            appended,
            trace,
            hops,
        })
    }

    /// Execute one node and turn recoverable failures into messages
    async fn execute(
        &self,
        action: &Action,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<Message, DispatchError> {
        let timeout = self.config.completion_timeout;
        let result = match action {
            Action::RouteToResponder { id } => {
                let descriptor = self
                    .registry
                    .resolve_responder(id)
                    .ok_or_else(|| DispatchError::UnknownResponder(id.clone()))?;
                ResponderNode::new(descriptor, self.llm.as_ref(), timeout)
                    .invoke(history, cancel)
                    .await
            }
            Action::RouteToTask(invocation) => {
                TaskNode::new(&self.registry, self.llm.as_ref(), timeout)
                    .run(invocation, history, cancel)
                    .await
            }
            Action::Terminate | Action::Unknown { .. } => {
                return Err(DispatchError::Internal(format!(
                    "{action:?} is not executable"
                )));
            }
        };

        match result {
            Ok(message) => Ok(message),
            Err(NodeError::TaskNotFound(name)) => {
                tracing::warn!(task = %name, "Task not found");
                Ok(Message::tool(&name, format!("Task '{name}' not found")))
            }
            Err(NodeError::Completion(e)) => {
                tracing::error!(responder = %e.responder_id, error = %e.cause, "Responder failed");
                Ok(Message::responder(
                    &e.responder_id,
                    format!("{ERROR_REPLY_PREFIX}{}", e.cause),
                ))
            }
            Err(NodeError::Cancelled) => Err(DispatchError::Cancelled),
        }
    }
}
