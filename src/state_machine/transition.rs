//! Pure decision and transition functions
//!
//! Given the same last message and the same registry, `decide` always
//! yields the same action. Neither function performs I/O.

use super::action::Action;
use super::invocation::parse_invocation;
use super::state::{DispatchState, Message, Role};
use crate::registry::Registry;
use thiserror::Error;

/// Errors that can occur during a transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown responder: {0}")]
    UnknownResponder(String),
    #[error("Invalid transition from {from}: {action:?}")]
    InvalidTransition { from: DispatchState, action: Action },
}

/// Decide the next action from the most recent message.
///
/// Responder routes are resolved against the registry here, so an
/// unregistered id comes back as [`Action::Unknown`].
pub fn decide(last: Option<&Message>, default_responder: &str, registry: &Registry) -> Action {
    let Some(last) = last else {
        return Action::Terminate;
    };

    if let Some(invocation) = parse_invocation(&last.content) {
        return Action::RouteToTask(invocation);
    }

    match last.role {
        Role::User => resolve(Action::route_to_responder(default_responder), registry),
        Role::Responder | Role::Tool | Role::System => Action::Terminate,
    }
}

/// Check a responder route against the registry
pub fn resolve(action: Action, registry: &Registry) -> Action {
    match action {
        Action::RouteToResponder { id } if registry.resolve_responder(&id).is_none() => {
            Action::Unknown { id }
        }
        other => other,
    }
}

/// Apply a decided action to the `Deciding` state
pub fn transition(state: &DispatchState, action: &Action) -> Result<DispatchState, TransitionError> {
    match (state, action) {
        (DispatchState::Deciding, Action::RouteToResponder { id }) => {
            Ok(DispatchState::RunningResponder { id: id.clone() })
        }
        (DispatchState::Deciding, Action::RouteToTask(invocation)) => {
            Ok(DispatchState::RunningTask {
                name: invocation.task_name.clone(),
            })
        }
        (DispatchState::Deciding, Action::Terminate) => Ok(DispatchState::Terminated),
        (DispatchState::Deciding, Action::Unknown { id }) => {
            Err(TransitionError::UnknownResponder(id.clone()))
        }
        (from, action) => Err(TransitionError::InvalidTransition {
            from: from.clone(),
            action: action.clone(),
        }),
    }
}
