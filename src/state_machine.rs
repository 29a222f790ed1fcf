//! Dispatcher state machine
//!
//! Pure decision step plus the explicit state transitions the dispatcher
//! loop drives. All I/O lives in the runtime.

mod action;
mod invocation;
pub mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use action::{Action, TaskInvocation};
pub use state::{ConversationState, DispatchState, Message, Role};
pub use transition::{decide, transition, TransitionError};
