//! Runtime for executing conversation turns
//!
//! The dispatcher runs one turn against an in-memory conversation; the
//! session manager serializes turns per session and persists their tails.

mod dispatcher;
mod session;
mod traits;

#[cfg(test)]
pub mod testing;

pub use dispatcher::{DispatchConfig, Dispatcher, TurnOutcome};
pub use session::SessionManager;
pub use traits::InMemorySessionStore;
