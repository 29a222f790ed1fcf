//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::invocation::{parse_invocation, parse_params};
use super::*;
use crate::registry::{Registry, ResponderDescriptor};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_registry() -> Registry {
    Registry::builder()
        .responder(ResponderDescriptor::new(
            "analyst",
            "Business Analyst",
            "For analysis.",
            "You are an analyst.",
        ))
        .responder(ResponderDescriptor::new(
            "pm",
            "Product Manager",
            "For PRDs.",
            "You are a PM.",
        ))
        .task("execute-checklist", "Run {checklist}")
        .build()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::Responder),
        Just(Role::Tool),
        Just(Role::System),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_role(), "[a-zA-Z0-9 .,{}=\"]{0,80}", "[a-z]{1,10}")
        .prop_map(|(role, content, origin)| Message::new(role, content, origin))
}

fn arb_task_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,20}"
}

fn arb_dispatch_state() -> impl Strategy<Value = DispatchState> {
    prop_oneof![
        Just(DispatchState::Deciding),
        "[a-z]{1,8}".prop_map(|id| DispatchState::RunningResponder { id }),
        "[a-z]{1,8}".prop_map(|name| DispatchState::RunningTask { name }),
        Just(DispatchState::Terminated),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|id| Action::RouteToResponder { id }),
        arb_task_name().prop_map(|name| Action::RouteToTask(TaskInvocation::new(name))),
        Just(Action::Terminate),
        "[a-z]{1,8}".prop_map(|id| Action::Unknown { id }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Same message, same registry: same action
    #[test]
    fn decide_is_deterministic(msg in arb_message()) {
        let registry = test_registry();
        let first = decide(Some(&msg), "analyst", &registry);
        let second = decide(Some(&msg), "analyst", &registry);
        prop_assert_eq!(first, second);
    }

    /// Without an invocation only user messages are routed onward
    #[test]
    fn non_user_messages_without_invocation_terminate(msg in arb_message()) {
        prop_assume!(parse_invocation(&msg.content).is_none());
        let action = decide(Some(&msg), "analyst", &test_registry());
        if msg.role == Role::User {
            prop_assert_eq!(action, Action::route_to_responder("analyst"));
        } else {
            prop_assert_eq!(action, Action::Terminate);
        }
    }

    /// An invocation anywhere in the text routes to that task
    #[test]
    fn embedded_invocation_is_found(
        prefix in "[a-zA-Z ]{0,30}",
        name in arb_task_name(),
        role in arb_role(),
    ) {
        let content = format!("{prefix} run task {name}");
        let msg = Message::new(role, content, "x");
        match decide(Some(&msg), "analyst", &test_registry()) {
            Action::RouteToTask(inv) => prop_assert_eq!(inv.task_name, name),
            other => prop_assert!(false, "expected task route, got {:?}", other),
        }
    }

    /// The parser never panics, and anything it returns has a usable name
    #[test]
    fn parser_total(text in ".{0,200}") {
        if let Some(inv) = parse_invocation(&text) {
            prop_assert!(!inv.task_name.is_empty());
            prop_assert!(!inv.task_name.ends_with('.'));
        }
    }

    /// Unbalanced JSON never yields parameters
    #[test]
    fn truncated_json_gives_empty_map(key in "[a-z]{1,8}", value in "[a-z]{0,8}") {
        let fragment = format!("{{\"{key}\": \"{value}\"");
        prop_assert!(parse_params(&fragment).is_empty());
    }

    /// Flat JSON objects survive with their values rendered as strings
    #[test]
    fn flat_json_round_trips(key in "[a-z]{1,8}", n in any::<i32>()) {
        let fragment = format!("{{\"{key}\": {n}}}");
        let params = parse_params(&fragment);
        prop_assert_eq!(params.get(&key).cloned(), Some(n.to_string()));
    }

    /// Only `Deciding` accepts actions
    #[test]
    fn only_deciding_transitions(state in arb_dispatch_state(), action in arb_action()) {
        let result = transition(&state, &action);
        if state == DispatchState::Deciding {
            match action {
                Action::Unknown { id } => {
                    prop_assert_eq!(result, Err(TransitionError::UnknownResponder(id)));
                }
                Action::Terminate => prop_assert_eq!(result, Ok(DispatchState::Terminated)),
                _ => prop_assert!(result.map(|s| s.is_hop()).unwrap_or(false)),
            }
        } else {
            let is_invalid = matches!(result, Err(TransitionError::InvalidTransition { .. }));
            prop_assert!(is_invalid);
        }
    }
}
