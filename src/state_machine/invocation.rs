//! Task invocation parsing
//!
//! Recognises `run task <name> [with <params>]` anywhere in a message.
//! Parameters are read with a strict parser: a flat JSON object or
//! `key=value` pairs. Anything else yields an empty map.

use super::action::TaskInvocation;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `run task <name>` with an optional `with <params>` tail
static INVOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\brun\s+task\s+([a-z0-9][a-z0-9_.\-]*)(?:\s+with\b\s*(.*))?")
        .expect("Invalid invocation regex")
});

/// One `key=value` or `key="quoted value"` pair at the start of the input
static PAIR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*=\s*(?:"([^"]*)"|([^\s,"]+))\s*(?:,|\s|$)"#)
        .expect("Invalid parameter pair regex")
});

/// Find the first task invocation in `text`
pub fn parse_invocation(text: &str) -> Option<TaskInvocation> {
    let captures = INVOCATION_REGEX.captures(text)?;
    let task_name = captures.get(1)?.as_str().trim_end_matches('.').to_string();
    if task_name.is_empty() {
        return None;
    }

    let mut invocation = TaskInvocation::new(task_name);
    if let Some(fragment) = captures.get(2) {
        invocation.params = parse_params(fragment.as_str());
    }
    Some(invocation)
}

/// Parse a parameter fragment. Malformed input gives an empty map.
pub fn parse_params(fragment: &str) -> BTreeMap<String, String> {
    let fragment = fragment.trim();
    if fragment.starts_with('{') {
        parse_json_object(fragment).unwrap_or_default()
    } else {
        parse_pairs(first_line(fragment)).unwrap_or_default()
    }
}

fn first_line(fragment: &str) -> &str {
    fragment.lines().next().unwrap_or_default()
}

/// Reads the leading JSON object and ignores whatever text follows it.
fn parse_json_object(fragment: &str) -> Option<BTreeMap<String, String>> {
    let mut stream = serde_json::Deserializer::from_str(fragment).into_iter::<Value>();
    let Value::Object(map) = stream.next()?.ok()? else {
        return None;
    };

    let mut params = BTreeMap::new();
    for (key, value) in map {
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            // Only flat key/value pairs are accepted
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        params.insert(key, value);
    }
    Some(params)
}

fn parse_pairs(fragment: &str) -> Option<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    let mut rest = fragment.trim();

    while !rest.is_empty() {
        let captures = PAIR_REGEX.captures(rest)?;
        let key = captures.get(1)?.as_str().to_string();
        let value = captures.get(2).or_else(|| captures.get(3))?.as_str();
        params.insert(key, value.to_string());

        let consumed = captures.get(0)?.end();
        rest = rest[consumed..].trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }

    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}
