//! Prompt template escaping and rendering
//!
//! Templates use `{name}` placeholders with `{{` and `}}` as literal braces.
//! Responder definitions are free-form markdown, so their braces are escaped
//! before rendering; only the reserved variables survive as placeholders.

use std::collections::HashMap;

/// Placeholders that keep their meaning inside responder definitions
pub const RESERVED_VARIABLES: &[&str] = &["messages", "input", "question", "context"];

/// Escape every brace in `raw` except reserved `{name}` placeholders
pub fn escape_literal_braces(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 16);
    let mut rest = raw;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with('}') {
            out.push_str("}}");
            rest = &tail[1..];
            continue;
        }

        match reserved_placeholder(tail) {
            Some(len) => {
                out.push_str(&tail[..len]);
                rest = &tail[len..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Length of a reserved `{name}` at the start of `tail`, if there is one
fn reserved_placeholder(tail: &str) -> Option<usize> {
    let close = tail.find('}')?;
    let name = &tail[1..close];
    RESERVED_VARIABLES.contains(&name).then_some(close + 1)
}

/// Render a template: collapse escaped braces and fill known placeholders.
///
/// Placeholders without a value are left in place.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
        } else {
            match tail.find('}') {
                Some(close) if !tail[1..close].contains('{') => {
                    let name = &tail[1..close];
                    match vars.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&tail[..=close]),
                    }
                    rest = &tail[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
    }

    out.push_str(rest);
    out
}

/// Literal `{key}` replacement used by task templates. No escape handling.
pub fn substitute_params<'a>(
    template: &str,
    params: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> String {
    params
        .into_iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape_keeps_reserved() {
        assert_eq!(
            escape_literal_braces("Use {topic} for {input}."),
            "Use {{topic}} for {input}."
        );
    }

    #[test]
    fn test_escape_lone_braces() {
        assert_eq!(escape_literal_braces("a } b { c"), "a }} b {{ c");
        assert_eq!(escape_literal_braces("{{x}}"), "{{{{x}}}}");
    }

    #[test]
    fn test_render_fills_known_vars() {
        let vars = HashMap::from([("input", "hello".to_string())]);
        let rendered = render(&escape_literal_braces("Use {topic} for {input} in {context}."), &vars);
        assert_eq!(rendered, "Use {topic} for hello in {context}.");
    }

    #[test]
    fn test_substitute_leaves_unmatched() {
        let params = BTreeMap::from([("checklist".to_string(), "architect-checklist.md".to_string())]);
        let out = substitute_params("Run {checklist} against {doc}", &params);
        assert_eq!(out, "Run architect-checklist.md against {doc}");
    }

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let params = BTreeMap::from([("a".to_string(), "1".to_string())]);
        assert_eq!(substitute_params("{a}+{a}", &params), "1+1");
    }

    proptest! {
        #[test]
        fn escaped_text_renders_back_verbatim(text in "[a-z {}]{0,40}") {
            prop_assume!(!RESERVED_VARIABLES.iter().any(|v| text.contains(&format!("{{{v}}}"))));
            let rendered = render(&escape_literal_braces(&text), &HashMap::new());
            prop_assert_eq!(rendered, text);
        }
    }
}
