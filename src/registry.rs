//! Immutable responder and task registry
//!
//! Built once at startup and shared read-only (`Arc<Registry>`) by every
//! turn. There is no way to mutate a registry after `build()`.

mod loader;

pub use loader::load_from_dir;

use serde::Serialize;
use std::collections::HashMap;

/// A specialist responder definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponderDescriptor {
    pub id: String,
    pub title: String,
    pub when_to_use: String,
    #[serde(skip)]
    pub prompt_template: String,
}

impl ResponderDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        when_to_use: impl Into<String>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            when_to_use: when_to_use.into(),
            prompt_template: prompt_template.into(),
        }
    }
}

/// Lookup from responder id to descriptor and from task name to template
#[derive(Debug, Default)]
pub struct Registry {
    responders: HashMap<String, ResponderDescriptor>,
    tasks: HashMap<String, String>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn resolve_responder(&self, id: &str) -> Option<&ResponderDescriptor> {
        self.responders.get(id)
    }

    pub fn resolve_task(&self, name: &str) -> Option<&str> {
        self.tasks.get(name).map(String::as_str)
    }

    /// All responders, sorted by id
    pub fn responders(&self) -> Vec<&ResponderDescriptor> {
        let mut responders: Vec<_> = self.responders.values().collect();
        responders.sort_by(|a, b| a.id.cmp(&b.id));
        responders
    }

    /// All task names, sorted
    pub fn task_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects definitions before freezing them into a [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    responders: HashMap<String, ResponderDescriptor>,
    tasks: HashMap<String, String>,
}

impl RegistryBuilder {
    /// Add a responder. A later definition with the same id replaces the earlier one.
    pub fn responder(mut self, descriptor: ResponderDescriptor) -> Self {
        if let Some(previous) = self.responders.insert(descriptor.id.clone(), descriptor) {
            tracing::warn!(id = %previous.id, "Duplicate responder definition replaced");
        }
        self
    }

    pub fn task(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.tasks.insert(name.into(), template.into());
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            responders: self.responders,
            tasks: self.tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_round_trip() {
        let registry = Registry::builder()
            .responder(ResponderDescriptor::new(
                "analyst",
                "Business Analyst",
                "For analysis.",
                "prompt",
            ))
            .build();

        let found = registry.resolve_responder("analyst").unwrap();
        assert_eq!(found.id, "analyst");
        assert_eq!(found.title, "Business Analyst");
        assert_eq!(found.when_to_use, "For analysis.");
        assert_eq!(found.prompt_template, "prompt");
    }

    #[test]
    fn test_missing_entries_are_absent() {
        let registry = Registry::builder().task("shard-doc", "Shard it").build();
        assert!(registry.resolve_responder("analyst").is_none());
        assert!(registry.resolve_task("create-doc").is_none());
        assert_eq!(registry.resolve_task("shard-doc"), Some("Shard it"));
    }

    #[test]
    fn test_listing_is_sorted() {
        let registry = Registry::builder()
            .responder(ResponderDescriptor::new("pm", "Product Manager", "", ""))
            .responder(ResponderDescriptor::new("analyst", "Business Analyst", "", ""))
            .task("b-task", "")
            .task("a-task", "")
            .build();

        let ids: Vec<_> = registry.responders().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["analyst", "pm"]);
        assert_eq!(registry.task_names(), vec!["a-task", "b-task"]);
        assert!(Registry::default().responders().is_empty());
    }
}
