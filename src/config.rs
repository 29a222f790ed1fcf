//! Service configuration from the environment

use crate::llm::LlmConfig;
use crate::runtime::DispatchConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_RESOURCES_DIR: &str = "core_resources";
const DEFAULT_RESPONDER: &str = "analyst";
const DEFAULT_MAX_HOPS: usize = 8;
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LOG_DIR: &str = "log_storage";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub resources_dir: PathBuf,
    pub log_dir: PathBuf,
    pub dispatch: DispatchConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_hops = parse_or(&get, "CREW_MAX_HOPS", DEFAULT_MAX_HOPS);
        let max_hops = if max_hops == 0 {
            tracing::warn!(default = DEFAULT_MAX_HOPS, "CREW_MAX_HOPS must be at least 1");
            DEFAULT_MAX_HOPS
        } else {
            max_hops
        };

        let timeout_secs = parse_or(
            &get,
            "CREW_COMPLETION_TIMEOUT_SECS",
            DEFAULT_COMPLETION_TIMEOUT_SECS,
        );
        let timeout_secs = if timeout_secs == 0 {
            tracing::warn!(
                default = DEFAULT_COMPLETION_TIMEOUT_SECS,
                "CREW_COMPLETION_TIMEOUT_SECS must be at least 1"
            );
            DEFAULT_COMPLETION_TIMEOUT_SECS
        } else {
            timeout_secs
        };

        Self {
            port: parse_or(&get, "CREW_PORT", DEFAULT_PORT),
            resources_dir: get("CREW_RESOURCES_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_RESOURCES_DIR), PathBuf::from),
            log_dir: get("CREW_LOG_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from),
            dispatch: DispatchConfig {
                default_responder: get("CREW_DEFAULT_RESPONDER")
                    .map_or_else(|| DEFAULT_RESPONDER.to_string(), |v| v.trim().to_string()),
                max_hops,
                completion_timeout: Duration::from_secs(timeout_secs),
            },
            llm: LlmConfig::from_lookup(&lookup),
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.resources_dir, PathBuf::from("core_resources"));
        assert_eq!(cfg.log_dir, PathBuf::from("log_storage"));
        assert_eq!(cfg.dispatch.default_responder, "analyst");
        assert_eq!(cfg.dispatch.max_hops, 8);
        assert_eq!(cfg.dispatch.completion_timeout, Duration::from_secs(120));
        assert!(cfg.llm.openai_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("CREW_PORT", "9001"),
            ("CREW_RESOURCES_DIR", "/srv/crew"),
            ("CREW_DEFAULT_RESPONDER", " pm "),
            ("CREW_MAX_HOPS", "3"),
            ("CREW_COMPLETION_TIMEOUT_SECS", "30"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.resources_dir, PathBuf::from("/srv/crew"));
        assert_eq!(cfg.dispatch.default_responder, "pm");
        assert_eq!(cfg.dispatch.max_hops, 3);
        assert_eq!(cfg.dispatch.completion_timeout, Duration::from_secs(30));
        assert_eq!(cfg.llm.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config(&[
            ("CREW_PORT", "eighty"),
            ("CREW_MAX_HOPS", "-2"),
            ("CREW_COMPLETION_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.dispatch.max_hops, 8);
        assert_eq!(cfg.dispatch.completion_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_zero_hops_rejected() {
        assert_eq!(config(&[("CREW_MAX_HOPS", "0")]).dispatch.max_hops, 8);
    }
}
