//! Filesystem loader for responder and task definitions
//!
//! Layout under the resources directory:
//!
//! ```text
//! agents/<id>.md   responder definition, with a fenced yaml block
//! tasks/<name>.md  task prompt template
//! ```

use super::{Registry, RegistryBuilder, ResponderDescriptor};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// The orchestrator definition describes the dispatcher itself, not a responder.
const ORCHESTRATOR_ID: &str = "bmad-orchestrator";

const DEFAULT_TITLE: &str = "Unknown";
const DEFAULT_WHEN_TO_USE: &str = "N/A";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Could not find yaml block in {0}")]
    MissingYamlBlock(PathBuf),
    #[error("Invalid yaml in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    agent: AgentSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentSection {
    id: Option<String>,
    title: Option<String>,
    when_to_use: Option<String>,
}

/// Fenced YAML header of a responder definition
static YAML_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```yaml\r?\n(.*?)```").expect("Invalid YAML block regex"));

/// Parse one responder definition. The whole file becomes the prompt template.
fn parse_responder_definition(
    file_id: &str,
    content: &str,
    path: &Path,
) -> Result<ResponderDescriptor, RegistryError> {
    let block = YAML_BLOCK_REGEX
        .captures(content)
        .and_then(|c| c.get(1))
        .ok_or_else(|| RegistryError::MissingYamlBlock(path.to_path_buf()))?;

    // An empty block parses as null; treat it like an empty mapping
    let definition: Option<DefinitionFile> =
        serde_yaml::from_str(block.as_str()).map_err(|source| RegistryError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
    let agent = definition.unwrap_or_default().agent;

    // Routing is keyed by file name; the header id is informational
    if let Some(declared) = agent.id.as_deref().filter(|id| *id != file_id) {
        tracing::warn!(
            file = %file_id,
            declared_id = %declared,
            "Responder header id differs from file name; routing by file name"
        );
    }

    Ok(ResponderDescriptor::new(
        file_id,
        agent.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        agent
            .when_to_use
            .unwrap_or_else(|| DEFAULT_WHEN_TO_USE.to_string()),
        content,
    ))
}

/// Build a registry from `<dir>/agents` and `<dir>/tasks`.
///
/// Bad definitions are logged and skipped; missing directories give empty
/// sections.
pub fn load_from_dir(dir: &Path) -> Registry {
    let mut builder = Registry::builder();
    builder = load_responders(builder, &dir.join("agents"));
    builder = load_tasks(builder, &dir.join("tasks"));
    let registry = builder.build();

    tracing::info!(
        path = %dir.display(),
        responders = registry.responders().len(),
        tasks = registry.task_names().len(),
        "Registry loaded"
    );
    registry
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Definition directory unavailable");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

fn read(path: &Path) -> Result<String, RegistryError> {
    std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_responders(mut builder: RegistryBuilder, dir: &Path) -> RegistryBuilder {
    for path in markdown_files(dir) {
        let Some(file_id) = file_stem(&path) else {
            continue;
        };
        if file_id == ORCHESTRATOR_ID {
            continue;
        }

        match read(&path).and_then(|content| parse_responder_definition(&file_id, &content, &path))
        {
            Ok(descriptor) => {
                tracing::debug!(id = %descriptor.id, title = %descriptor.title, "Loaded responder");
                builder = builder.responder(descriptor);
            }
            Err(e) => {
                tracing::warn!(file = %file_id, error = %e, "Skipping responder definition");
            }
        }
    }
    builder
}

fn load_tasks(mut builder: RegistryBuilder, dir: &Path) -> RegistryBuilder {
    for path in markdown_files(dir) {
        let Some(name) = file_stem(&path) else {
            continue;
        };
        match read(&path) {
            Ok(template) => builder = builder.task(name, template),
            Err(e) => tracing::warn!(task = %name, error = %e, "Skipping task template"),
        }
    }
    builder
}
