//! Workflow document parsing and serialization.
//!
//! JSON is the wire format; YAML is accepted as a convenience for
//! hand-written graphs.

use std::path::Path;

use super::types::{WorkflowDocument, WorkflowGraph};
use crate::error::{Error, Result};

/// Parse a workflow document from a JSON string.
pub fn parse_workflow(json: &str) -> Result<WorkflowDocument> {
    ensure_not_empty(json)?;
    serde_json::from_str(json).map_err(|e| describe(&e.to_string(), "JSON"))
}

/// Parse a workflow document from a YAML string.
pub fn parse_workflow_yaml(yaml: &str) -> Result<WorkflowDocument> {
    ensure_not_empty(yaml)?;
    serde_yaml::from_str(yaml).map_err(|e| describe(&e.to_string(), "YAML"))
}

/// Parse a workflow document from a file, choosing the format by extension.
pub fn parse_workflow_file(path: &Path) -> Result<WorkflowDocument> {
    let content = std::fs::read_to_string(path)?;
    if is_yaml_path(path) {
        parse_workflow_yaml(&content)
    } else {
        parse_workflow(&content)
    }
}

/// Whether a path names a YAML file.
pub fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

/// Serialize a graph to JSON.
pub fn to_json(graph: &WorkflowGraph, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(graph)?
    } else {
        serde_json::to_string(graph)?
    };
    Ok(json)
}

/// Serialize a graph to YAML.
pub fn to_yaml(graph: &WorkflowGraph) -> Result<String> {
    Ok(serde_yaml::to_string(graph)?)
}

fn ensure_not_empty(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::Parse("Empty workflow definition".to_string()));
    }
    Ok(())
}

fn describe(msg: &str, format: &str) -> Error {
    match extract_missing_field(msg) {
        Some(field) => Error::Parse(format!("Missing required field: {}", field)),
        None => Error::Parse(format!("Invalid {}: {}", format, msg)),
    }
}

fn extract_missing_field(error_message: &str) -> Option<&str> {
    let marker = "missing field `";
    let start = error_message.find(marker)? + marker.len();
    let rest = &error_message[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}
