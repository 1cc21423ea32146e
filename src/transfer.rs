use std::fs;
use std::path::Path;
use anyhow::{Context as AnyhowContext, Result};

use crate::catalog::NodeCatalog;
use crate::error::GraphError;
use crate::graph::{WorkflowDefinition, validate_definition};

/// Serializes a definition to the interchange JSON document.
pub fn export_definition(definition: &WorkflowDefinition) -> Result<String> {
    serde_json::to_string_pretty(definition).context("failed to serialize workflow document")
}

pub fn export_to_file(definition: &WorkflowDefinition, path: &Path) -> Result<()> {
    let serialized = export_definition(definition)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write workflow document to {}", path.display()))
}

/// Parses and fully validates an interchange document. Malformed JSON and
/// structural violations are both rejected; the caller's graph stays as
/// it was.
pub fn import_definition(raw: &str, catalog: &NodeCatalog) -> Result<WorkflowDefinition, GraphError> {
    let definition: WorkflowDefinition =
        serde_json::from_str(raw).map_err(|e| GraphError::MalformedDocument(e.to_string()))?;
    validate_definition(&definition, catalog)?;
    Ok(definition)
}

pub fn import_from_file(path: &Path, catalog: &NodeCatalog) -> Result<WorkflowDefinition> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow document from {}", path.display()))?;
    Ok(import_definition(&raw, catalog)?)
}
