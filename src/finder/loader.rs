//! Catalog Loader
//!
//! Loads the tool catalog and the guided question table with 3-layer merging:
//! 1. Built-in defaults compiled into the binary
//! 2. Project files (JSON, or YAML by extension)
//! 3. CLI overrides

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;

use super::guided::QuestionTable;
use super::types::Catalog;

/// Command-line adjustments applied after merging
#[derive(Debug, Default, Clone)]
pub struct CatalogOverrides {
    /// Tool ids dropped from the catalog
    pub exclude_tools: Vec<String>,
    /// Keep only tools carrying at least one of these tags
    pub only_tags: Vec<String>,
}

/// Load the catalog: built-in defaults, then an optional project catalog,
/// then CLI overrides. The result is validated before it is returned.
pub fn load_catalog(project_catalog: Option<&Path>, overrides: &CatalogOverrides) -> Result<Catalog> {
    let mut catalog = load_builtin_catalog()?;

    if let Some(path) = project_catalog {
        let project: Catalog = read_data_file(path)?;
        catalog = merge_catalogs(catalog, project);
    }

    catalog = apply_overrides(catalog, overrides);
    catalog.validate()?;

    tracing::debug!(
        criteria = catalog.criteria.len(),
        tools = catalog.tools.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Load the question table. A project table replaces the built-in one.
pub fn load_question_table(project_table: Option<&Path>) -> Result<QuestionTable> {
    match project_table {
        Some(path) => read_data_file(path),
        None => load_builtin_questions(),
    }
}

pub fn load_builtin_catalog() -> Result<Catalog> {
    let json = include_str!("../../data/catalog.default.json");
    serde_json::from_str(json).context("Failed to parse built-in catalog.default.json")
}

pub fn load_builtin_questions() -> Result<QuestionTable> {
    let json = include_str!("../../data/questions.default.json");
    serde_json::from_str(json).context("Failed to parse built-in questions.default.json")
}

/// Read a JSON or YAML file, picking the format from the extension
pub fn read_data_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON from {:?}", path))
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Merge a project catalog into a base catalog; project entries win by id
pub fn merge_catalogs(base: Catalog, project: Catalog) -> Catalog {
    let mut result = base;

    for criterion in project.criteria {
        if let Some(existing) = result.criteria.iter_mut().find(|c| c.id == criterion.id) {
            *existing = criterion;
        } else {
            result.criteria.push(criterion);
        }
    }

    for tool in project.tools {
        if let Some(existing) = result.tools.iter_mut().find(|t| t.id == tool.id) {
            *existing = tool;
        } else {
            result.tools.push(tool);
        }
    }

    if project.version.is_some() {
        result.version = project.version;
    }

    result
}

fn apply_overrides(mut catalog: Catalog, overrides: &CatalogOverrides) -> Catalog {
    for id in &overrides.exclude_tools {
        if !catalog.contains_tool(id) {
            tracing::warn!("Unknown tool ID in --exclude: {}", id);
        }
    }
    catalog
        .tools
        .retain(|t| !overrides.exclude_tools.contains(&t.id));

    if !overrides.only_tags.is_empty() {
        catalog
            .tools
            .retain(|t| overrides.only_tags.iter().any(|tag| t.has_tag(tag)));
    }

    catalog
}

/// SHA-256 of the canonical JSON form, hex encoded
pub fn catalog_fingerprint(catalog: &Catalog) -> String {
    let bytes = serde_json::to_vec(catalog).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
