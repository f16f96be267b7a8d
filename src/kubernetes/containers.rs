//! Container listing from a resource document.
//!
//! `kubectl get ... -o json` returns the full object; only
//! `spec.containers[].name` is needed here, so the serde view is minimal
//! and ignores everything else.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ResourceDocument {
    #[serde(default)]
    spec: ResourceSpec,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct Container {
    name: String,
}

/// Extract the container names from a resource JSON document, in spec order.
pub fn container_names(document: &str) -> Result<Vec<String>> {
    let document: ResourceDocument =
        serde_json::from_str(document).context("failed to parse resource document")?;
    Ok(document
        .spec
        .containers
        .into_iter()
        .map(|c| c.name)
        .collect())
}

/// The first container of a resource document, for auto-selection.
pub fn first_container(document: &str) -> Result<String> {
    let mut names = container_names(document)?;
    if names.is_empty() {
        bail!("resource has no containers");
    }
    Ok(names.remove(0))
}
