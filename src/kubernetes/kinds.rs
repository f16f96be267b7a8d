// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource-kind alias resolution.
//!
//! The alias table is built once per invocation from `kubectl api-resources`
//! (itself a fixed-width table, parsed with this crate's own layout
//! detector): the NAME column is the canonical plural, SHORTNAMES carries
//! comma-separated aliases, and the lowercased KIND is the singular form.
//! Read-only after construction.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};

use super::exec::CommandSpec;
use crate::table::Layout;

/// Maps alias / plural / singular spellings to the canonical plural name.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    alias_map: HashMap<String, String>,
}

impl KindRegistry {
    /// Build the registry by running the kind listing through `kubectl`.
    pub fn load(kubectl: &str) -> Result<Self> {
        let listing = CommandSpec::new(kubectl)
            .arg("api-resources")
            .output_text()
            .context("failed to list resource kinds")?;
        Self::from_listing(&listing)
    }

    /// Parse an `api-resources` style listing into a registry.
    pub fn from_listing(listing: &str) -> Result<Self> {
        let mut lines = listing.lines();
        let header = lines.next().context("empty resource-kind listing")?;
        let layout = Layout::detect(header).context("malformed resource-kind listing header")?;
        if layout.len() < 2 {
            bail!("resource-kind listing has no alias column");
        }
        let kind_column = layout.columns().iter().position(|c| c.name == "KIND");

        let mut registry = Self::default();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields = layout.decode(line);
            let plural = fields[0].as_str();
            if plural.is_empty() {
                continue;
            }
            let shortnames: Vec<&str> = fields[1]
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let singular = kind_column
                .and_then(|i| fields.get(i))
                .map(|kind| kind.to_lowercase());
            registry.add(plural, &shortnames, singular.as_deref());
        }

        if registry.alias_map.is_empty() {
            bail!("resource-kind listing contained no kinds");
        }
        Ok(registry)
    }

    fn add(&mut self, plural: &str, shortnames: &[&str], singular: Option<&str>) {
        let canonical = plural.to_lowercase();
        for alias in shortnames {
            self.alias_map
                .insert(alias.to_lowercase(), canonical.clone());
        }
        if let Some(singular) = singular {
            // Plural spellings must win over a singular that collides with
            // another kind's plural name.
            self.alias_map
                .entry(singular.to_string())
                .or_insert_with(|| canonical.clone());
        }
        self.alias_map.insert(canonical.clone(), canonical);
    }

    /// Resolve any accepted spelling to the canonical plural name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.alias_map.get(&name.to_lowercase()).map(String::as_str)
    }
}
