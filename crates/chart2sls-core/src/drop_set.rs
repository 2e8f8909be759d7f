//! Prometheus rules to drop from rendered `PrometheusRule` objects
//!
//! The file format is a YAML mapping from rule group name to the list of
//! `alert` / `record` names to remove from that group:
//!
//! ```yaml
//! kubernetes-system:
//!   - KubeVersionMismatch
//!   - KubeClientErrors
//! node-exporter.rules:
//!   - instance:node_cpu:ratio
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Rule identifiers to remove, keyed by rule group name
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DropSet(BTreeMap<String, BTreeSet<String>>);

impl DropSet {
    /// Create an empty drop-set
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a drop-set file; an empty file is an empty drop-set
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| CoreError::DropSet {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a drop-set from YAML text
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let parsed: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(parsed.unwrap_or_default())
    }

    /// Add a rule identifier to a group
    pub fn insert(&mut self, group: impl Into<String>, rule: impl Into<String>) {
        self.0.entry(group.into()).or_default().insert(rule.into());
    }

    /// Identifiers to drop from `group`, if any
    pub fn rules_for(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.0.get(group).filter(|rules| !rules.is_empty())
    }

    /// Whether no rule would ever be dropped
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    /// Number of groups with at least one identifier
    pub fn group_count(&self) -> usize {
        self.0.values().filter(|rules| !rules.is_empty()).count()
    }
}

impl<G, R> FromIterator<(G, R)> for DropSet
where
    G: Into<String>,
    R: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (G, R)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (group, rule) in iter {
            set.insert(group, rule);
        }
        set
    }
}
