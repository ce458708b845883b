//! Watch-list filtering
//!
//! The watch list is a JSON array of `{kind?, namespace, name}` records
//! supplied at startup. It is validated once into a [`WatchIndex`] that all
//! collectors share read-only for the lifetime of the run.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One configured (kind, namespace, name) triple from the watch list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchEntry {
    /// Resource kind, matched case-insensitively; absent means Deployment
    #[serde(default = "default_kind")]
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

fn default_kind() -> String {
    "Deployment".to_string()
}

/// Watch-list validation and parse errors
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch entry {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("failed to parse watch list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse the watch-list document into typed entries, failing on schema
/// violations rather than at first use.
pub fn parse_watch_list(document: &str) -> Result<Vec<WatchEntry>, WatchError> {
    Ok(serde_json::from_str(document)?)
}

/// Lookup index derived from the watch entries
#[derive(Debug, Clone)]
pub struct WatchIndex {
    /// lowercased kind -> set of (namespace, name)
    pairs_by_kind: HashMap<String, HashSet<(String, String)>>,
    /// every namespace mentioned by any entry, used as a fallback
    namespaces: HashSet<String>,
}

impl WatchIndex {
    /// Build the index, rejecting entries with an empty namespace or name
    pub fn from_entries(entries: &[WatchEntry]) -> Result<Self, WatchError> {
        let mut pairs_by_kind: HashMap<String, HashSet<(String, String)>> = HashMap::new();
        let mut namespaces = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            if entry.namespace.is_empty() {
                return Err(WatchError::EmptyField {
                    index,
                    field: "namespace",
                });
            }
            if entry.name.is_empty() {
                return Err(WatchError::EmptyField {
                    index,
                    field: "name",
                });
            }

            let kind = if entry.kind.is_empty() {
                default_kind().to_lowercase()
            } else {
                entry.kind.to_lowercase()
            };

            pairs_by_kind
                .entry(kind)
                .or_default()
                .insert((entry.namespace.clone(), entry.name.clone()));
            namespaces.insert(entry.namespace.clone());
        }

        Ok(Self {
            pairs_by_kind,
            namespaces,
        })
    }

    /// Return true if (namespace, name) is in scope for this kind.
    ///
    /// Membership is exact when the kind has at least one explicit entry.
    /// A kind that never appears in the watch list falls back to
    /// namespace-only matching: any entry mentioning the namespace puts the
    /// whole namespace in scope for that kind.
    pub fn is_watched(&self, kind: &str, namespace: &str, name: &str) -> bool {
        match self.pairs_by_kind.get(&kind.to_lowercase()) {
            Some(pairs) if !pairs.is_empty() => {
                pairs.contains(&(namespace.to_string(), name.to_string()))
            }
            _ => self.namespaces.contains(namespace),
        }
    }

    /// Whether any watch entry mentions this namespace
    pub fn covers_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }
}
