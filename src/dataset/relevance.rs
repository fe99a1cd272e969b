//! Ground-truth relevance map: query_id -> relevant product_ids

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{ProdSearchError, Result};

static NO_PRODUCTS: BTreeSet<String> = BTreeSet::new();

/// Relevance judgements keyed by query id
///
/// Serializes as a JSON object with string keys and arrays of product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelevanceMap(BTreeMap<String, BTreeSet<String>>);

impl RelevanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (query_id, product_id) pairs; duplicates collapse
    pub fn from_pairs<I, Q, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Q, P)>,
        Q: Into<String>,
        P: Into<String>,
    {
        let mut map = Self::new();
        for (query_id, product_id) in pairs {
            map.insert(query_id, product_id);
        }
        map
    }

    pub fn insert(&mut self, query_id: impl Into<String>, product_id: impl Into<String>) {
        self.0
            .entry(query_id.into())
            .or_default()
            .insert(product_id.into());
    }

    /// Relevant products for a query; unknown queries have none
    pub fn relevant(&self, query_id: &str) -> &BTreeSet<String> {
        self.0.get(query_id).unwrap_or(&NO_PRODUCTS)
    }

    pub fn contains(&self, query_id: &str, product_id: &str) -> bool {
        self.relevant(query_id).contains(product_id)
    }

    pub fn contains_query(&self, query_id: &str) -> bool {
        self.0.contains_key(query_id)
    }

    /// Number of queries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of (query, product) judgements
    pub fn pair_count(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProdSearchError::Io {
            source: e,
            context: format!("Failed to read relevance map: {:?}", path),
        })?;

        serde_json::from_str(&content).map_err(|e| ProdSearchError::Json {
            source: e,
            context: format!("Failed to parse relevance map: {:?}", path),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProdSearchError::Io {
                source: e,
                context: format!("Failed to create directory: {:?}", parent),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ProdSearchError::Json {
            source: e,
            context: "Failed to serialize relevance map".to_string(),
        })?;

        std::fs::write(path, json).map_err(|e| ProdSearchError::Io {
            source: e,
            context: format!("Failed to write relevance map: {:?}", path),
        })
    }
}
