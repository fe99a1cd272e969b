//! In-process document store for tests and offline experiments

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{DocumentStore, HitSource, ProductDocument, StoreError, StoreHit};
use crate::retrieval::HybridQuery;

#[derive(Debug, Default)]
struct MemoryIndex {
    mapping: serde_json::Value,
    /// Documents in first-insertion order; re-indexing an id replaces in place
    documents: Vec<ProductDocument>,
}

/// Document store that evaluates hybrid queries in memory
///
/// Filters are exact term matches, the lexical clause gates candidates on
/// shared title tokens, and hits are ranked by the hybrid script score. Ties
/// keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: Mutex<BTreeMap<String, MemoryIndex>>,
    unreachable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with a connectivity error
    pub fn unreachable() -> Self {
        Self {
            indices: Mutex::default(),
            unreachable: true,
        }
    }

    /// Number of documents in `index`, if it exists
    pub fn document_count(&self, index: &str) -> Option<usize> {
        self.lock().get(index).map(|i| i.documents.len())
    }

    /// Fetch a stored document by id
    pub fn get(&self, index: &str, id: &str) -> Option<ProductDocument> {
        self.lock()
            .get(index)?
            .documents
            .iter()
            .find(|d| d.product_id == id)
            .cloned()
    }

    /// Mapping the index was created with
    pub fn mapping(&self, index: &str) -> Option<serde_json::Value> {
        self.lock().get(index).map(|i| i.mapping.clone())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, MemoryIndex>> {
        self.indices.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn connect(&self) -> Result<MutexGuard<'_, BTreeMap<String, MemoryIndex>>, StoreError> {
        if self.unreachable {
            return Err(StoreError::Connection {
                url: "memory://".to_string(),
                message: "store is unreachable".to_string(),
            });
        }
        Ok(self.lock())
    }
}

impl DocumentStore for MemoryStore {
    fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        Ok(self.connect()?.contains_key(index))
    }

    fn delete_index(&self, index: &str) -> Result<(), StoreError> {
        self.connect()?.remove(index);
        Ok(())
    }

    fn create_index(&self, index: &str, mapping: &serde_json::Value) -> Result<(), StoreError> {
        let mut indices = self.connect()?;
        if indices.contains_key(index) {
            return Err(StoreError::Request {
                operation: "create index".to_string(),
                status: 400,
                body: format!("resource_already_exists_exception: {}", index),
            });
        }
        indices.insert(
            index.to_string(),
            MemoryIndex {
                mapping: mapping.clone(),
                documents: Vec::new(),
            },
        );
        Ok(())
    }

    fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &ProductDocument,
    ) -> Result<(), StoreError> {
        let mut indices = self.connect()?;
        // Writing into a missing index auto-creates it with an empty mapping
        let target = indices.entry(index.to_string()).or_default();

        let mut document = document.clone();
        document.product_id = id.to_string();

        match target.documents.iter_mut().find(|d| d.product_id == id) {
            Some(existing) => *existing = document,
            None => target.documents.push(document),
        }
        Ok(())
    }

    fn search(&self, index: &str, query: &HybridQuery) -> Result<Vec<StoreHit>, StoreError> {
        let indices = self.connect()?;
        let target = indices.get(index).ok_or_else(|| StoreError::IndexNotFound {
            index: index.to_string(),
        })?;

        let mut hits: Vec<StoreHit> = target
            .documents
            .iter()
            .filter(|doc| query.matches(doc))
            .map(|doc| StoreHit {
                score: query.script_score(&doc.product_title_embed, &doc.product_bullets),
                source: HitSource::from(doc),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.size);

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::QueryAttributes;

    fn doc(id: &str, title: &str, color: &str, title_vec: Vec<f32>) -> ProductDocument {
        ProductDocument {
            product_description: vec![0.0, 1.0],
            product_bullets: title_vec.clone(),
            product_title_embed: title_vec,
            product_color: color.to_string(),
            product_brand: String::new(),
            product_title_text: title.to_string(),
            product_id: id.to_string(),
        }
    }

    #[test]
    fn test_search_missing_index() {
        let store = MemoryStore::new();
        let query = HybridQuery::build("dye", vec![1.0, 0.0], &QueryAttributes::default());
        assert!(matches!(
            store.search("products", &query),
            Err(StoreError::IndexNotFound { .. })
        ));
    }

    #[test]
    fn test_unreachable() {
        let store = MemoryStore::unreachable();
        assert!(matches!(
            store.index_exists("products"),
            Err(StoreError::Connection { .. })
        ));
    }

    #[test]
    fn test_reindex_replaces() {
        let store = MemoryStore::new();
        store.create_index("p", &serde_json::json!({})).unwrap();
        store.index_document("p", "a", &doc("a", "old", "", vec![1.0, 0.0])).unwrap();
        store.index_document("p", "a", &doc("a", "new", "", vec![1.0, 0.0])).unwrap();

        assert_eq!(store.document_count("p"), Some(1));
        assert_eq!(store.get("p", "a").unwrap().product_title_text, "new");
    }

    #[test]
    fn test_create_existing_index_fails() {
        let store = MemoryStore::new();
        store.create_index("p", &serde_json::json!({})).unwrap();
        assert!(store.create_index("p", &serde_json::json!({})).is_err());
        store.delete_index("p").unwrap();
        assert!(!store.index_exists("p").unwrap());
    }

    #[test]
    fn test_search_ranks_and_gates() {
        let store = MemoryStore::new();
        store.create_index("p", &serde_json::json!({})).unwrap();
        store.index_document("p", "far", &doc("far", "hair dye", "black", vec![0.0, 1.0])).unwrap();
        store.index_document("p", "near", &doc("near", "Hair Dye kit", "red", vec![1.0, 0.0])).unwrap();
        store.index_document("p", "off", &doc("off", "frying pan", "red", vec![1.0, 0.0])).unwrap();

        let query = HybridQuery::build("hair dye", vec![1.0, 0.0], &QueryAttributes::default());
        let hits = store.search("p", &query).unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.source.product_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert!((hits[0].score - 2.0).abs() < 1e-5);
        assert!((hits[1].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_search_filters_exclude() {
        let store = MemoryStore::new();
        store.create_index("p", &serde_json::json!({})).unwrap();
        store.index_document("p", "a", &doc("a", "hair dye", "black", vec![1.0, 0.0])).unwrap();
        store.index_document("p", "b", &doc("b", "hair dye", "red", vec![0.0, 1.0])).unwrap();

        let attributes = QueryAttributes {
            color: Some("red".to_string()),
            brand: None,
        };
        let query = HybridQuery::build("red hair dye", vec![1.0, 0.0], &attributes);
        let hits = store.search("p", &query).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source.product_id, "b");
    }
}
