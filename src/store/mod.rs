//! Document store collaborator
//!
//! The pipeline needs four capabilities from a store: drop an index if it
//! exists, create an index from a mapping, write a document under an id, and
//! run a hybrid scored search. [`ElasticsearchStore`] talks to a real cluster
//! over HTTP; [`MemoryStore`] evaluates the same query in process.

mod elasticsearch;
mod memory;

pub use elasticsearch::ElasticsearchStore;
pub use memory::MemoryStore;

use crate::retrieval::HybridQuery;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field names of a product document
pub mod fields {
    pub const TITLE_EMBED: &str = "product_title_embed";
    pub const DESCRIPTION_EMBED: &str = "product_description";
    pub const BULLETS_EMBED: &str = "product_bullets";
    pub const TITLE_TEXT: &str = "product_title_text";
    pub const BRAND: &str = "product_brand";
    pub const COLOR: &str = "product_color";
    pub const PRODUCT_ID: &str = "product_id";

    /// Stored fields returned with each hit
    pub const DISPLAY: [&str; 4] = [TITLE_TEXT, BRAND, COLOR, PRODUCT_ID];
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document store unreachable at {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Index not found: {index}")]
    IndexNotFound { index: String },

    #[error("Document store rejected {operation} with status {status}: {body}")]
    Request {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid document store response: {0}")]
    InvalidResponse(String),
}

/// One product as stored in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    pub product_description: Vec<f32>,
    pub product_bullets: Vec<f32>,
    pub product_title_embed: Vec<f32>,
    pub product_color: String,
    pub product_brand: String,
    pub product_title_text: String,
    pub product_id: String,
}

/// Display fields of a hit; absent fields read as empty strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitSource {
    #[serde(default)]
    pub product_title_text: String,
    #[serde(default)]
    pub product_brand: String,
    #[serde(default)]
    pub product_color: String,
    #[serde(default)]
    pub product_id: String,
}

impl From<&ProductDocument> for HitSource {
    fn from(doc: &ProductDocument) -> Self {
        Self {
            product_title_text: doc.product_title_text.clone(),
            product_brand: doc.product_brand.clone(),
            product_color: doc.product_color.clone(),
            product_id: doc.product_id.clone(),
        }
    }
}

/// A scored search hit, in store order
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub score: f32,
    pub source: HitSource,
}

/// Capabilities the pipeline needs from a document store
pub trait DocumentStore {
    /// Check whether an index exists
    fn index_exists(&self, index: &str) -> Result<bool, StoreError>;

    /// Delete an index; deleting a missing index is not an error
    fn delete_index(&self, index: &str) -> Result<(), StoreError>;

    /// Create an index from a mapping document
    fn create_index(&self, index: &str, mapping: &serde_json::Value) -> Result<(), StoreError>;

    /// Write (or overwrite) a document under `id`
    fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &ProductDocument,
    ) -> Result<(), StoreError>;

    /// Run a hybrid query, returning hits in descending score order
    fn search(&self, index: &str, query: &HybridQuery) -> Result<Vec<StoreHit>, StoreError>;
}
