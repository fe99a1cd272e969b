//! Index building: embed product records and load them into the document store
//!
//! A build is a destructive full rebuild. The existing index is dropped, a
//! fresh one is created from the mapping, and every record is written once
//! under its product_id. A failure part way through leaves a partially
//! populated index; the next build starts over from scratch.

use serde_json::Value;
use std::path::Path;

use crate::dataset::ProductRecord;
use crate::embedding::EmbeddingProvider;
use crate::error::{ProdSearchError, Result};
use crate::store::{fields, DocumentStore, ProductDocument};

/// Log progress every this many documents
const PROGRESS_INTERVAL: usize = 500;

/// Outcome of a completed build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub index_name: String,
    pub indexed: usize,
}

/// Mapping shipped with the crate, used by `config init` and when no mapping file exists
pub const DEFAULT_MAPPING: &str = include_str!("../../config-templates/product_mapping.json");

pub fn default_mapping() -> Result<Value> {
    serde_json::from_str(DEFAULT_MAPPING).map_err(|e| ProdSearchError::Json {
        source: e,
        context: "Failed to parse bundled mapping".to_string(),
    })
}

/// Read an index mapping document from disk
pub fn load_mapping(path: &Path) -> Result<Value> {
    tracing::info!("Reading index mapping from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ProdSearchError::Io {
        source: e,
        context: format!("Failed to read mapping file: {:?}", path),
    })?;

    serde_json::from_str(&content).map_err(|e| ProdSearchError::Json {
        source: e,
        context: format!("Failed to parse mapping file: {:?}", path),
    })
}

/// Declared `dims` of the vector fields in a mapping, keyed by field name
fn vector_dims(mapping: &Value) -> Vec<(String, u64)> {
    let Some(properties) = mapping["mappings"]["properties"].as_object() else {
        return Vec::new();
    };

    properties
        .iter()
        .filter(|(_, spec)| spec["type"] == "dense_vector")
        .filter_map(|(name, spec)| spec["dims"].as_u64().map(|d| (name.clone(), d)))
        .collect()
}

pub struct IndexBuilder<'a> {
    embedder: &'a dyn EmbeddingProvider,
    store: &'a dyn DocumentStore,
    index_name: String,
    mapping: Value,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        store: &'a dyn DocumentStore,
        index_name: impl Into<String>,
        mapping: Value,
    ) -> Self {
        Self {
            embedder,
            store,
            index_name: index_name.into(),
            mapping,
        }
    }

    /// Fail before touching the store if the mapping cannot hold our vectors
    fn check_mapping(&self) -> Result<()> {
        let missing = missing_fields(&self.mapping);
        if !missing.is_empty() {
            tracing::warn!(
                "Mapping does not declare {}; the store will infer their types",
                missing.join(", ")
            );
        }

        let expected = self.embedder.dimension() as u64;
        let mismatched: Vec<String> = vector_dims(&self.mapping)
            .into_iter()
            .filter(|(_, dims)| *dims != expected)
            .map(|(name, dims)| format!("{} ({} dims)", name, dims))
            .collect();

        if mismatched.is_empty() {
            Ok(())
        } else {
            Err(ProdSearchError::InvalidConfigValue {
                path: "index.mapping_path".to_string(),
                message: format!(
                    "Vector fields {} do not match embedding dimension {} of {}",
                    mismatched.join(", "),
                    expected,
                    self.embedder.model_name()
                ),
            })
        }
    }

    fn to_document(&self, record: &ProductRecord) -> Result<ProductDocument> {
        let title = record.product_title.clone().unwrap_or_default();
        let texts = vec![
            title.clone(),
            record.product_description.clone().unwrap_or_default(),
            record.product_bullet_point.clone().unwrap_or_default(),
        ];

        let mut embeddings = self.embedder.embed_batch(&texts)?.into_iter();
        let mut next = || {
            embeddings.next().ok_or_else(|| {
                ProdSearchError::Config(format!(
                    "Embedding model {} returned too few vectors",
                    self.embedder.model_name()
                ))
            })
        };

        Ok(ProductDocument {
            product_title_embed: next()?,
            product_description: next()?,
            product_bullets: next()?,
            product_color: record.product_color.clone().unwrap_or_default(),
            product_brand: record.product_brand.clone().unwrap_or_default(),
            product_title_text: title,
            product_id: record.product_id.clone(),
        })
    }

    /// Drop, recreate and populate the index
    pub fn build(&self, records: &[ProductRecord]) -> Result<IndexStats> {
        self.check_mapping()?;

        if self.store.index_exists(&self.index_name)? {
            self.store.delete_index(&self.index_name)?;
            tracing::info!("Index '{}' deleted", self.index_name);
        }

        self.store.create_index(&self.index_name, &self.mapping)?;
        tracing::info!("Index '{}' created", self.index_name);

        tracing::info!(
            "Computing embeddings and inserting {} products",
            records.len()
        );

        for (i, record) in records.iter().enumerate() {
            let document = self.to_document(record)?;
            self.store
                .index_document(&self.index_name, &record.product_id, &document)?;

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                tracing::info!("Indexed {}/{} products", i + 1, records.len());
            }
        }

        tracing::info!("Index creation is completed");

        Ok(IndexStats {
            index_name: self.index_name.clone(),
            indexed: records.len(),
        })
    }
}

/// Field names every product mapping must declare
pub const REQUIRED_FIELDS: [&str; 7] = [
    fields::TITLE_EMBED,
    fields::DESCRIPTION_EMBED,
    fields::BULLETS_EMBED,
    fields::TITLE_TEXT,
    fields::BRAND,
    fields::COLOR,
    fields::PRODUCT_ID,
];

/// Names of required fields missing from a mapping's properties
pub fn missing_fields(mapping: &Value) -> Vec<&'static str> {
    let properties = &mapping["mappings"]["properties"];
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| properties.get(*f).is_none())
        .collect()
}
