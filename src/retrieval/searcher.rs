//! Retrieval client: embed, build the hybrid query, execute, project hits

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attributes::AttributeExtractor;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::retrieval::HybridQuery;
use crate::store::{DocumentStore, StoreHit};

/// One ranked product returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub title: String,
    pub brand: String,
    pub color: String,
    pub product_id: String,
}

impl From<StoreHit> for SearchResult {
    fn from(hit: StoreHit) -> Self {
        Self {
            score: hit.score,
            title: hit.source.product_title_text,
            brand: hit.source.product_brand,
            color: hit.source.product_color,
            product_id: hit.source.product_id,
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {:.2}", self.score)?;
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Brand: {}", self.brand)?;
        writeln!(f, "Color: {}", self.color)?;
        write!(f, "{}", "-".repeat(30))
    }
}

/// Hybrid product searcher over one index
pub struct ProductSearcher<'a> {
    embedder: &'a dyn EmbeddingProvider,
    store: &'a dyn DocumentStore,
    extractor: AttributeExtractor,
    index_name: String,
}

impl<'a> ProductSearcher<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        store: &'a dyn DocumentStore,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            extractor: AttributeExtractor::default(),
            index_name: index_name.into(),
        }
    }

    /// Replace the attribute vocabularies used for filters
    pub fn with_extractor(mut self, extractor: AttributeExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Build the hybrid query for `user_query` without executing it
    pub fn build_query(&self, user_query: &str) -> Result<HybridQuery> {
        let query_vector = self.embedder.embed(user_query)?;
        let attributes = self.extractor.extract(user_query);

        tracing::debug!(
            "Query {:?}: color={:?} brand={:?}",
            user_query,
            attributes.color,
            attributes.brand
        );

        Ok(HybridQuery::build(user_query, query_vector, &attributes))
    }

    /// Run a search; results keep the store's ranking
    pub fn search(&self, user_query: &str) -> Result<Vec<SearchResult>> {
        let query = self.build_query(user_query)?;
        let hits = self.store.search(&self.index_name, &query)?;

        Ok(hits.into_iter().map(SearchResult::from).collect())
    }
}
