//! Hybrid retrieval
//!
//! [`HybridQuery`] combines a lexical title match, attribute filters and
//! vector similarity into one scored request; [`ProductSearcher`] runs it
//! against a [`crate::store::DocumentStore`].

mod query;
mod searcher;

pub use query::{
    cosine_similarity, HybridQuery, TermFilter, BULLETS_SIMILARITY_WEIGHT, PAGE_SIZE,
    SCORE_OFFSET, TITLE_MATCH_BOOST, TITLE_SIMILARITY_WEIGHT,
};
pub use searcher::{ProductSearcher, SearchResult};
