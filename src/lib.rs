//! prodsearch - hybrid product search over the shopping-queries dataset
//!
//! Curates a train/test split from the examples and products tables, indexes
//! product embeddings into a document store, answers free-text queries with a
//! hybrid lexical + vector ranking, and measures retrieval quality with
//! Hits@N and MRR.

pub mod attributes;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod indexing;
pub mod retrieval;
pub mod store;
pub mod text;

pub use error::{ProdSearchError, Result};
