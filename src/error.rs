use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::DatasetError;
use crate::embedding::EmbeddingError;
use crate::evaluation::EvaluationError;
use crate::store::StoreError;

/// Main error type for prodsearch operations
#[derive(Error, Debug)]
pub enum ProdSearchError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Embedding model type tag is not one of openai/huggingface/bert
    #[error("Invalid embedding model type: {0}")]
    UnknownEmbeddingModel(String),

    /// Document store errors (connectivity, missing index, bad responses)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Embedding generation errors
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Dataset curation errors
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Evaluation errors
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for prodsearch operations
pub type Result<T> = std::result::Result<T, ProdSearchError>;
