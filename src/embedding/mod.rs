//! Embedding model collaborator
//!
//! Three interchangeable backends sit behind [`EmbeddingProvider`]:
//! - `openai`: hosted API ([`OpenAiProvider`])
//! - `huggingface`: downloadable transformer from the FastEmbed registry ([`FastEmbedProvider`])
//! - `bert`: bare sentence-embedding model by short name ([`SentenceEmbedder`])
//!
//! [`create_provider`] selects one from the `embedding.model_type` tag.

mod openai;
mod provider;

pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider, SentenceEmbedder};

use crate::config::EmbeddingConfig;
use crate::error::{ProdSearchError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Embedding backend selected by configuration tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingModelType {
    /// Hosted embedding API
    OpenAi,
    /// Downloadable transformer
    HuggingFace,
    /// Bare sentence-embedding model
    Bert,
}

impl EmbeddingModelType {
    pub const TAGS: [&'static str; 3] = ["openai", "huggingface", "bert"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::HuggingFace => "huggingface",
            Self::Bert => "bert",
        }
    }
}

impl FromStr for EmbeddingModelType {
    type Err = ProdSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "huggingface" => Ok(Self::HuggingFace),
            "bert" => Ok(Self::Bert),
            other => Err(ProdSearchError::UnknownEmbeddingModel(other.to_string())),
        }
    }
}

impl fmt::Display for EmbeddingModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the embedding provider described by `config`
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let model_type: EmbeddingModelType = config.model_type.parse()?;

    tracing::info!(
        "Getting embedding model {} of type {}",
        config.model_id,
        model_type
    );

    let provider: Arc<dyn EmbeddingProvider> = match model_type {
        EmbeddingModelType::OpenAi => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                ProdSearchError::Config(format!(
                    "Environment variable {} is not set",
                    config.api_key_env
                ))
            })?;
            Arc::new(OpenAiProvider::new(
                api_key,
                &config.model_id,
                config.dimension,
                config.api_base_url.as_deref(),
            )?)
        }
        EmbeddingModelType::HuggingFace => Arc::new(
            FastEmbedProvider::new(&config.model_id)?.with_batch_size(config.batch_size),
        ),
        EmbeddingModelType::Bert => Arc::new(
            SentenceEmbedder::new(&config.model_id)?.with_batch_size(config.batch_size),
        ),
    };

    if let Some(expected) = config.dimension {
        if provider.dimension() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: provider.dimension(),
            }
            .into());
        }
    }

    Ok(provider)
}
