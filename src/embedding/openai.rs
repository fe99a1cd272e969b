//! Hosted embedding API provider (OpenAI-compatible `/embeddings` endpoint)

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{EmbeddingError, EmbeddingProvider};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding provider backed by a hosted HTTP API
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    /// Sent as `dimensions` only when it differs from the model's native size
    requested_dimensions: Option<usize>,
}

impl OpenAiProvider {
    /// Create a provider for `model`
    ///
    /// `dimension` overrides the native size of the model; it is required for
    /// models missing from the built-in table.
    pub fn new(
        api_key: String,
        model: &str,
        dimension: Option<usize>,
        base_url: Option<&str>,
    ) -> Result<Self, EmbeddingError> {
        if api_key.is_empty() {
            return Err(EmbeddingError::InitializationError(
                "API key is empty".to_string(),
            ));
        }

        let native = native_dimension(model);
        let dim = dimension.or(native).ok_or_else(|| {
            EmbeddingError::InitializationError(format!(
                "Unknown dimension for model {}; set embedding.dimension",
                model
            ))
        })?;
        let requested_dimensions = match native {
            Some(n) if n == dim => None,
            _ => Some(dim),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        tracing::info!("Using hosted embedding model: {} ({}D)", model, dim);

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: model.to_string(),
            dimension: dim,
            requested_dimensions,
        })
    }

    fn request(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = input.len();
        let body = EmbeddingRequest {
            model: &self.model,
            input,
            dimensions: self.requested_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        if parsed.data.len() != expected {
            return Err(EmbeddingError::GenerationError(format!(
                "Expected {} embeddings, got {}",
                expected,
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();

        for embedding in &embeddings {
            if embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        Ok(embeddings)
    }
}

/// The API rejects empty strings, so blank input is sent as a single space
fn api_input(text: &str) -> &str {
    if text.trim().is_empty() {
        " "
    } else {
        text
    }
}

fn native_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request(vec![api_input(text)])?
            .pop()
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts.iter().map(|t| api_input(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
