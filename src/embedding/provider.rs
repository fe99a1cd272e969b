//! Embedding provider trait and local FastEmbed implementations
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Embedding API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for embedding providers
///
/// The pipeline only needs `encode(text) -> vector`; the hosted API, the
/// downloadable transformer and the bare sentence embedder all sit behind it.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text (empty text is allowed)
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embeddings for multiple texts, one vector per input in order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Downloadable transformer resolved from the FastEmbed model registry
///
/// `model_id` is a hub model code such as `BAAI/bge-small-en-v1.5` or
/// `sentence-transformers/all-MiniLM-L6-v2`. Models are downloaded on first
/// use into the FastEmbed cache directory.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
    batch_size: Option<usize>,
}

impl FastEmbedProvider {
    /// Create a provider for a hub model code
    pub fn new(model_id: &str) -> Result<Self, EmbeddingError> {
        let info = TextEmbedding::list_supported_models()
            .into_iter()
            .find(|info| info.model_code.eq_ignore_ascii_case(model_id))
            .ok_or_else(|| {
                EmbeddingError::InitializationError(format!(
                    "Unsupported model: {}. Not found in the FastEmbed registry",
                    model_id
                ))
            })?;

        Self::from_model(info.model, model_id, info.dim)
    }

    /// Create a provider from an already resolved FastEmbed model
    pub fn from_model(
        embedding_model: EmbeddingModel,
        model_name: &str,
        dimension: usize,
    ) -> Result<Self, EmbeddingError> {
        tracing::info!(
            "Initializing embedding model: {} ({}D, downloaded if not cached)",
            model_name,
            dimension
        );

        let init_options = InitOptions::new(embedding_model).with_show_download_progress(true);

        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
            dimension,
            batch_size: None,
        })
    }

    /// Texts per inference batch; FastEmbed's default when unset
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), EmbeddingError> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        let embedding = embeddings.pop().ok_or_else(|| {
            EmbeddingError::GenerationError("No embeddings generated".to_string())
        })?;

        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed(texts.to_vec(), self.batch_size)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::GenerationError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Bare sentence-embedding model addressed by its short name
///
/// Accepts the names sentence-transformers publishes, e.g. `all-MiniLM-L6-v2`,
/// with or without the `sentence-transformers/` prefix.
pub struct SentenceEmbedder {
    inner: FastEmbedProvider,
}

impl SentenceEmbedder {
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let short_name = model_name
            .strip_prefix("sentence-transformers/")
            .unwrap_or(model_name);

        let (embedding_model, dimension) = match short_name.to_lowercase().as_str() {
            "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
            "all-minilm-l12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
            "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            "bge-large-en-v1.5" => (EmbeddingModel::BGELargeENV15, 1024),
            _ => {
                return Err(EmbeddingError::InitializationError(format!(
                    "Unsupported model: {}. Supported: all-MiniLM-L6-v2, all-MiniLM-L12-v2, \
                     bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5",
                    model_name
                )));
            }
        };

        Ok(Self {
            inner: FastEmbedProvider::from_model(embedding_model, model_name, dimension)?,
        })
    }

    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self {
            inner: self.inner.with_batch_size(batch_size),
        }
    }

    /// Create embedder with default model (all-MiniLM-L6-v2)
    pub fn with_default_model() -> Result<Self, EmbeddingError> {
        Self::new("all-MiniLM-L6-v2")
    }
}

impl EmbeddingProvider for SentenceEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.inner.embed(text)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.inner.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
