use crate::config::Config;
use crate::embedding::EmbeddingModelType;
use crate::error::{ProdSearchError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_store(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_index(config, &mut errors);
        Self::validate_dataset(config, &mut errors);
        Self::validate_evaluation(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProdSearchError::ConfigValidation { errors })
        }
    }

    fn validate_store(config: &Config, errors: &mut Vec<ValidationError>) {
        let url = config.store.url.trim();
        if url.is_empty() {
            errors.push(ValidationError::new("store.url", "Store URL cannot be empty"));
        } else if reqwest::Url::parse(url).is_err() {
            errors.push(ValidationError::new(
                "store.url",
                format!("Invalid URL: {}", url),
            ));
        }

        if config.store.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "store.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }

        if config.store.password.is_some() && config.store.username.is_none() {
            errors.push(ValidationError::new(
                "store.username",
                "A password is set without a username",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let model_type = &config.embedding.model_type;
        if model_type.parse::<EmbeddingModelType>().is_err() {
            errors.push(ValidationError::new(
                "embedding.model_type",
                format!(
                    "Model type must be one of {:?}, got '{}'",
                    EmbeddingModelType::TAGS,
                    model_type
                ),
            ));
        }

        if config.embedding.model_id.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model_id",
                "Model id cannot be empty",
            ));
        }

        if config.embedding.dimension == Some(0) {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Dimension must be greater than 0",
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_index(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.index.name.trim().is_empty() {
            errors.push(ValidationError::new("index.name", "Index name cannot be empty"));
        }

        if config.index.mapping_path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "index.mapping_path",
                "Mapping path cannot be empty",
            ));
        }
    }

    fn validate_dataset(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.dataset.unique_queries == 0 {
            errors.push(ValidationError::new(
                "dataset.unique_queries",
                "Sample size must be greater than 0",
            ));
        }

        if config.dataset.max_rows == 0 {
            errors.push(ValidationError::new(
                "dataset.max_rows",
                "Sample size must be greater than 0",
            ));
        }

        if config.dataset.train_data_name.is_empty() || config.dataset.test_data_name.is_empty() {
            errors.push(ValidationError::new(
                "dataset.train_data_name",
                "Output file names cannot be empty",
            ));
        }
    }

    fn validate_evaluation(config: &Config, errors: &mut Vec<ValidationError>) {
        let cutoffs = &config.evaluation.cutoffs;
        if cutoffs.is_empty() {
            errors.push(ValidationError::new(
                "evaluation.cutoffs",
                "At least one cutoff is required",
            ));
        }

        if cutoffs.contains(&0) {
            errors.push(ValidationError::new(
                "evaluation.cutoffs",
                "Cutoffs must be greater than 0",
            ));
        }
    }
}
