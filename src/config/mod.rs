//! Configuration management for prodsearch
//!
//! One TOML file drives every stage: where the store lives, which embedding
//! model to use, how the index is built and how the dataset is curated.
//! Values can be overridden per run with `PRODSEARCH_SECTION__KEY` variables.

use crate::error::{ProdSearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Document store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Name of the env var holding an API key; takes precedence over basic auth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9200".to_string(),
            username: None,
            password: None,
            api_key_env: None,
            timeout_secs: 30,
        }
    }
}

/// Embedding model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_id: String,
    /// One of "openai", "huggingface", "bert"
    pub model_type: String,
    /// Expected vector size; checked against the model when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "all-MiniLM-L6-v2".to_string(),
            model_type: "bert".to_string(),
            dimension: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base_url: None,
            batch_size: 32,
        }
    }
}

/// Index build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    pub mapping_path: PathBuf,
    pub train_file: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "product_index".to_string(),
            mapping_path: PathBuf::from("config-templates/product_mapping.json"),
            train_file: PathBuf::from("data/train/train.csv"),
        }
    }
}

/// Dataset curation inputs, outputs and sampling sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    pub examples_file: String,
    pub products_file: String,
    pub output_dir_train: PathBuf,
    pub output_dir_test: PathBuf,
    pub train_data_name: String,
    pub test_data_name: String,
    pub relevance_map_path: PathBuf,
    pub max_rows: usize,
    pub unique_queries: usize,
    pub seed: u64,
}

impl DatasetConfig {
    pub fn train_path(&self) -> PathBuf {
        self.output_dir_train.join(&self.train_data_name)
    }

    pub fn test_path(&self) -> PathBuf {
        self.output_dir_test.join(&self.test_data_name)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            examples_file: "shopping_queries_dataset_examples.parquet".to_string(),
            products_file: "shopping_queries_dataset_products.parquet".to_string(),
            output_dir_train: data_dir.join("train"),
            output_dir_test: data_dir.join("test"),
            train_data_name: "train.csv".to_string(),
            test_data_name: "test.csv".to_string(),
            relevance_map_path: data_dir.join("all_pairs.json"),
            max_rows: 3000,
            unique_queries: 1000,
            seed: 42,
            data_dir,
        }
    }
}

/// Evaluation inputs and reported cutoffs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub test_file: PathBuf,
    pub relevance_map_path: PathBuf,
    pub cutoffs: Vec<usize>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_file: PathBuf::from("data/test/test.csv"),
            relevance_map_path: PathBuf::from("data/all_pairs.json"),
            cutoffs: crate::evaluation::DEFAULT_CUTOFFS.to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProdSearchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ProdSearchError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load from `path`, or fall back to defaults (plus env overrides) when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ProdSearchError::ConfigNotFound { path }) => {
                tracing::warn!("Config file {:?} not found, using defaults", path);
                let mut config = Self::default();
                config.apply_env_overrides();
                ConfigValidator::validate(&config)?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProdSearchError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ProdSearchError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: PRODSEARCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("PRODSEARCH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORE__URL" => self.store.url = value.to_string(),
            "STORE__USERNAME" => self.store.username = Some(value.to_string()),
            "STORE__PASSWORD" => self.store.password = Some(value.to_string()),
            "STORE__API_KEY_ENV" => self.store.api_key_env = Some(value.to_string()),
            "STORE__TIMEOUT_SECS" => self.store.timeout_secs = parse_value(path, value)?,
            "EMBEDDING__MODEL_ID" => self.embedding.model_id = value.to_string(),
            "EMBEDDING__MODEL_TYPE" => self.embedding.model_type = value.to_string(),
            "EMBEDDING__DIMENSION" => self.embedding.dimension = Some(parse_value(path, value)?),
            "EMBEDDING__API_KEY_ENV" => self.embedding.api_key_env = value.to_string(),
            "EMBEDDING__API_BASE_URL" => self.embedding.api_base_url = Some(value.to_string()),
            "INDEX__NAME" => self.index.name = value.to_string(),
            "INDEX__MAPPING_PATH" => self.index.mapping_path = PathBuf::from(value),
            "INDEX__TRAIN_FILE" => self.index.train_file = PathBuf::from(value),
            "DATASET__DATA_DIR" => self.dataset.data_dir = PathBuf::from(value),
            "DATASET__MAX_ROWS" => self.dataset.max_rows = parse_value(path, value)?,
            "DATASET__UNIQUE_QUERIES" => self.dataset.unique_queries = parse_value(path, value)?,
            "DATASET__SEED" => self.dataset.seed = parse_value(path, value)?,
            "EVALUATION__TEST_FILE" => self.evaluation.test_file = PathBuf::from(value),
            "EVALUATION__RELEVANCE_MAP_PATH" => {
                self.evaluation.relevance_map_path = PathBuf::from(value)
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ProdSearchError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("prodsearch").join("config.toml"))
    }
}

fn parse_value<T: FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| ProdSearchError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}
