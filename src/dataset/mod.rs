//! Dataset curation for the shopping-queries benchmark
//!
//! Reads the examples and products tables, keeps the exact-match (`E`)
//! judgements of the configured locale and split, samples a query subset and
//! writes three artifacts: the train CSV that feeds the index, the held-out
//! test CSV and the relevance map used as ground truth by the evaluator.

mod curator;
mod reader;
mod records;
mod relevance;

pub use curator::{CuratedDataset, CurationOptions, DatasetCurator};
pub use reader::{read_csv, read_table, write_csv};
pub use records::{is_complete_row, ExampleRecord, PairRecord, ProductRecord, RawRow};
pub use relevance::RelevanceMap;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DatasetConfig;
use crate::error::Result;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {path:?}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to write {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Column '{column}' missing from {table} table")]
    MissingColumn {
        table: &'static str,
        column: String,
    },

    #[error("Cannot sample {requested} {what}: only {available} available")]
    SampleTooLarge {
        what: &'static str,
        requested: usize,
        available: usize,
    },
}

/// What a dataset run produced and where it went
#[derive(Debug, Clone)]
pub struct CurationSummary {
    pub queries: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub relevance_path: PathBuf,
}

impl From<&DatasetConfig> for CurationOptions {
    fn from(config: &DatasetConfig) -> Self {
        Self {
            unique_queries: config.unique_queries,
            max_rows: config.max_rows,
            seed: config.seed,
            ..Self::default()
        }
    }
}

/// Curate the configured tables and write train, test and relevance artifacts
pub fn generate_dataset(config: &DatasetConfig) -> Result<CurationSummary> {
    let examples_path = config.data_dir.join(&config.examples_file);
    let products_path = config.data_dir.join(&config.products_file);

    tracing::info!("Loading examples from {}", examples_path.display());
    let examples = read_table(&examples_path)?;
    tracing::info!("Loading products from {}", products_path.display());
    let products = read_table(&products_path)?;

    let curator = DatasetCurator::new(CurationOptions::from(config));
    let curated = curator.curate(&examples, &products)?;

    let train_path = config.train_path();
    let test_path = config.test_path();

    write_csv(&train_path, &curated.train)?;
    tracing::info!("Train data saved to {}", train_path.display());
    write_csv(&test_path, &curated.test)?;
    tracing::info!("Test data saved to {}", test_path.display());
    curated.relevance.save(&config.relevance_map_path)?;
    tracing::info!(
        "Relevance map saved to {}",
        config.relevance_map_path.display()
    );

    Ok(CurationSummary {
        queries: curated.relevance.len(),
        train_rows: curated.train.len(),
        test_rows: curated.test.len(),
        train_path,
        test_path,
        relevance_path: config.relevance_map_path.clone(),
    })
}

/// Product records to index, read from a curated train CSV
pub fn load_train_products(path: &Path) -> Result<Vec<ProductRecord>> {
    let pairs: Vec<PairRecord> = read_csv(path)?;
    Ok(pairs.iter().map(ProductRecord::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tables(dir: &Path) {
        std::fs::write(
            dir.join("examples.csv"),
            "example_id,query,query_id,product_id,product_locale,esci_label,small_version,large_version,split\n\
             1,black hair dye,10,B1,us,E,1,1,train\n\
             2,black hair dye,10,B2,us,E,1,1,train\n\
             3,red lipstick,11,B3,us,E,1,1,train\n\
             4,red lipstick,11,B4,us,S,1,1,train\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("products.csv"),
            "product_id,product_title,product_description,product_bullet_point,product_brand,product_color,product_locale\n\
             B1,Black Dye,<p>Deep black</p>,Lasts long,Clairol,black,us\n\
             B2,Jet Dye,Soft finish,Easy rinse,Revlon,black,us\n\
             B3,Red Stick,Matte red,All day,Revlon,red,us\n\
             B4,Pink Stick,Gloss,Shiny,Revlon,pink,us\n",
        )
        .unwrap();
    }

    fn config(dir: &Path) -> DatasetConfig {
        DatasetConfig {
            data_dir: dir.to_path_buf(),
            examples_file: "examples.csv".to_string(),
            products_file: "products.csv".to_string(),
            output_dir_train: dir.join("out/train"),
            output_dir_test: dir.join("out/test"),
            relevance_map_path: dir.join("out/all_pairs.json"),
            max_rows: 2,
            unique_queries: 2,
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn test_generate_dataset_writes_artifacts() {
        let temp = TempDir::new().unwrap();
        write_tables(temp.path());
        let config = config(temp.path());

        let summary = generate_dataset(&config).unwrap();
        assert_eq!(summary.queries, 2);
        assert_eq!(summary.train_rows, 2);
        assert_eq!(summary.test_rows, 1);
        assert!(summary.train_path.exists());
        assert!(summary.test_path.exists());

        let relevance = RelevanceMap::load(&summary.relevance_path).unwrap();
        assert_eq!(relevance.pair_count(), 3);
        assert!(!relevance.contains("11", "B4"));

        let products = load_train_products(&summary.train_path).unwrap();
        assert_eq!(products.len(), 2);
        assert!(products.iter().all(|p| p.product_locale.as_deref() == Some("us")));
    }

    #[test]
    fn test_generate_dataset_too_few_rows() {
        let temp = TempDir::new().unwrap();
        write_tables(temp.path());
        let config = DatasetConfig {
            max_rows: 50,
            ..config(temp.path())
        };

        let err = generate_dataset(&config).unwrap_err();
        assert!(err.to_string().contains("only 3 available"));
    }
}
