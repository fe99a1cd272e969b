//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "prodsearch",
    version,
    about = "Hybrid product search over the shopping-queries dataset",
    long_about = "prodsearch curates a train/test split of the shopping-queries dataset, indexes product \
                  embeddings into Elasticsearch, answers free-text queries with a hybrid lexical and \
                  vector ranking, and reports Hits@N and MRR on the held-out queries."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/prodsearch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Curate the train/test splits and the relevance map
    GenerateDataset {
        /// Pairs to sample into the train split
        #[arg(long)]
        max_rows: Option<usize>,

        /// Distinct queries to sample
        #[arg(long)]
        unique_queries: Option<usize>,

        /// Sampling seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Embed the train products and rebuild the index
    BuildIndex {
        /// Train CSV to index (defaults to index.train_file)
        #[arg(long)]
        train_file: Option<PathBuf>,

        /// Index name (defaults to index.name)
        #[arg(short, long)]
        index: Option<String>,
    },

    /// Run a hybrid search for a free-text query
    Search {
        /// Search query text
        query: String,

        /// Index name (defaults to index.name)
        #[arg(short, long)]
        index: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Compute Hits@N and MRR over the test split
    Evaluate {
        /// Test CSV (defaults to evaluation.test_file)
        #[arg(long)]
        test_file: Option<PathBuf>,

        /// Relevance map JSON (defaults to evaluation.relevance_map_path)
        #[arg(long)]
        relevance_map: Option<PathBuf>,

        /// Comma-separated Hits@N cutoffs
        #[arg(long, value_delimiter = ',')]
        cutoffs: Option<Vec<usize>>,

        /// Write the report as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,

    /// Initialize default configuration and the index mapping template
    Init {
        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
