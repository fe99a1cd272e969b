use std::path::{Path, PathBuf};

use prodsearch::cli::{Cli, Commands, ConfigAction};
use prodsearch::config::{Config, ConfigValidator};
use prodsearch::dataset;
use prodsearch::embedding::create_provider;
use prodsearch::error::{ProdSearchError, Result};
use prodsearch::evaluation::Evaluator;
use prodsearch::indexing::{self, IndexBuilder};
use prodsearch::retrieval::ProductSearcher;
use prodsearch::store::ElasticsearchStore;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::GenerateDataset {
            max_rows,
            unique_queries,
            seed,
        } => {
            cmd_generate_dataset(cli.config, max_rows, unique_queries, seed)?;
        }
        Commands::BuildIndex { train_file, index } => {
            cmd_build_index(cli.config, train_file, index)?;
        }
        Commands::Search { query, index, json } => {
            cmd_search(cli.config, &query, index, json)?;
        }
        Commands::Evaluate {
            test_file,
            relevance_map,
            cutoffs,
            output,
        } => {
            cmd_evaluate(cli.config, test_file, relevance_map, cutoffs, output)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "prodsearch=debug"
    } else {
        "prodsearch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_generate_dataset(
    config_path: Option<PathBuf>,
    max_rows: Option<usize>,
    unique_queries: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(max_rows) = max_rows {
        config.dataset.max_rows = max_rows;
    }
    if let Some(unique_queries) = unique_queries {
        config.dataset.unique_queries = unique_queries;
    }
    if let Some(seed) = seed {
        config.dataset.seed = seed;
    }
    ConfigValidator::validate(&config)?;

    let summary = dataset::generate_dataset(&config.dataset)?;

    println!("✓ Dataset generated");
    println!("  Queries: {}", summary.queries);
    println!(
        "  Train: {} rows -> {}",
        summary.train_rows,
        summary.train_path.display()
    );
    println!(
        "  Test: {} rows -> {}",
        summary.test_rows,
        summary.test_path.display()
    );
    println!("  Relevance map: {}", summary.relevance_path.display());

    Ok(())
}

fn cmd_build_index(
    config_path: Option<PathBuf>,
    train_file: Option<PathBuf>,
    index: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let train_file = train_file.unwrap_or_else(|| config.index.train_file.clone());
    let index_name = index.unwrap_or_else(|| config.index.name.clone());

    let mapping = if config.index.mapping_path.exists() {
        indexing::load_mapping(&config.index.mapping_path)?
    } else {
        tracing::warn!(
            "Mapping file {:?} not found, using the bundled mapping",
            config.index.mapping_path
        );
        indexing::default_mapping()?
    };

    tracing::info!("Loading train products from {}", train_file.display());
    let products = dataset::load_train_products(&train_file)?;

    let embedder = create_provider(&config.embedding)?;
    let store = ElasticsearchStore::from_config(&config.store)?;

    let stats = IndexBuilder::new(embedder.as_ref(), &store, index_name, mapping).build(&products)?;

    println!(
        "✓ Indexed {} products into '{}'",
        stats.indexed, stats.index_name
    );
    Ok(())
}

fn cmd_search(
    config_path: Option<PathBuf>,
    query: &str,
    index: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let index_name = index.unwrap_or_else(|| config.index.name.clone());

    let embedder = create_provider(&config.embedding)?;
    let store = ElasticsearchStore::from_config(&config.store)?;
    let searcher = ProductSearcher::new(embedder.as_ref(), &store, index_name);

    let results = searcher.search(query)?;

    if json {
        let output = serde_json::to_string_pretty(&results).map_err(|e| ProdSearchError::Json {
            source: e,
            context: "Failed to serialize search results".to_string(),
        })?;
        println!("{}", output);
    } else if results.is_empty() {
        println!("No results found for: {}", query);
    } else {
        let blocks: Vec<String> = results.iter().map(ToString::to_string).collect();
        println!("{}", blocks.join("\n"));
    }

    Ok(())
}

fn cmd_evaluate(
    config_path: Option<PathBuf>,
    test_file: Option<PathBuf>,
    relevance_map: Option<PathBuf>,
    cutoffs: Option<Vec<usize>>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(cutoffs) = cutoffs {
        config.evaluation.cutoffs = cutoffs;
    }
    ConfigValidator::validate(&config)?;

    let test_file = test_file.unwrap_or_else(|| config.evaluation.test_file.clone());
    let relevance_map =
        relevance_map.unwrap_or_else(|| config.evaluation.relevance_map_path.clone());

    let embedder = create_provider(&config.embedding)?;
    let store = ElasticsearchStore::from_config(&config.store)?;
    let searcher = ProductSearcher::new(embedder.as_ref(), &store, config.index.name.clone());

    let report = Evaluator::new(&searcher)
        .with_cutoffs(config.evaluation.cutoffs.clone())
        .run(&test_file, &relevance_map)?;

    println!("{}", report);
    println!("  Queries evaluated: {}", report.num_queries);

    if let Some(path) = output {
        report.save(&path)?;
        println!("✓ Report written to {}", path.display());
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let content = toml::to_string_pretty(&config)?;
            println!("{}", content);
        }
        ConfigAction::Validate => {
            let path = resolve_config_path(config_path)?;
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Store: {}", config.store.url);
            println!(
                "  Embedding: {} ({})",
                config.embedding.model_id, config.embedding.model_type
            );
            println!("  Index: {}", config.index.name);
        }
        ConfigAction::Init { force } => {
            let path = resolve_config_path(config_path)?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            let config_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let mapping_path = config_dir.join("product_mapping.json");

            let mut config = Config::default();
            config.index.mapping_path = mapping_path.clone();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());

            if force || !mapping_path.exists() {
                std::fs::write(&mapping_path, indexing::DEFAULT_MAPPING).map_err(|e| {
                    ProdSearchError::Io {
                        source: e,
                        context: format!("Failed to write mapping: {:?}", mapping_path),
                    }
                })?;
            }

            println!("✓ Index mapping installed at: {}", mapping_path.display());
        }
    }

    Ok(())
}

fn resolve_config_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => Config::default_path(),
    }
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = resolve_config_path(config_path)?;
    Config::load_or_default(&path)
}
