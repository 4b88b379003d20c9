//! CLI entry point for the routing and similarity engine.
//!
//! Provides commands for managing the vector store, classifying pre-encoded
//! utterances, and inspecting configuration. All results are JSON on stdout.

use std::path::{Path, PathBuf};

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use tracing::debug;

use vecroute::io::{CliError, ExitCode, OutputManager, parse_vector, read_items};
use vecroute::routing::{
    Dispatcher, RouteCatalog, RouteClassifier, RouteCorpus, RouteScore,
};
use vecroute::vector::{StoreStats, StoredItem, VectorStore};
use vecroute::{RetryPolicy, RoutingService, Settings, logging};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Embedding-based intent routing and similarity search
#[derive(Parser)]
#[command(
    name = "vecroute",
    version = env!("CARGO_PKG_VERSION"),
    about = "Embedding-based intent routing and similarity search",
    long_about = "Classify pre-encoded utterances into intents and query a persisted vector store.\nVectors are produced by an external encoder and passed as JSON arrays.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output for this crate to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .vecroute directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Write vectors to the store
    #[command(
        about = "Upsert one vector or a batch of vectors",
        after_help = "Examples:\n  vecroute upsert --key BTC --vector '[0.1, 0.9, 0.0]'\n  vecroute upsert --file items.json   # [{\"key\": \"BTC\", \"vector\": [...]}, ...]"
    )]
    Upsert {
        /// Item key (with --vector)
        #[arg(long, requires = "vector", conflicts_with = "file")]
        key: Option<String>,

        /// Item vector as a JSON array (with --key)
        #[arg(long, requires = "key")]
        vector: Option<String>,

        /// JSON file with a batch of items
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Find the most similar stored vectors
    #[command(about = "Cosine top-k query against the store")]
    Query {
        /// Query vector as a JSON array
        #[arg(long)]
        vector: String,

        /// Number of matches (defaults to store.default_top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Classify a pre-encoded utterance and select its pipeline
    #[command(about = "Route an encoded utterance to an intent and pipeline")]
    Classify {
        /// Utterance embedding as a JSON array
        #[arg(long)]
        vector: String,

        /// Original utterance text, passed through to the pipeline
        #[arg(long, default_value = "")]
        utterance: String,

        /// Pre-encoded corpus file (defaults to classifier.corpus_path)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Include every route's score in the output
        #[arg(long)]
        scores: bool,
    },

    /// Print the built-in route catalog for encoding
    #[command(about = "Print the built-in intent catalog as JSON")]
    Catalog,

    /// Show store statistics
    #[command(about = "Display store and corpus information")]
    Info,
}

#[derive(Debug, Serialize)]
struct UpsertOutput {
    written: usize,
    rows: usize,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    #[serde(flatten)]
    request: vecroute::routing::DispatchRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<Vec<RouteScore>>,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    store: StoreStats,
    corpus_path: PathBuf,
    corpus_routes: Option<usize>,
    corpus_exemplars: Option<usize>,
    /// Why the corpus could not be loaded, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    corpus_error: Option<String>,
    threshold: f32,
    fallback_route: String,
}

/// Corpus counts for `info`, or the reason the file could not be used.
#[derive(Debug, Default)]
struct CorpusSummary {
    routes: Option<usize>,
    exemplars: Option<usize>,
    error: Option<String>,
}

impl CorpusSummary {
    fn load(path: &Path) -> Self {
        match RouteCorpus::from_file(path) {
            Ok(corpus) => Self {
                routes: Some(corpus.len()),
                exemplars: Some(corpus.exemplar_count()),
                error: None,
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Self::default()
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut output = OutputManager::new();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Logging is configured from settings, so report directly.
            let code = output.error(&e).unwrap_or(ExitCode::GeneralError);
            std::process::exit(code.into());
        }
    };
    logging::init(&settings.logging, cli.verbose);
    debug!(workspace = ?settings.workspace_root, "settings loaded");

    let code = match run(cli.command, &settings, &mut output).await {
        Ok(code) => code,
        Err(e) => output.error(&e).unwrap_or(ExitCode::GeneralError),
    };
    std::process::exit(code.into());
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, CliError> {
    let loaded = match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    loaded.map_err(|e| CliError::Config(e.to_string()))
}

async fn run(
    command: Commands,
    settings: &Settings,
    output: &mut OutputManager,
) -> Result<ExitCode, CliError> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(output.success(serde_json::json!({ "path": path }))?)
        }

        Commands::Config => Ok(output.success(settings)?),

        Commands::Upsert { key, vector, file } => {
            let items = match (key, vector, file) {
                (Some(key), Some(vector), None) => vec![StoredItem::new(key, parse_vector(&vector)?)],
                (None, None, Some(file)) => read_items(&file)?,
                _ => {
                    return Err(CliError::InvalidArgument(
                        "pass either --key with --vector, or --file".to_string(),
                    ));
                }
            };
            let store = open_store(settings)?;
            // Not retried: a timed-out upsert may already have committed.
            let written = store.upsert(items).await?;
            Ok(output.success(UpsertOutput {
                written,
                rows: store.len(),
            })?)
        }

        Commands::Query { vector, top_k } => {
            let vector = parse_vector(&vector)?;
            let top_k = top_k.unwrap_or(settings.store.default_top_k);
            let store = &open_store(settings)?;
            let vector = &vector;
            let matches = RetryPolicy::default()
                .run(move || store.query(vector, top_k))
                .await?;
            Ok(output.success(matches)?)
        }

        Commands::Classify {
            vector,
            utterance,
            corpus,
            scores,
        } => {
            let vector = parse_vector(&vector)?;
            let corpus_path = corpus.unwrap_or_else(|| settings.corpus_path());
            let corpus = RouteCorpus::from_file(&corpus_path)?;
            let classifier = RouteClassifier::new(corpus, settings.classifier.policy.clone())?;
            let route_scores = if scores {
                Some(classifier.scores(&vector)?)
            } else {
                None
            };

            let service = RoutingService::new(
                classifier,
                Dispatcher::new(settings.dispatch.clone()),
                open_store(settings)?,
                settings.store.default_top_k,
            )?;
            let (service, utterance, vector) = (&service, utterance.as_str(), &vector);
            let request = RetryPolicy::default()
                .run(move || service.handle(utterance, vector))
                .await?;
            Ok(output.success(ClassifyOutput {
                request,
                scores: route_scores,
            })?)
        }

        Commands::Catalog => Ok(output.success(RouteCatalog::builtin())?),

        Commands::Info => {
            let store = open_store(settings)?;
            let corpus_path = settings.corpus_path();
            let corpus = CorpusSummary::load(&corpus_path);
            Ok(output.success(InfoOutput {
                store: store.stats()?,
                corpus_routes: corpus.routes,
                corpus_exemplars: corpus.exemplars,
                corpus_error: corpus.error,
                corpus_path,
                threshold: settings.classifier.policy.threshold,
                fallback_route: settings.classifier.policy.fallback_route.clone(),
            })?)
        }
    }
}

fn open_store(settings: &Settings) -> Result<VectorStore, CliError> {
    let options = settings
        .store
        .options()
        .map_err(|e| CliError::Config(format!("store.dimension: {e}")))?;
    Ok(VectorStore::open(settings.store_path(), options)?)
}
