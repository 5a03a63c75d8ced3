//! MedAid application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the embedding backend and collection store
//! 3. Seed the built-in first-aid guides
//! 4. Run one subcommand and print its result as JSON on stdout

mod cli;

use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use medaid_core::config::MedaidConfig;
use medaid_core::error::MedaidError;
use medaid_insight::summarize_title_detailed;
use medaid_vector::{seed_first_aid, CollectionStore, FirstAidRetriever, MetadataFilter};

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can apply; load errors
    // are reported once the subscriber is up.
    let config_file = args.resolve_config_path();
    let loaded = if config_file.exists() {
        MedaidConfig::load(&config_file).map(Some)
    } else {
        Ok(None)
    };
    let config_level = match &loaded {
        Ok(Some(config)) => config.general.log_level.clone(),
        _ => MedaidConfig::default().general.log_level,
    };

    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.resolve_log_level(&config_level))),
        )
        .init();

    tracing::debug!("Starting MedAid v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(Some(config)) => {
            tracing::debug!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Ok(None) => {
            tracing::debug!(path = %config_file.display(), "No config file, using defaults");
            MedaidConfig::default()
        }
        Err(e) => {
            tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Invalid config, using defaults"
            );
            MedaidConfig::default()
        }
    };

    let output = match args.command {
        Command::Title { text } => serde_json::to_value(summarize_title_detailed(&text))?,
        Command::Query {
            text,
            limit,
            filters,
            context,
        } => {
            let store = open_store(&config).await?;
            let retriever = FirstAidRetriever::from_config(Arc::clone(&store), &config.retrieval);
            let output = if context {
                json!({ "context": retriever.context_for(&text).await.map_err(MedaidError::from)? })
            } else {
                let filter = filters
                    .into_iter()
                    .fold(MetadataFilter::new(), |f, (k, v)| f.require(k, v));
                let hits = retriever
                    .relevant_guides(&text, limit, &filter)
                    .await
                    .map_err(MedaidError::from)?;
                serde_json::to_value(&hits)?
            };
            drop(retriever);
            close_store(store);
            output
        }
        Command::Collections => {
            let store = open_store(&config).await?;
            let output = serde_json::to_value(store.list_collections())?;
            close_store(store);
            output
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Build the configured embedder and store, seeding the guides if enabled.
async fn open_store(config: &MedaidConfig) -> Result<Arc<CollectionStore>, MedaidError> {
    let store = Arc::new(CollectionStore::from_config(&config.embedding)?);
    tracing::info!(
        backend = ?config.embedding.backend,
        dimensions = store.dimensions(),
        "Collection store ready"
    );

    if config.retrieval.seed_first_aid {
        seed_first_aid(&store, &config.retrieval.first_aid_collection).await?;
    }
    Ok(store)
}

fn close_store(store: Arc<CollectionStore>) {
    match Arc::try_unwrap(store) {
        Ok(store) => {
            let documents = store.shutdown();
            tracing::debug!(documents, "Collection store shut down");
        }
        Err(_) => tracing::warn!("Collection store still shared at exit"),
    }
}
