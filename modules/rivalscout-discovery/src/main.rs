use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rivalscout_common::Config;
use rivalscout_discovery::embedder::{Embedder, TextEmbedder};
use rivalscout_discovery::extract::LlmExtractor;
use rivalscout_discovery::pipeline::{DiscoveryPipeline, PipelineDeps};
use rivalscout_discovery::providers::{AiFallbackProvider, FirecrawlProvider};
use rivalscout_discovery::traits::PipelineStore;
use rivalscout_discovery::worker::WorkerPool;
use rivalscout_store::{JobQueue, Store};

#[derive(Parser)]
#[command(about = "Run the rivalscout discovery worker")]
struct Cli {
    /// Override WORKER_CONCURRENCY.
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rivalscout=info".parse()?))
        .init();

    info!("Rivalscout discovery worker starting...");

    dotenv_load();

    let cli = Cli::parse();
    let config = Config::worker_from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections((config.worker_concurrency * 2).max(5) as u32)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let store = Store::new(pool.clone());
    let queue = JobQueue::new(pool);

    let primary = Arc::new(FirecrawlProvider::new(&config.firecrawl_api_key));
    let fallback = Arc::new(AiFallbackProvider::new(
        &config.anthropic_api_key,
        &config.chat_model,
    ));
    let extractor = Arc::new(LlmExtractor::new(
        &config.anthropic_api_key,
        &config.chat_model,
    ));
    let embedder: Option<Arc<dyn TextEmbedder>> = if config.voyage_api_key.is_empty() {
        warn!("VOYAGE_API_KEY not set, semantic dedup disabled");
        None
    } else {
        Some(Arc::new(Embedder::new(&config.voyage_api_key)))
    };

    let pipeline_store: Arc<dyn PipelineStore> = Arc::new(store);
    let pipeline = Arc::new(DiscoveryPipeline::new(PipelineDeps {
        store: pipeline_store.clone(),
        primary,
        fallback,
        extractor,
        embedder,
        relevance_threshold: config.relevance_threshold,
        search_inter_call: Duration::from_millis(config.search_inter_call_ms),
        query_inter_call: Duration::from_millis(config.query_inter_call_ms),
    }));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, draining workers");
        let _ = shutdown_tx.send(true);
    });

    let workers = WorkerPool::new(
        queue,
        pipeline,
        pipeline_store,
        cli.concurrency.unwrap_or(config.worker_concurrency),
        Duration::from_secs(config.job_wallclock_seconds),
        shutdown_rx,
    );
    workers.run().await;

    info!("Worker shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn dotenv_load() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.join(".env"));
    let Some(path) = path else { return };
    if let Ok(content) = std::fs::read_to_string(&path) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                if std::env::var(key.trim()).is_err() {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}
