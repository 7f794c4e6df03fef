mod context;
mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rivalscout_common::Config;
use rivalscout_discovery::enrichment::analysis::{ClaudeAnalyst, CompetitorAnalyst};
use rivalscout_discovery::enrichment::EnrichmentEngine;
use rivalscout_discovery::providers::FirecrawlProvider;
use rivalscout_discovery::service::{AllowAllQuota, DiscoveryService};
use rivalscout_store::{JobQueue, Store};

use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rivalscout=info".parse()?))
        .init();

    info!("Rivalscout API server starting...");

    dotenv_load();
    let config = Config::server_from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let store = Store::new(pool.clone());
    let queue = JobQueue::new(pool);
    let service = DiscoveryService::new(
        store.clone(),
        queue,
        Box::new(AllowAllQuota),
        config.job_max_attempts,
    );

    // Enrichment needs the scrape provider; the analyst is optional on top.
    let enricher = if config.primary_search_enabled() {
        let fetcher = Arc::new(FirecrawlProvider::new(&config.firecrawl_api_key));
        let analyst: Option<Arc<dyn CompetitorAnalyst>> = if config.anthropic_api_key.is_empty() {
            warn!("ANTHROPIC_API_KEY not set, enrichment runs without AI analysis");
            None
        } else {
            Some(Arc::new(ClaudeAnalyst::new(
                &config.anthropic_api_key,
                &config.chat_model,
            )))
        };
        Some(EnrichmentEngine::new(fetcher, analyst))
    } else {
        warn!("FIRECRAWL_API_KEY not set, enrichment endpoint disabled");
        None
    };

    let state = Arc::new(AppState {
        store,
        service,
        enricher,
    });
    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = addr.as_str(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
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
