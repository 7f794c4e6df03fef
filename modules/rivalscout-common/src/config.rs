use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres (storage collaborator + durable queue)
    pub database_url: String,

    // AI providers
    pub anthropic_api_key: String,
    pub voyage_api_key: String,

    // Primary search-and-scrape provider. Empty = disabled, fallback only.
    pub firecrawl_api_key: String,

    // Chat model used for extraction and analysis
    pub chat_model: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Worker tuning
    pub worker_concurrency: usize,
    pub job_max_attempts: u32,
    pub job_wallclock_seconds: u64,

    // Pacing between upstream calls
    pub search_inter_call_ms: u64,
    pub query_inter_call_ms: u64,

    // Candidates scoring below this are dropped
    pub relevance_threshold: i32,
}

const DEFAULT_CHAT_MODEL: &str = "claude-haiku-4-5-20251001";

impl Config {
    /// Load config for the discovery worker.
    /// Panics with a clear message if required vars are missing.
    pub fn worker_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            voyage_api_key: env::var("VOYAGE_API_KEY").unwrap_or_default(),
            firecrawl_api_key: env::var("FIRECRAWL_API_KEY").unwrap_or_default(),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            web_host: String::new(),
            web_port: 0,
            worker_concurrency: parsed_env("WORKER_CONCURRENCY", 5),
            job_max_attempts: parsed_env("JOB_MAX_ATTEMPTS", 2),
            job_wallclock_seconds: parsed_env("JOB_WALLCLOCK_SECONDS", 600),
            search_inter_call_ms: parsed_env("SEARCH_INTER_CALL_MS", 500),
            query_inter_call_ms: parsed_env("QUERY_INTER_CALL_MS", 1000),
            relevance_threshold: parsed_env("RELEVANCE_THRESHOLD", 75),
        }
    }

    /// Load config for the API server.
    /// AI keys are optional — without them the enrich endpoint is degraded.
    pub fn server_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            voyage_api_key: env::var("VOYAGE_API_KEY").unwrap_or_default(),
            firecrawl_api_key: env::var("FIRECRAWL_API_KEY").unwrap_or_default(),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            worker_concurrency: parsed_env("WORKER_CONCURRENCY", 5),
            job_max_attempts: parsed_env("JOB_MAX_ATTEMPTS", 2),
            job_wallclock_seconds: parsed_env("JOB_WALLCLOCK_SECONDS", 600),
            search_inter_call_ms: parsed_env("SEARCH_INTER_CALL_MS", 500),
            query_inter_call_ms: parsed_env("QUERY_INTER_CALL_MS", 1000),
            relevance_threshold: parsed_env("RELEVANCE_THRESHOLD", 75),
        }
    }

    /// Whether the primary search provider can run at all.
    pub fn primary_search_enabled(&self) -> bool {
        !self.firecrawl_api_key.is_empty()
    }

    /// Log the presence of each sensitive env var without leaking values.
    pub fn log_redacted(&self) {
        let vars = [
            ("DATABASE_URL", &self.database_url),
            ("ANTHROPIC_API_KEY", &self.anthropic_api_key),
            ("VOYAGE_API_KEY", &self.voyage_api_key),
            ("FIRECRAWL_API_KEY", &self.firecrawl_api_key),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
