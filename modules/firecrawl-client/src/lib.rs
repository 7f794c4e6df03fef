pub mod error;
pub mod types;

pub use error::{FirecrawlError, Result};
pub use types::WebDocument;

use std::time::Duration;

use serde_json::Value;
use tracing::info;

use types::{ScrapeResponse, SearchResponse};

const BASE_URL: &str = "https://api.firecrawl.dev/v1";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct FirecrawlClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FirecrawlClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            // Per-request timeouts below; scrape needs longer than search.
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Web search. When `scrape_content` is set, result pages are rendered
    /// to markdown in the same call.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        scrape_content: bool,
    ) -> Result<Vec<WebDocument>> {
        info!(query, limit, scrape_content, "Firecrawl search");

        let mut body = serde_json::json!({
            "query": query,
            "limit": limit,
        });
        if scrape_content {
            body["scrapeOptions"] = serde_json::json!({ "formats": ["markdown"] });
        }

        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(SEARCH_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FirecrawlError::from_status(status.as_u16(), message));
        }

        let data: SearchResponse = resp.json().await?;
        if !data.success {
            return Err(FirecrawlError::Api {
                status: status.as_u16(),
                message: data.error.unwrap_or_else(|| "search unsuccessful".to_string()),
            });
        }

        info!(query, count = data.data.len(), "Firecrawl search complete");
        Ok(data.data)
    }

    /// Render a single page to markdown.
    pub async fn scrape(&self, url: &str) -> Result<String> {
        info!(url, "Firecrawl scrape");

        let body = serde_json::json!({
            "url": url,
            "formats": ["markdown"],
        });

        let data = self.scrape_request(&body).await?;
        Ok(data.and_then(|d| d.markdown).unwrap_or_default())
    }

    /// Scrape a page and extract structured JSON matching `schema`.
    pub async fn extract(&self, url: &str, schema: &Value) -> Result<Value> {
        info!(url, "Firecrawl structured extraction");

        let body = serde_json::json!({
            "url": url,
            "formats": ["extract"],
            "extract": { "schema": schema },
        });

        let data = self.scrape_request(&body).await?;
        data.and_then(|d| d.extract)
            .ok_or_else(|| FirecrawlError::Parse("No extraction output in response".to_string()))
    }

    async fn scrape_request(&self, body: &Value) -> Result<Option<types::ScrapeData>> {
        let resp = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(SCRAPE_TIMEOUT)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FirecrawlError::from_status(status.as_u16(), message));
        }

        let data: ScrapeResponse = resp.json().await?;
        if !data.success {
            return Err(FirecrawlError::Api {
                status: status.as_u16(),
                message: data.error.unwrap_or_else(|| "scrape unsuccessful".to_string()),
            });
        }
        Ok(data.data)
    }
}
