//! Search providers: a uniform capability over the primary
//! search-and-scrape provider and the AI fallback.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use ai_client::Claude;
use firecrawl_client::{FirecrawlClient, FirecrawlError};
use rivalscout_common::{country_to_iso2, normalize_website_url, SearchHit};

use crate::util::slice_json_array;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider disabled (missing credential). Skip it entirely.
    #[error("provider unavailable")]
    Unavailable,

    /// Upstream account is out of credits. Stop calling this provider
    /// for the rest of the run.
    #[error("insufficient credits")]
    InsufficientCredits,

    #[error("rate limited")]
    RateLimited,

    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Transport(_))
    }
}

impl From<FirecrawlError> for ProviderError {
    fn from(err: FirecrawlError) -> Self {
        match err {
            FirecrawlError::InsufficientCredits => ProviderError::InsufficientCredits,
            FirecrawlError::RateLimited => ProviderError::RateLimited,
            other => ProviderError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: usize,
    pub scrape_content: bool,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this provider can run at all (credential present).
    fn is_available(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, opts: SearchOptions) -> ProviderResult<Vec<SearchHit>>;
}

/// Page-level capability of the primary provider, used by enrichment.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Render a page to markdown. An unreachable page is an error; an empty
    /// page is `Ok("")`.
    async fn scrape(&self, url: &str) -> ProviderResult<String>;

    /// Scrape a page and extract structured JSON matching `schema`.
    async fn extract_structured(
        &self,
        url: &str,
        schema: &serde_json::Value,
    ) -> ProviderResult<serde_json::Value>;
}

/// The AI fallback: synthesizes candidate companies from model knowledge
/// when live search is unavailable or returned nothing.
#[async_trait]
pub trait CandidateSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        keywords: &[String],
        regions: &[String],
        industry: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<SearchHit>>;
}

// ---------------------------------------------------------------------------
// Primary provider
// ---------------------------------------------------------------------------

pub struct FirecrawlProvider {
    client: FirecrawlClient,
    available: bool,
}

impl FirecrawlProvider {
    /// An empty api key disables the provider; callers fall back to the
    /// AI provider instead of erroring.
    pub fn new(api_key: &str) -> Self {
        if api_key.is_empty() {
            warn!("FIRECRAWL_API_KEY not set, primary search disabled");
        }
        Self {
            client: FirecrawlClient::new(api_key),
            available: !api_key.is_empty(),
        }
    }
}

#[async_trait]
impl SearchProvider for FirecrawlProvider {
    fn name(&self) -> &'static str {
        "firecrawl"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn search(&self, query: &str, opts: SearchOptions) -> ProviderResult<Vec<SearchHit>> {
        if !self.available {
            return Err(ProviderError::Unavailable);
        }

        let docs = self
            .client
            .search(query, opts.limit, opts.scrape_content)
            .await?;

        Ok(docs
            .into_iter()
            .filter(|d| !d.url.is_empty())
            .map(|d| SearchHit {
                url: d.url,
                title: d.title,
                snippet: d.description,
                content: d.markdown,
            })
            .collect())
    }
}

#[async_trait]
impl PageFetcher for FirecrawlProvider {
    async fn scrape(&self, url: &str) -> ProviderResult<String> {
        if !self.available {
            return Err(ProviderError::Unavailable);
        }
        Ok(self.client.scrape(url).await?)
    }

    async fn extract_structured(
        &self,
        url: &str,
        schema: &serde_json::Value,
    ) -> ProviderResult<serde_json::Value> {
        if !self.available {
            return Err(ProviderError::Unavailable);
        }
        Ok(self.client.extract(url, schema).await?)
    }
}

// ---------------------------------------------------------------------------
// AI fallback provider
// ---------------------------------------------------------------------------

pub struct AiFallbackProvider {
    claude: Claude,
}

#[derive(Debug, Deserialize)]
struct SynthesizedCompany {
    #[serde(default)]
    name: String,
    #[serde(default)]
    website: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    country: String,
}

impl AiFallbackProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            claude: Claude::new(api_key, model)
                .with_temperature(0.3)
                .with_max_tokens(2048),
        }
    }
}

#[async_trait]
impl CandidateSynthesizer for AiFallbackProvider {
    async fn synthesize(
        &self,
        keywords: &[String],
        regions: &[String],
        industry: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let region_names: Vec<&str> = regions
            .iter()
            .map(|c| rivalscout_common::region_name(c))
            .collect();
        let industry_line = industry
            .map(|i| format!("Industry: {i}\n"))
            .unwrap_or_default();

        let user_prompt = format!(
            "List up to {limit} real companies matching:\n\
             Keywords: {}\n\
             {industry_line}Markets: {}\n\n\
             Respond with ONLY a JSON array. Each element must be an object with \
             exactly these keys: \"name\", \"website\", \"description\", \"country\" \
             (ISO-3166 alpha-2). Only include companies you are confident actually \
             exist, with their real website. No markdown, no commentary.",
            keywords.join(", "),
            region_names.join(", "),
        );

        let response = self
            .claude
            .chat_completion(
                "You are a market researcher with broad knowledge of startups and \
                 established companies worldwide.",
                user_prompt,
            )
            .await?;

        let json = match slice_json_array(&response) {
            Some(json) => json,
            None => {
                warn!("AI fallback returned no JSON array");
                return Ok(Vec::new());
            }
        };

        let companies: Vec<SynthesizedCompany> = match serde_json::from_str(json) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "AI fallback returned malformed JSON, rejecting");
                return Ok(Vec::new());
            }
        };

        let hits: Vec<SearchHit> = companies
            .into_iter()
            .filter(|c| !c.name.trim().is_empty() && !c.website.trim().is_empty())
            .filter(|c| rivalscout_common::normalize_domain(&c.website).is_some())
            .take(limit)
            .map(|c| {
                let country = country_to_iso2(&c.country).unwrap_or_default();
                let snippet = if country.is_empty() {
                    c.description.clone()
                } else {
                    format!("{} ({})", c.description, country)
                };
                SearchHit {
                    url: normalize_website_url(&c.website),
                    title: c.name,
                    snippet,
                    content: None,
                }
            })
            .collect();

        info!(count = hits.len(), "AI fallback synthesized candidates");
        Ok(hits)
    }
}

/// Drop hits whose URL was already seen, preserving first-seen order.
/// Used to merge results across queries and providers.
pub fn dedup_hits_by_url(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = std::collections::HashSet::new();
    hits.into_iter()
        .filter(|h| {
            let key = rivalscout_common::normalize_domain(&h.url)
                .map(|d| {
                    // Keep distinct pages on the same domain apart; only the
                    // exact URL is the dedup key here.
                    format!("{d}|{}", h.url.trim_end_matches('/'))
                })
                .unwrap_or_else(|| h.url.clone());
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            title: String::new(),
            snippet: String::new(),
            content: None,
        }
    }

    #[test]
    fn url_dedup_keeps_first_and_order() {
        let hits = vec![
            hit("https://kuda.com"),
            hit("https://carbon.ng"),
            hit("https://kuda.com/"),
            hit("https://kuda.com/pricing"),
        ];
        let deduped = dedup_hits_by_url(hits);
        let urls: Vec<&str> = deduped.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://kuda.com",
                "https://carbon.ng",
                "https://kuda.com/pricing"
            ]
        );
    }

    #[test]
    fn credit_errors_are_not_transient() {
        assert!(!ProviderError::InsufficientCredits.is_transient());
        assert!(!ProviderError::Unavailable.is_transient());
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::Transport("timeout".to_string()).is_transient());
    }

    #[test]
    fn unavailable_provider_refuses_searches() {
        let provider = FirecrawlProvider::new("");
        assert!(!provider.is_available());
    }
}
