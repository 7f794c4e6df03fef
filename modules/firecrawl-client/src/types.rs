use serde::Deserialize;
use serde_json::Value;

/// One web result. `markdown` is present when the search was asked to
/// scrape result pages.
#[derive(Debug, Clone, Deserialize)]
pub struct WebDocument {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub markdown: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<WebDocument>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<ScrapeData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeData {
    #[serde(default)]
    pub markdown: Option<String>,
    /// Structured output when an extraction schema was supplied.
    #[serde(default, alias = "json")]
    pub extract: Option<Value>,
}
