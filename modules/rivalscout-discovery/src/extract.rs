//! Structured extraction: search results in, typed competitor candidates out.
//!
//! The model is asked for a strict JSON array; the response is parsed by
//! slicing the first `[` … last `]` span. A response that fails to parse
//! yields an empty batch (logged, never raised) — an empty extraction is a
//! normal outcome, not an error.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use ai_client::Claude;
use rivalscout_common::{country_to_iso2, normalize_domain, normalize_website_url, SearchHit};

use crate::util::{parse_funding, slice_json_array, truncate_chars};

/// Inputs that steer the extraction prompt.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub industry: Option<String>,
}

/// A candidate competitor as extracted from search results, before scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicCandidate {
    pub name: String,
    pub website: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub founded_year: Option<i32>,
    pub total_funding: Option<i64>,
}

#[async_trait]
pub trait CandidateExtractor: Send + Sync {
    async fn extract(
        &self,
        results: &[SearchHit],
        ctx: &ExtractionContext,
    ) -> Result<Vec<BasicCandidate>>;
}

/// Bound the prompt: at most this many sources per call.
const MAX_RESULTS_PER_PROMPT: usize = 15;
/// And at most this much scraped content per source.
const MAX_CONTENT_CHARS: usize = 1500;
/// Token budget sized for ~10 extracted records.
const MAX_EXTRACTION_TOKENS: u32 = 4000;

pub struct LlmExtractor {
    claude: Claude,
}

/// What the model returns per company. Lenient on numeric fields — models
/// emit `"2019"` and `2019` interchangeably, and funding as prose.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default)]
    name: String,
    #[serde(default)]
    website: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    business_model: Option<String>,
    #[serde(default)]
    value_proposition: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    founded_year: Option<i32>,
    #[serde(default, deserialize_with = "lenient_funding")]
    total_funding: Option<i64>,
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().map(|y| y as i32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_funding<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => parse_funding(&s),
        _ => None,
    })
}

impl LlmExtractor {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            claude: Claude::new(api_key, model)
                .with_temperature(0.2)
                .with_max_tokens(MAX_EXTRACTION_TOKENS),
        }
    }

    fn build_user_prompt(results: &[SearchHit], ctx: &ExtractionContext) -> String {
        let mut prompt = format!(
            "Search intent:\nKeywords: {}\nTarget markets: {}\n",
            ctx.keywords.join(", "),
            ctx.regions.join(", "),
        );
        if let Some(industry) = &ctx.industry {
            prompt.push_str(&format!("Industry: {industry}\n"));
        }
        prompt.push_str("\nSources:\n");

        for (i, hit) in results.iter().take(MAX_RESULTS_PER_PROMPT).enumerate() {
            prompt.push_str(&format!(
                "\n--- Source {} ---\nURL: {}\nTitle: {}\nSnippet: {}\n",
                i + 1,
                hit.url,
                hit.title,
                hit.snippet
            ));
            if let Some(content) = &hit.content {
                if !content.is_empty() {
                    prompt.push_str("Content: ");
                    prompt.push_str(truncate_chars(content, MAX_CONTENT_CHARS));
                    prompt.push('\n');
                }
            }
        }
        prompt
    }

    fn parse_response(response: &str) -> Vec<RawCandidate> {
        let json = match slice_json_array(response) {
            Some(json) => json,
            None => {
                warn!("Extraction response contained no JSON array");
                return Vec::new();
            }
        };
        match serde_json::from_str(json) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Failed to parse extraction response");
                Vec::new()
            }
        }
    }

    /// Normalize and filter raw candidates: require name + website, canonical
    /// https URLs, ISO2 uppercase countries, one candidate per domain.
    fn post_process(raw: Vec<RawCandidate>) -> Vec<BasicCandidate> {
        let mut seen_domains = std::collections::HashSet::new();
        let mut out = Vec::new();

        for candidate in raw {
            let name = candidate.name.trim().to_string();
            let website_raw = candidate.website.trim();
            if name.is_empty() || website_raw.is_empty() {
                continue;
            }
            let website = normalize_website_url(website_raw);
            let domain = match normalize_domain(&website) {
                Some(d) => d,
                None => continue,
            };
            if !seen_domains.insert(domain) {
                continue;
            }

            let country = candidate
                .country
                .as_deref()
                .and_then(country_to_iso2)
                .map(|c| c.to_string());

            out.push(BasicCandidate {
                name,
                website,
                description: non_empty(candidate.description),
                industry: non_empty(candidate.industry),
                country,
                business_model: non_empty(candidate.business_model),
                value_proposition: non_empty(candidate.value_proposition),
                founded_year: candidate.founded_year,
                total_funding: candidate.total_funding,
            });
        }
        out
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl CandidateExtractor for LlmExtractor {
    async fn extract(
        &self,
        results: &[SearchHit],
        ctx: &ExtractionContext,
    ) -> Result<Vec<BasicCandidate>> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let user_prompt = Self::build_user_prompt(results, ctx);
        let response = self.claude.chat_completion(SYSTEM_PROMPT, user_prompt).await?;

        let raw = Self::parse_response(&response);
        let candidates = Self::post_process(raw);

        info!(
            sources = results.len().min(MAX_RESULTS_PER_PROMPT),
            extracted = candidates.len(),
            "Extracted competitor candidates"
        );
        Ok(candidates)
    }
}

const SYSTEM_PROMPT: &str = r#"You extract real companies from web search results for competitive analysis.

Sources are either direct company pages or listicle articles ("Top 10 fintechs in X").
- From a company page, extract that company.
- From a listicle, extract EVERY company it names.
- Skip generic news sites, directories, and aggregators unless the page is ABOUT that company itself.
- Skip duplicate companies: one entry per company across all sources.

For each company return an object with these keys:
- "name": company name (required)
- "website": official website URL (required — skip the company if you cannot determine it)
- "description": one or two sentences on what the company does
- "industry": primary industry (e.g. "fintech", "logistics")
- "country": ISO-3166 alpha-2 code of the home market (e.g. "NG")
- "business_model": "B2B", "B2C", "B2B2C" or a short phrase
- "value_proposition": the core value proposition in one sentence
- "founded_year": four-digit year if stated
- "total_funding": total funding raised if stated (e.g. "$10M")

Omit keys you cannot fill. Respond with ONLY a JSON array of these objects, no commentary."#;

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, website: &str) -> RawCandidate {
        RawCandidate {
            name: name.to_string(),
            website: website.to_string(),
            description: None,
            industry: None,
            country: None,
            business_model: None,
            value_proposition: None,
            founded_year: None,
            total_funding: None,
        }
    }

    #[test]
    fn parse_response_tolerates_prose_and_fences() {
        let response = r#"Here you go:
```json
[{"name": "Kuda", "website": "kuda.com", "country": "nigeria"}]
```"#;
        let parsed = LlmExtractor::parse_response(response);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Kuda");
    }

    #[test]
    fn parse_failure_returns_empty_not_error() {
        assert!(LlmExtractor::parse_response("total garbage").is_empty());
        assert!(LlmExtractor::parse_response("[{not json}]").is_empty());
    }

    #[test]
    fn post_process_requires_name_and_website() {
        let raw_batch = vec![
            raw("Kuda", "kuda.com"),
            raw("", "nameless.com"),
            raw("Siteless", ""),
        ];
        let processed = LlmExtractor::post_process(raw_batch);
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].website, "https://kuda.com");
    }

    #[test]
    fn post_process_dedups_by_domain() {
        let raw_batch = vec![
            raw("Kuda", "https://kuda.com"),
            raw("Kuda Bank", "https://www.kuda.com/about/"),
            raw("Carbon", "carbon.ng"),
        ];
        let processed = LlmExtractor::post_process(raw_batch);
        assert_eq!(processed.len(), 2);
        assert_eq!(processed[0].name, "Kuda");
        assert_eq!(processed[1].name, "Carbon");
    }

    #[test]
    fn country_normalization() {
        let mut a = raw("A", "a.com");
        a.country = Some("nigeria".to_string());
        let mut b = raw("B", "b.com");
        b.country = Some("NGA".to_string());
        let mut c = raw("C", "c.com");
        c.country = Some("somewhere over the rainbow".to_string());

        let processed = LlmExtractor::post_process(vec![a, b, c]);
        assert_eq!(processed[0].country.as_deref(), Some("NG"));
        assert_eq!(processed[1].country.as_deref(), Some("NG"));
        assert_eq!(processed[2].country, None);
    }

    #[test]
    fn lenient_numeric_fields() {
        let json = r#"[
            {"name": "A", "website": "a.com", "founded_year": "2019", "total_funding": "$1.2M"},
            {"name": "B", "website": "b.com", "founded_year": 2021, "total_funding": 500000}
        ]"#;
        let raw_batch: Vec<RawCandidate> = serde_json::from_str(json).unwrap();
        assert_eq!(raw_batch[0].founded_year, Some(2019));
        assert_eq!(raw_batch[0].total_funding, Some(1_200_000));
        assert_eq!(raw_batch[1].founded_year, Some(2021));
        assert_eq!(raw_batch[1].total_funding, Some(500_000));
    }

    #[test]
    fn prompt_caps_sources_and_content() {
        let hits: Vec<SearchHit> = (0..20)
            .map(|i| SearchHit {
                url: format!("https://site{i}.com"),
                title: format!("Site {i}"),
                snippet: "snippet".to_string(),
                content: Some("x".repeat(5000)),
            })
            .collect();
        let ctx = ExtractionContext {
            keywords: vec!["fintech".to_string()],
            regions: vec!["NG".to_string()],
            industry: None,
        };
        let prompt = LlmExtractor::build_user_prompt(&hits, &ctx);
        assert!(prompt.contains("--- Source 15 ---"));
        assert!(!prompt.contains("--- Source 16 ---"));
        // 15 sources × ≤1500 chars of content plus framing stays bounded
        assert!(prompt.len() < 15 * (MAX_CONTENT_CHARS + 300));
    }
}
