//! AI-driven competitive analysis, with a deterministic fallback when the
//! model call fails.

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use ai_client::Claude;
use rivalscout_common::{region_name, Swot};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AnalysisSwot {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

/// What the analysis step produces: SWOT plus positioning and signals.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CompetitorAnalysis {
    #[serde(default)]
    pub competitive_analysis: AnalysisSwot,
    /// One-paragraph market positioning statement.
    pub market_positioning: Option<String>,
    #[serde(default)]
    pub growth_signals: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl CompetitorAnalysis {
    pub fn swot(&self) -> Swot {
        Swot {
            strengths: self.competitive_analysis.strengths.clone(),
            weaknesses: self.competitive_analysis.weaknesses.clone(),
            opportunities: self.competitive_analysis.opportunities.clone(),
            threats: self.competitive_analysis.threats.clone(),
        }
    }
}

#[async_trait]
pub trait CompetitorAnalyst: Send + Sync {
    /// `profile` is a compact summary of everything known so far;
    /// `context` is capped page content for grounding.
    async fn analyze(&self, profile: &str, context: &str) -> Result<CompetitorAnalysis>;
}

pub struct ClaudeAnalyst {
    claude: Claude,
}

impl ClaudeAnalyst {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            claude: Claude::new(api_key, model)
                .with_temperature(0.2)
                .with_max_tokens(2048),
        }
    }
}

const ANALYST_SYSTEM_PROMPT: &str = "You are a competitive-intelligence analyst. \
Given what is known about a company, produce a concise SWOT analysis, a market \
positioning statement, growth signals, and risk factors. Ground every point in \
the provided data; do not invent facts. Keep each point to one sentence.";

#[async_trait]
impl CompetitorAnalyst for ClaudeAnalyst {
    async fn analyze(&self, profile: &str, context: &str) -> Result<CompetitorAnalysis> {
        let user_prompt = if context.is_empty() {
            format!("Company profile:\n{profile}")
        } else {
            format!("Company profile:\n{profile}\n\nAdditional page content:\n{context}")
        };
        self.claude.extract(ANALYST_SYSTEM_PROMPT, user_prompt).await
    }
}

/// Deterministic substitute when the model call fails: derived purely from
/// fields already in hand, so enrichment always returns an analysis shape.
pub fn fallback_analysis(
    name: &str,
    industry: Option<&str>,
    country: Option<&str>,
    total_funding: Option<i64>,
    founded_year: Option<i32>,
) -> CompetitorAnalysis {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut opportunities = Vec::new();

    if let Some(industry) = industry {
        strengths.push(format!("Established presence in {industry}"));
    }
    match total_funding {
        Some(funding) if funding >= 1_000_000 => {
            strengths.push("Significant external funding raised".to_string());
        }
        Some(_) => strengths.push("Externally funded".to_string()),
        None => weaknesses.push("No disclosed funding".to_string()),
    }
    if let Some(year) = founded_year {
        strengths.push(format!("Operating since {year}"));
    } else {
        weaknesses.push("Limited public company history".to_string());
    }
    if let Some(country) = country {
        opportunities.push(format!(
            "Potential to expand beyond {}",
            region_name(country)
        ));
    }
    opportunities.push("Underserved adjacent customer segments".to_string());

    CompetitorAnalysis {
        competitive_analysis: AnalysisSwot {
            strengths,
            weaknesses,
            opportunities,
            threats: vec!["Well-funded entrants targeting the same market".to_string()],
        },
        market_positioning: Some(format!(
            "{name} competes on the strength of its existing market footprint."
        )),
        growth_signals: Vec::new(),
        risk_factors: Vec::new(),
    }
}
