//! Deep single-competitor enrichment: structured scrape → optional crawl →
//! social probing → AI analysis → merge and score.
//!
//! Every sub-step is allowed to fail without failing the enrichment; the
//! steps that contributed are recorded in `data_sources`.

pub mod analysis;
pub mod merge;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use ai_client::StructuredOutput;
use rivalscout_common::{
    country_to_iso2, Competitor, EnrichmentPatch, SocialLinks, SocialMetrics, SubscriptionTier,
    Swot,
};

use crate::providers::PageFetcher;
use crate::social;
use crate::util::{parse_funding, truncate_chars};

use self::analysis::{fallback_analysis, CompetitorAnalyst};

/// Crawlable paths, in priority order. The page cap equals `crawl_depth`.
const CRAWL_PATHS: &[&str] = &["/about", "/team", "/pricing", "/product", "/company"];

/// Context handed to the analyst is capped to this many chars.
const MAX_ANALYSIS_CONTEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy)]
pub struct EnrichmentOptions {
    pub include_social_media: bool,
    pub include_ai_analysis: bool,
    pub crawl_depth: u32,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            include_social_media: true,
            include_ai_analysis: true,
            crawl_depth: 1,
        }
    }
}

impl EnrichmentOptions {
    /// Defaults for a caller that did not specify options: whether AI
    /// analysis runs follows the organization's subscription tier. Callers
    /// with an explicit contract (the enrich endpoint) build options
    /// directly instead.
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        Self {
            include_ai_analysis: tier.includes_ai_analysis(),
            ..Self::default()
        }
    }
}

/// What the structured scrape asks the provider to extract.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ExtractedProfile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tagline: Option<String>,
    pub industry: Option<String>,
    /// Country name or code of the home market
    pub country: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub founders: Vec<String>,
    /// e.g. "Seed", "Series B"
    pub funding_stage: Option<String>,
    /// Total funding as stated, e.g. "$250M"
    pub total_funding: Option<String>,
    #[serde(default)]
    pub investors: Vec<String>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub target_market: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
}

impl ExtractedProfile {
    pub fn has_any_data(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.tagline.is_some()
            || self.industry.is_some()
            || self.headquarters.is_some()
            || self.founded_year.is_some()
            || !self.founders.is_empty()
            || self.funding_stage.is_some()
            || self.total_funding.is_some()
            || !self.investors.is_empty()
            || self.business_model.is_some()
            || self.value_proposition.is_some()
            || self.target_market.is_some()
            || !self.technologies.is_empty()
    }

    fn social_links(&self) -> SocialLinks {
        SocialLinks {
            linkedin: self.linkedin_url.clone(),
            twitter: self.twitter_url.clone(),
            facebook: self.facebook_url.clone(),
            instagram: None,
            youtube: None,
        }
    }
}

/// The merged enrichment result.
#[derive(Debug, Clone)]
pub struct EnrichedCompetitor {
    pub name: String,
    pub website: String,
    pub description: Option<String>,
    pub tagline: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub founders: Vec<String>,
    pub funding_stage: Option<String>,
    pub total_funding: Option<i64>,
    pub investors: Vec<String>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub target_market: Option<String>,
    pub technologies: Vec<String>,
    pub social_links: SocialLinks,
    pub swot: Option<Swot>,
    pub market_positioning: Option<String>,
    pub growth_signals: Vec<String>,
    pub risk_factors: Vec<String>,
    pub metrics: SocialMetrics,
    pub data_sources: Vec<String>,
    pub data_completeness: i32,
    pub confidence_score: i32,
    pub enrichment_date: DateTime<Utc>,
}

impl EnrichedCompetitor {
    /// Persistence patch for the adapter's merge-only-present-fields update.
    pub fn to_patch(&self) -> EnrichmentPatch {
        EnrichmentPatch {
            name: Some(self.name.clone()),
            description: self.description.clone(),
            tagline: self.tagline.clone(),
            industry: self.industry.clone(),
            country: self.country.clone(),
            headquarters: self.headquarters.clone(),
            founded_year: self.founded_year,
            founders: (!self.founders.is_empty()).then(|| self.founders.clone()),
            funding_stage: self.funding_stage.clone(),
            total_funding: self.total_funding,
            investors: (!self.investors.is_empty()).then(|| self.investors.clone()),
            business_model: self.business_model.clone(),
            value_proposition: self.value_proposition.clone(),
            target_market: self.target_market.clone(),
            technologies: (!self.technologies.is_empty()).then(|| self.technologies.clone()),
            social_links: (!self.social_links.is_empty()).then(|| self.social_links.clone()),
            swot: self.swot.clone(),
            metrics: (!self.metrics.is_empty()).then(|| self.metrics.clone()),
            confidence_score: Some(self.confidence_score),
            data_completeness: Some(self.data_completeness),
            data_sources: Some(self.data_sources.clone()),
        }
    }
}

pub struct EnrichmentEngine {
    fetcher: Arc<dyn PageFetcher>,
    analyst: Option<Arc<dyn CompetitorAnalyst>>,
}

impl EnrichmentEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>, analyst: Option<Arc<dyn CompetitorAnalyst>>) -> Self {
        Self { fetcher, analyst }
    }

    /// Enrich one competitor from its website URL and (optionally) the
    /// existing row. Partial failure is the normal mode here.
    pub async fn enrich(
        &self,
        url: &str,
        initial: Option<&Competitor>,
        opts: &EnrichmentOptions,
    ) -> Result<EnrichedCompetitor> {
        let mut data_sources: Vec<String> = Vec::new();

        // Step 1: page content + structured scrape
        let page_markdown = match self.fetcher.scrape(url).await {
            Ok(content) => content,
            Err(e) => {
                warn!(url, error = %e, "Enrichment scrape failed, continuing");
                String::new()
            }
        };

        let profile = match self
            .fetcher
            .extract_structured(url, &ExtractedProfile::output_schema())
            .await
        {
            Ok(value) => serde_json::from_value::<ExtractedProfile>(value).unwrap_or_else(|e| {
                warn!(url, error = %e, "Structured extraction did not match schema");
                ExtractedProfile::default()
            }),
            Err(e) => {
                warn!(url, error = %e, "Structured extraction failed, continuing");
                ExtractedProfile::default()
            }
        };

        if profile.has_any_data() || !page_markdown.is_empty() {
            data_sources.push("website".to_string());
        }

        // Step 2: optional deep crawl
        let mut additional_context = String::new();
        if opts.crawl_depth > 1 {
            let mut crawled_any = false;
            for path in CRAWL_PATHS.iter().take(opts.crawl_depth as usize) {
                let page_url = format!("{}{}", url.trim_end_matches('/'), path);
                match self.fetcher.scrape(&page_url).await {
                    Ok(content) if !content.is_empty() => {
                        additional_context.push_str(&content);
                        additional_context.push('\n');
                        crawled_any = true;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(url = page_url.as_str(), error = %e, "Crawl page failed"),
                }
            }
            if crawled_any {
                data_sources.push("website_crawl".to_string());
            }
        }

        // Step 3: social links — regex hits win over model output
        let mut raw_content = page_markdown.clone();
        raw_content.push_str(&additional_context);
        let mut social_links = social::extract_social_links(&raw_content);
        social_links.merge_missing_from(&profile.social_links());

        let name = profile
            .name
            .clone()
            .or_else(|| initial.map(|c| c.name.clone()))
            .filter(|n| !n.trim().is_empty())
            .or_else(|| merge::name_from_domain(url))
            .unwrap_or_else(|| url.to_string());

        if social_links.is_empty() {
            social_links = social::synthesize_social_links(&name);
        }

        // Step 4: social probes, concurrent but bounded to the three networks
        let mut metrics = SocialMetrics::default();
        if opts.include_social_media {
            let (linkedin, twitter, facebook) = tokio::join!(
                self.probe_linkedin(social_links.linkedin.as_deref()),
                self.probe_twitter(social_links.twitter.as_deref()),
                self.probe_facebook(social_links.facebook.as_deref()),
            );
            if let Some((followers, employees)) = linkedin {
                metrics.linkedin_followers = followers;
                metrics.linkedin_employees = employees;
                data_sources.push("linkedin".to_string());
            }
            if let Some(followers) = twitter {
                metrics.twitter_followers = Some(followers);
                data_sources.push("twitter".to_string());
            }
            if let Some((likes, followers)) = facebook {
                metrics.facebook_likes = likes;
                metrics.facebook_followers = followers;
                data_sources.push("facebook".to_string());
            }
        }

        // Funding and country normalize before analysis so the fallback
        // analysis sees the same values as the merge.
        let total_funding = profile
            .total_funding
            .as_deref()
            .and_then(parse_funding)
            .or_else(|| initial.and_then(|c| c.total_funding));
        let country = profile
            .country
            .as_deref()
            .and_then(country_to_iso2)
            .map(|c| c.to_string())
            .or_else(|| initial.and_then(|c| c.country.clone()));
        let industry = merge::prefer(
            profile.industry.clone(),
            initial.and_then(|c| c.industry.clone()),
        );
        let founded_year = profile.founded_year.or_else(|| initial.and_then(|c| c.founded_year));

        // Step 5: AI analysis, with deterministic fallback
        let analysis = if opts.include_ai_analysis {
            match &self.analyst {
                Some(analyst) => {
                    let summary = profile_summary(&name, url, &profile, initial);
                    let context = truncate_chars(&raw_content, MAX_ANALYSIS_CONTEXT_CHARS);
                    match analyst.analyze(&summary, context).await {
                        Ok(analysis) => {
                            data_sources.push("ai_analysis".to_string());
                            Some(analysis)
                        }
                        Err(e) => {
                            warn!(url, error = %e, "AI analysis failed, using fallback");
                            Some(fallback_analysis(
                                &name,
                                industry.as_deref(),
                                country.as_deref(),
                                total_funding,
                                founded_year,
                            ))
                        }
                    }
                }
                None => None,
            }
        } else {
            None
        };

        // Step 6: merge with precedence enrichment > initial > URL fallback
        let mut record = EnrichedCompetitor {
            name,
            website: url.to_string(),
            description: merge::prefer(
                profile.description,
                initial.and_then(|c| c.description.clone()),
            ),
            tagline: merge::prefer(profile.tagline, initial.and_then(|c| c.tagline.clone())),
            industry,
            country,
            headquarters: merge::prefer(
                profile.headquarters,
                initial.and_then(|c| c.headquarters.clone()),
            ),
            founded_year,
            founders: merge::prefer_vec(
                profile.founders,
                initial.map(|c| c.founders.clone()).unwrap_or_default(),
            ),
            funding_stage: merge::prefer(
                profile.funding_stage,
                initial.and_then(|c| c.funding_stage.clone()),
            ),
            total_funding,
            investors: merge::prefer_vec(
                profile.investors,
                initial.map(|c| c.investors.clone()).unwrap_or_default(),
            ),
            business_model: merge::prefer(
                profile.business_model,
                initial.and_then(|c| c.business_model.clone()),
            ),
            value_proposition: merge::prefer(
                profile.value_proposition,
                initial.and_then(|c| c.value_proposition.clone()),
            ),
            target_market: merge::prefer(
                profile.target_market,
                initial.and_then(|c| c.target_market.clone()),
            ),
            technologies: merge::prefer_vec(
                profile.technologies,
                initial.map(|c| c.technologies.clone()).unwrap_or_default(),
            ),
            social_links,
            swot: analysis.as_ref().map(|a| a.swot()).filter(|s| !s.is_empty()),
            market_positioning: analysis.as_ref().and_then(|a| a.market_positioning.clone()),
            growth_signals: analysis
                .as_ref()
                .map(|a| a.growth_signals.clone())
                .unwrap_or_default(),
            risk_factors: analysis
                .as_ref()
                .map(|a| a.risk_factors.clone())
                .unwrap_or_default(),
            metrics,
            data_sources,
            data_completeness: 0,
            confidence_score: 0,
            enrichment_date: Utc::now(),
        };

        // Step 7: scores
        record.data_completeness = merge::compute_completeness(&record);
        record.confidence_score = merge::compute_confidence(&record, record.data_completeness);

        info!(
            url,
            sources = record.data_sources.len(),
            completeness = record.data_completeness,
            confidence = record.confidence_score,
            "Enrichment complete"
        );
        Ok(record)
    }

    async fn probe_linkedin(&self, url: Option<&str>) -> Option<(Option<u64>, Option<u64>)> {
        let url = url?;
        match self.fetcher.scrape(url).await {
            Ok(content) if !content.is_empty() => {
                let followers = social::parse_linkedin_followers(&content);
                let employees = social::parse_linkedin_employees(&content);
                if followers.is_some() || employees.is_some() {
                    Some((followers, employees))
                } else {
                    None
                }
            }
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "LinkedIn probe failed");
                None
            }
        }
    }

    async fn probe_twitter(&self, url: Option<&str>) -> Option<u64> {
        let url = url?;
        match self.fetcher.scrape(url).await {
            Ok(content) if !content.is_empty() => social::parse_twitter_followers(&content),
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "Twitter probe failed");
                None
            }
        }
    }

    async fn probe_facebook(&self, url: Option<&str>) -> Option<(Option<u64>, Option<u64>)> {
        let url = url?;
        match self.fetcher.scrape(url).await {
            Ok(content) if !content.is_empty() => {
                let likes = social::parse_facebook_likes(&content);
                let followers = social::parse_facebook_followers(&content);
                if likes.is_some() || followers.is_some() {
                    Some((likes, followers))
                } else {
                    None
                }
            }
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "Facebook probe failed");
                None
            }
        }
    }
}

fn profile_summary(
    name: &str,
    url: &str,
    profile: &ExtractedProfile,
    initial: Option<&Competitor>,
) -> String {
    let mut lines = vec![format!("Name: {name}"), format!("Website: {url}")];
    let description = profile
        .description
        .as_deref()
        .or_else(|| initial.and_then(|c| c.description.as_deref()));
    if let Some(description) = description {
        lines.push(format!("Description: {description}"));
    }
    if let Some(industry) = profile
        .industry
        .as_deref()
        .or_else(|| initial.and_then(|c| c.industry.as_deref()))
    {
        lines.push(format!("Industry: {industry}"));
    }
    if let Some(stage) = &profile.funding_stage {
        lines.push(format!("Funding stage: {stage}"));
    }
    if let Some(funding) = &profile.total_funding {
        lines.push(format!("Total funding: {funding}"));
    }
    if !profile.founders.is_empty() {
        lines.push(format!("Founders: {}", profile.founders.join(", ")));
    }
    if !profile.technologies.is_empty() {
        lines.push(format!("Technologies: {}", profile.technologies.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_include_everything_at_depth_one() {
        let opts = EnrichmentOptions::default();
        assert!(opts.include_social_media);
        assert!(opts.include_ai_analysis);
        assert_eq!(opts.crawl_depth, 1);
    }

    #[test]
    fn tier_defaults_gate_ai_analysis_only() {
        let free = EnrichmentOptions::for_tier(SubscriptionTier::Free);
        assert!(!free.include_ai_analysis);
        assert!(free.include_social_media);
        assert_eq!(free.crawl_depth, 1);

        assert!(EnrichmentOptions::for_tier(SubscriptionTier::Trial).include_ai_analysis);
        assert!(EnrichmentOptions::for_tier(SubscriptionTier::Premium).include_ai_analysis);
    }
}
