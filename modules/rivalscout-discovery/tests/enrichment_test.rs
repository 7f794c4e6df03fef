//! Enrichment engine scenarios over the fixture fetcher and analyst.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use rivalscout_common::{
    Competitor, SocialLinks, SocialMetrics, ValidationStatus,
};
use rivalscout_discovery::enrichment::analysis::{AnalysisSwot, CompetitorAnalysis};
use rivalscout_discovery::enrichment::{EnrichmentEngine, EnrichmentOptions};
use rivalscout_discovery::fixtures::{FixtureAnalyst, FixtureFetcher};

fn initial_competitor(name: &str, website: &str) -> Competitor {
    Competitor {
        id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        search_run_id: None,
        name: name.to_string(),
        website: website.to_string(),
        description: None,
        industry: None,
        country: None,
        tagline: None,
        headquarters: None,
        founded_year: None,
        founders: vec![],
        funding_stage: None,
        total_funding: None,
        investors: vec![],
        business_model: None,
        value_proposition: None,
        target_market: None,
        technologies: vec![],
        social_links: SocialLinks::default(),
        swot: None,
        metrics: SocialMetrics::default(),
        relevance_score: None,
        confidence_score: None,
        data_completeness: None,
        data_sources: vec![],
        enrichment_date: None,
        validation_status: ValidationStatus::Pending,
        validated_by: None,
        validated_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn full_analysis() -> CompetitorAnalysis {
    CompetitorAnalysis {
        competitive_analysis: AnalysisSwot {
            strengths: vec!["Pan-African payment rails".to_string()],
            weaknesses: vec!["Regulatory exposure".to_string()],
            opportunities: vec!["SME banking".to_string()],
            threats: vec!["Global PSP entrants".to_string()],
        },
        market_positioning: Some("Leading African payments infrastructure".to_string()),
        growth_signals: vec!["Expanding into East Africa".to_string()],
        risk_factors: vec!["FX volatility".to_string()],
    }
}

#[tokio::test]
async fn full_enrichment_with_crawl_social_and_analysis() {
    let url = "https://flutterwave.com";
    let fetcher = FixtureFetcher::default()
        .with_page(
            url,
            "Flutterwave powers payments across Africa.\n\
             Follow us: https://www.linkedin.com/company/flutterwave \
             and https://twitter.com/theflutterwave",
        )
        .with_page("https://flutterwave.com/about", "About Flutterwave: founded in Lagos.")
        .with_page("https://flutterwave.com/team", "Our leadership team.")
        .with_page(
            "https://www.linkedin.com/company/flutterwave",
            "Flutterwave | 48,000 followers on LinkedIn · 450 employees",
        )
        .with_page("https://twitter.com/theflutterwave", "1,204 Following 32.5K Followers")
        .with_extraction(serde_json::json!({
            "name": "Flutterwave",
            "description": "Payment infrastructure for global merchants",
            "tagline": "Endless possibilities for every business",
            "industry": "fintech",
            "country": "Nigeria",
            "headquarters": "Lagos, Nigeria",
            "founded_year": 2016,
            "founders": ["Olugbenga Agboola", "Iyinoluwa Aboyeji"],
            "funding_stage": "Series D",
            "total_funding": "$475M",
            "investors": ["Tiger Global"],
            "business_model": "B2B",
            "value_proposition": "One API for payments across Africa",
            "target_market": "Merchants and enterprises",
            "technologies": ["API", "Cloud"]
        }));

    let engine = EnrichmentEngine::new(
        Arc::new(fetcher),
        Some(Arc::new(FixtureAnalyst::new(full_analysis()))),
    );

    let opts = EnrichmentOptions {
        include_social_media: true,
        include_ai_analysis: true,
        crawl_depth: 2,
    };
    let record = engine.enrich(url, None, &opts).await.unwrap();

    assert_eq!(record.name, "Flutterwave");
    assert_eq!(record.country.as_deref(), Some("NG"));
    assert_eq!(record.total_funding, Some(475_000_000));
    assert_eq!(record.metrics.linkedin_followers, Some(48_000));
    assert_eq!(record.metrics.linkedin_employees, Some(450));
    assert_eq!(record.metrics.twitter_followers, Some(32_500));

    let sources: std::collections::HashSet<&str> =
        record.data_sources.iter().map(|s| s.as_str()).collect();
    assert_eq!(
        sources,
        ["website", "website_crawl", "linkedin", "twitter", "ai_analysis"]
            .into_iter()
            .collect()
    );

    assert!(record.data_completeness >= 70, "completeness {}", record.data_completeness);
    assert!(record.confidence_score >= 80, "confidence {}", record.confidence_score);

    let swot = record.swot.expect("swot");
    assert_eq!(swot.strengths, vec!["Pan-African payment rails".to_string()]);
    assert_eq!(
        record.market_positioning.as_deref(),
        Some("Leading African payments infrastructure")
    );

    // Regex-derived links won over (absent) model output.
    assert_eq!(
        record.social_links.linkedin.as_deref(),
        Some("https://www.linkedin.com/company/flutterwave")
    );
}

#[tokio::test]
async fn total_scrape_failure_returns_initial_data_with_low_confidence() {
    let url = "https://ghost.example";
    let engine = EnrichmentEngine::new(Arc::new(FixtureFetcher::default()), None);

    let initial = initial_competitor("Ghost", url);
    let opts = EnrichmentOptions {
        include_social_media: true,
        include_ai_analysis: false,
        crawl_depth: 1,
    };
    let record = engine.enrich(url, Some(&initial), &opts).await.unwrap();

    assert_eq!(record.name, "Ghost");
    assert!(record.data_sources.is_empty(), "sources: {:?}", record.data_sources);
    assert!(record.confidence_score <= 30, "confidence {}", record.confidence_score);

    // Synthesized guesses are present but unverified: no matching source.
    assert_eq!(
        record.social_links.linkedin.as_deref(),
        Some("https://linkedin.com/company/ghost")
    );
    assert!(!record.data_sources.iter().any(|s| s == "linkedin"));
}

#[tokio::test]
async fn analysis_failure_substitutes_deterministic_fallback() {
    let url = "https://kuda.com";
    let fetcher = FixtureFetcher::default()
        .with_page(url, "Kuda, the money app for Africans.")
        .with_extraction(serde_json::json!({
            "name": "Kuda",
            "industry": "fintech",
            "country": "NG",
            "founded_year": 2019,
            "total_funding": "$90M"
        }));

    let engine = EnrichmentEngine::new(
        Arc::new(fetcher),
        Some(Arc::new(FixtureAnalyst::failing())),
    );

    let record = engine
        .enrich(url, None, &EnrichmentOptions::default())
        .await
        .unwrap();

    // Fallback analysis fills the SWOT but does not count as an AI source.
    let swot = record.swot.expect("fallback swot");
    assert!(!swot.strengths.is_empty());
    assert!(!record.data_sources.iter().any(|s| s == "ai_analysis"));
    assert!(record.data_sources.iter().any(|s| s == "website"));
}

#[tokio::test]
async fn name_falls_back_to_domain_when_nothing_known() {
    let url = "https://flutterwave.com";
    let fetcher = FixtureFetcher::default().with_page(url, "a page with no useful data");
    let engine = EnrichmentEngine::new(Arc::new(fetcher), None);

    let opts = EnrichmentOptions {
        include_social_media: false,
        include_ai_analysis: false,
        crawl_depth: 1,
    };
    let record = engine.enrich(url, None, &opts).await.unwrap();
    assert_eq!(record.name, "Flutterwave");
    // Page content counted as website data even though extraction failed.
    assert_eq!(record.data_sources, vec!["website".to_string()]);
}
