//! Merge precedence and scoring for enrichment output.
//!
//! Field precedence: enrichment output > initial input > URL-derived
//! fallback. Completeness is the filled fraction of 14 important fields;
//! confidence blends source diversity, completeness, and high-signal fields.

use rivalscout_common::normalize_domain;

use super::EnrichedCompetitor;

/// `flutterwave.com` → `Flutterwave`.
pub fn name_from_domain(url: &str) -> Option<String> {
    let domain = normalize_domain(url)?;
    let label = domain.split('.').next()?;
    if label.is_empty() {
        return None;
    }
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}

/// The ordered field set completeness is measured over.
const IMPORTANT_FIELD_COUNT: usize = 14;

pub fn compute_completeness(record: &EnrichedCompetitor) -> i32 {
    let filled = [
        !record.name.trim().is_empty(),
        !record.website.trim().is_empty(),
        is_filled(&record.description),
        is_filled(&record.tagline),
        is_filled(&record.industry),
        is_filled(&record.headquarters),
        record.founded_year.is_some(),
        is_filled(&record.funding_stage),
        record.total_funding.is_some(),
        !record.founders.is_empty(),
        !record.technologies.is_empty(),
        !record.social_links.is_empty(),
        is_filled(&record.business_model),
        is_filled(&record.target_market),
    ]
    .iter()
    .filter(|f| **f)
    .count();

    ((filled as f64 / IMPORTANT_FIELD_COUNT as f64) * 100.0).round() as i32
}

pub fn compute_confidence(record: &EnrichedCompetitor, completeness: i32) -> i32 {
    let source_score = (record.data_sources.len() as i32 * 10).min(40);
    let completeness_score = (completeness as f64 * 0.3).round() as i32;

    let mut bonus = 0;
    if !record.website.trim().is_empty() {
        bonus += 5;
    }
    if record.social_links.linkedin.is_some() {
        bonus += 10;
    }
    if is_filled(&record.funding_stage) {
        bonus += 5;
    }
    if !record.founders.is_empty() {
        bonus += 5;
    }
    if !record.technologies.is_empty() {
        bonus += 5;
    }

    (source_score + completeness_score + bonus).clamp(0, 100)
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// enrichment > initial; both trimmed-empty-is-none.
pub fn prefer(enriched: Option<String>, initial: Option<String>) -> Option<String> {
    clean(enriched).or_else(|| clean(initial))
}

pub fn prefer_vec(enriched: Vec<String>, initial: Vec<String>) -> Vec<String> {
    if enriched.is_empty() {
        initial
    } else {
        enriched
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rivalscout_common::{SocialLinks, SocialMetrics};

    fn empty_record() -> EnrichedCompetitor {
        EnrichedCompetitor {
            name: String::new(),
            website: String::new(),
            description: None,
            tagline: None,
            industry: None,
            country: None,
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
            market_positioning: None,
            growth_signals: vec![],
            risk_factors: vec![],
            metrics: SocialMetrics::default(),
            data_sources: vec![],
            data_completeness: 0,
            confidence_score: 0,
            enrichment_date: Utc::now(),
        }
    }

    #[test]
    fn domain_name_fallback() {
        assert_eq!(
            name_from_domain("https://flutterwave.com").as_deref(),
            Some("Flutterwave")
        );
        assert_eq!(
            name_from_domain("https://www.kuda.com/about").as_deref(),
            Some("Kuda")
        );
        assert_eq!(name_from_domain("not a url"), None);
    }

    #[test]
    fn completeness_counts_arrays_only_when_non_empty() {
        let mut record = empty_record();
        assert_eq!(compute_completeness(&record), 0);

        record.name = "Kuda".to_string();
        record.website = "https://kuda.com".to_string();
        record.founders = vec!["Babs Ogundeyi".to_string()];
        // 3 of 14 → 21
        assert_eq!(compute_completeness(&record), 21);

        record.technologies = vec![];
        assert_eq!(compute_completeness(&record), 21);
    }

    #[test]
    fn full_record_is_100() {
        let mut record = empty_record();
        record.name = "Kuda".to_string();
        record.website = "https://kuda.com".to_string();
        record.description = Some("A bank".to_string());
        record.tagline = Some("The money app".to_string());
        record.industry = Some("fintech".to_string());
        record.headquarters = Some("Lagos".to_string());
        record.founded_year = Some(2019);
        record.funding_stage = Some("Series B".to_string());
        record.total_funding = Some(90_000_000);
        record.founders = vec!["Babs Ogundeyi".to_string()];
        record.technologies = vec!["AWS".to_string()];
        record.social_links.linkedin = Some("https://linkedin.com/company/kuda".to_string());
        record.business_model = Some("B2C".to_string());
        record.target_market = Some("Consumers".to_string());
        assert_eq!(compute_completeness(&record), 100);
    }

    #[test]
    fn confidence_zero_sources_stays_low() {
        let mut record = empty_record();
        record.name = "Ghost".to_string();
        record.website = "https://ghost.com".to_string();
        let completeness = compute_completeness(&record); // 2/14 → 14
        let confidence = compute_confidence(&record, completeness);
        assert!(confidence <= 30, "zero-source confidence was {confidence}");
    }

    #[test]
    fn confidence_source_score_caps_at_40() {
        let mut record = empty_record();
        record.website = "https://x.com".to_string();
        record.data_sources = vec![
            "website".to_string(),
            "website_crawl".to_string(),
            "linkedin".to_string(),
            "twitter".to_string(),
            "facebook".to_string(),
            "ai_analysis".to_string(),
        ];
        let confidence = compute_confidence(&record, 0);
        // min(6×10, 40) + 0 + website bonus 5
        assert_eq!(confidence, 45);
    }

    #[test]
    fn confidence_is_clamped() {
        let mut record = empty_record();
        record.website = "https://x.com".to_string();
        record.social_links.linkedin = Some("l".to_string());
        record.funding_stage = Some("Series C".to_string());
        record.founders = vec!["A".to_string()];
        record.technologies = vec!["Rust".to_string()];
        record.data_sources = (0..6).map(|i| format!("s{i}")).collect();
        let confidence = compute_confidence(&record, 100);
        assert_eq!(confidence, 100);
    }

    #[test]
    fn prefer_trims_and_falls_back() {
        assert_eq!(
            prefer(Some("  ".to_string()), Some("initial".to_string())).as_deref(),
            Some("initial")
        );
        assert_eq!(
            prefer(Some("new".to_string()), Some("initial".to_string())).as_deref(),
            Some("new")
        );
        assert_eq!(prefer(None, None), None);
    }
}
