//! Relevance scoring: a deterministic integer in [0, 100] per candidate.
//!
//! Additive signals: industry match, geography match, field completeness,
//! founded recency, funding. Candidates below the configured threshold are
//! dropped; survivors keep their pipeline order.

use chrono::{Datelike, Utc};

use crate::extract::BasicCandidate;

pub const DEFAULT_RELEVANCE_THRESHOLD: i32 = 75;

#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub industries: Vec<String>,
    pub regions: Vec<String>,
    /// Reference year for founded-recency; injected so tests are stable.
    pub current_year: i32,
}

impl ScoringContext {
    pub fn new(industries: Vec<String>, regions: Vec<String>) -> Self {
        Self {
            industries,
            regions,
            current_year: Utc::now().year(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: BasicCandidate,
    pub score: i32,
}

pub struct Scorer {
    threshold: i32,
}

impl Scorer {
    pub fn new(threshold: i32) -> Self {
        Self { threshold }
    }

    /// Score a single candidate. Always in [0, 100].
    pub fn score(&self, candidate: &BasicCandidate, ctx: &ScoringContext) -> i32 {
        let mut score = 0i32;

        // Industry: any target industry substring-matches the candidate's
        if let Some(industry) = &candidate.industry {
            let industry = industry.to_lowercase();
            if ctx
                .industries
                .iter()
                .any(|t| !t.is_empty() && industry.contains(&t.to_lowercase()))
            {
                score += 30;
            }
        }

        // Geography: candidate country equals any target region code
        if let Some(country) = &candidate.country {
            if ctx.regions.iter().any(|r| r.eq_ignore_ascii_case(country)) {
                score += 25;
            }
        }

        // Completeness over the five core fields
        let fields = [
            Some(candidate.name.as_str()),
            candidate.description.as_deref(),
            Some(candidate.website.as_str()),
            candidate.business_model.as_deref(),
            candidate.value_proposition.as_deref(),
        ];
        let filled = fields
            .iter()
            .filter(|f| f.map(|s| !s.trim().is_empty()).unwrap_or(false))
            .count();
        score += ((filled as f64 / fields.len() as f64) * 20.0).round() as i32;

        // Founded recency
        if let Some(year) = candidate.founded_year {
            let age = (ctx.current_year - year).max(0);
            score += match age {
                0..=3 => 15,
                4..=5 => 10,
                6..=10 => 5,
                _ => 0,
            };
        }

        // Funding
        if let Some(funding) = candidate.total_funding {
            if funding >= 1_000_000 {
                score += 10;
            } else if funding >= 100_000 {
                score += 5;
            }
        }

        score.clamp(0, 100)
    }

    /// Score a batch and drop everything below the threshold.
    /// Insertion order is preserved.
    pub fn filter(
        &self,
        candidates: Vec<BasicCandidate>,
        ctx: &ScoringContext,
    ) -> Vec<ScoredCandidate> {
        candidates
            .into_iter()
            .map(|candidate| {
                let score = self.score(&candidate, ctx);
                ScoredCandidate { candidate, score }
            })
            .filter(|scored| scored.score >= self.threshold)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str) -> BasicCandidate {
        BasicCandidate {
            name: name.to_string(),
            website: format!("https://{}.com", name.to_lowercase()),
            description: None,
            industry: None,
            country: None,
            business_model: None,
            value_proposition: None,
            founded_year: None,
            total_funding: None,
        }
    }

    fn full_candidate(name: &str, year: i32) -> BasicCandidate {
        BasicCandidate {
            name: name.to_string(),
            website: format!("https://{}.com", name.to_lowercase()),
            description: Some("A digital bank".to_string()),
            industry: Some("fintech".to_string()),
            country: Some("NG".to_string()),
            business_model: Some("B2C".to_string()),
            value_proposition: Some("Banking without fees".to_string()),
            founded_year: Some(year),
            total_funding: Some(10_000_000),
        }
    }

    fn ctx() -> ScoringContext {
        ScoringContext {
            industries: vec!["fintech".to_string()],
            regions: vec!["NG".to_string()],
            current_year: 2026,
        }
    }

    #[test]
    fn full_match_scores_maximum() {
        let scorer = Scorer::new(DEFAULT_RELEVANCE_THRESHOLD);
        // 30 + 25 + 20 + 15 + 10 = 100
        assert_eq!(scorer.score(&full_candidate("Kuda", 2024), &ctx()), 100);
    }

    #[test]
    fn bare_candidate_scores_only_completeness() {
        let scorer = Scorer::new(DEFAULT_RELEVANCE_THRESHOLD);
        // name + website filled out of 5 fields → round(2/5 × 20) = 8
        assert_eq!(scorer.score(&candidate("Ghost"), &ctx()), 8);
    }

    #[test]
    fn industry_substring_match_is_case_insensitive() {
        let scorer = Scorer::new(0);
        let mut c = candidate("A");
        c.industry = Some("Fintech / Digital Banking".to_string());
        let score_with = scorer.score(&c, &ctx());
        c.industry = Some("Agriculture".to_string());
        let score_without = scorer.score(&c, &ctx());
        assert_eq!(score_with - score_without, 30);
    }

    #[test]
    fn geography_match_is_case_insensitive() {
        let scorer = Scorer::new(0);
        let mut c = candidate("A");
        c.country = Some("ng".to_string());
        let with = scorer.score(&c, &ctx());
        c.country = Some("KE".to_string());
        let without = scorer.score(&c, &ctx());
        assert_eq!(with - without, 25);
    }

    #[test]
    fn recency_ladder() {
        let scorer = Scorer::new(0);
        let base = scorer.score(&candidate("A"), &ctx());
        for (year, bonus) in [(2024, 15), (2021, 10), (2017, 5), (2010, 0)] {
            let mut c = candidate("A");
            c.founded_year = Some(year);
            assert_eq!(scorer.score(&c, &ctx()) - base, bonus, "year {year}");
        }
    }

    #[test]
    fn funding_ladder() {
        let scorer = Scorer::new(0);
        let base = scorer.score(&candidate("A"), &ctx());
        for (funding, bonus) in [(5_000_000i64, 10), (500_000, 5), (50_000, 0)] {
            let mut c = candidate("A");
            c.total_funding = Some(funding);
            assert_eq!(scorer.score(&c, &ctx()) - base, bonus, "funding {funding}");
        }
    }

    #[test]
    fn filter_drops_below_threshold_and_preserves_order() {
        let scorer = Scorer::new(75);
        let batch = vec![
            full_candidate("First", 2024),
            candidate("Weak"),
            full_candidate("Second", 2024),
        ];
        let kept = scorer.filter(batch, &ctx());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].candidate.name, "First");
        assert_eq!(kept[1].candidate.name, "Second");
        for scored in &kept {
            assert!((0..=100).contains(&scored.score));
        }
    }

    #[test]
    fn score_is_always_in_bounds() {
        let scorer = Scorer::new(0);
        let c = full_candidate("Max", 2026);
        let score = scorer.score(&c, &ctx());
        assert!((0..=100).contains(&score));

        // Future founded year does not push score out of bounds
        let mut future = full_candidate("Future", 2030);
        future.total_funding = Some(i64::MAX);
        let score = scorer.score(&future, &ctx());
        assert!((0..=100).contains(&score));
    }
}
