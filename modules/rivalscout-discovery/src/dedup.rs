//! Two-stage deduplication, plus an advisory semantic stage.
//!
//! 1. Within the batch by normalized domain — first occurrence wins.
//! 2. Against the tenant corpus by normalized domain.
//! 3. When an embedder is available: embedding similarity against the
//!    tenant's existing competitors. This stage must never block a run —
//!    any failure is logged and the candidate admitted.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use rivalscout_common::normalize_domain;

use crate::embedder::TextEmbedder;
use crate::score::ScoredCandidate;
use crate::traits::PipelineStore;

pub const SEMANTIC_DEDUP_THRESHOLD: f64 = 0.85;

/// A candidate that survived dedup, carrying its dedup key and (when the
/// semantic stage ran) the embedding to persist.
#[derive(Debug, Clone)]
pub struct DedupedCandidate {
    pub scored: ScoredCandidate,
    pub domain: String,
    pub embedding: Option<Vec<f32>>,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// Text fingerprint embedded for semantic dedup.
pub fn fingerprint(candidate: &crate::extract::BasicCandidate) -> String {
    [
        Some(candidate.name.as_str()),
        candidate.description.as_deref(),
        candidate.value_proposition.as_deref(),
        candidate.business_model.as_deref(),
        candidate.industry.as_deref(),
    ]
    .iter()
    .flatten()
    .copied()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" | ")
}

pub async fn dedup(
    organization_id: Uuid,
    scored: Vec<ScoredCandidate>,
    store: &dyn PipelineStore,
    embedder: Option<&dyn TextEmbedder>,
) -> anyhow::Result<Vec<DedupedCandidate>> {
    let input_count = scored.len();

    // Stage 1: within-batch by normalized domain, first occurrence wins.
    // Candidates with an unparseable domain cannot be keyed and are dropped.
    let mut batch_domains = HashSet::new();
    let mut survivors: Vec<(ScoredCandidate, String)> = Vec::new();
    for candidate in scored {
        match normalize_domain(&candidate.candidate.website) {
            Some(domain) => {
                if batch_domains.insert(domain.clone()) {
                    survivors.push((candidate, domain));
                }
            }
            None => warn!(
                website = candidate.candidate.website.as_str(),
                "Candidate has no parseable domain, dropping"
            ),
        }
    }

    // Stage 2: against the tenant corpus.
    let existing: HashSet<String> = store
        .existing_websites(organization_id)
        .await?
        .iter()
        .filter_map(|w| normalize_domain(w))
        .collect();
    let before_corpus = survivors.len();
    survivors.retain(|(_, domain)| !existing.contains(domain));
    let corpus_deduped = before_corpus - survivors.len();

    // Stage 3 (advisory): semantic similarity against existing competitors.
    let mut out = Vec::with_capacity(survivors.len());
    match embedder {
        Some(embedder) => {
            let texts: Vec<String> = survivors
                .iter()
                .map(|(s, _)| fingerprint(&s.candidate))
                .collect();
            match embedder.embed_batch(texts).await {
                Ok(embeddings) if embeddings.len() == survivors.len() => {
                    for ((scored, domain), embedding) in
                        survivors.into_iter().zip(embeddings.into_iter())
                    {
                        let duplicate = match store
                            .match_by_embedding(
                                organization_id,
                                &embedding,
                                SEMANTIC_DEDUP_THRESHOLD,
                                1,
                            )
                            .await
                        {
                            Ok(matches) => match matches.first() {
                                Some(hit) => {
                                    info!(
                                        candidate = scored.candidate.name.as_str(),
                                        existing = hit.name.as_str(),
                                        similarity = hit.similarity,
                                        "Semantic duplicate, skipping"
                                    );
                                    true
                                }
                                None => false,
                            },
                            Err(e) => {
                                warn!(error = %e, "Semantic dedup lookup failed, admitting candidate");
                                false
                            }
                        };
                        if !duplicate {
                            out.push(DedupedCandidate {
                                scored,
                                domain,
                                embedding: Some(embedding),
                            });
                        }
                    }
                }
                Ok(_) | Err(_) => {
                    warn!("Embedding batch failed, skipping semantic dedup");
                    out.extend(survivors.into_iter().map(|(scored, domain)| {
                        DedupedCandidate {
                            scored,
                            domain,
                            embedding: None,
                        }
                    }));
                }
            }
        }
        None => {
            out.extend(
                survivors
                    .into_iter()
                    .map(|(scored, domain)| DedupedCandidate {
                        scored,
                        domain,
                        embedding: None,
                    }),
            );
        }
    }

    info!(
        input = input_count,
        corpus_deduped,
        kept = out.len(),
        "Dedup complete"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::BasicCandidate;

    fn scored(name: &str, website: &str) -> ScoredCandidate {
        ScoredCandidate {
            candidate: BasicCandidate {
                name: name.to_string(),
                website: website.to_string(),
                description: Some("desc".to_string()),
                industry: Some("fintech".to_string()),
                country: Some("NG".to_string()),
                business_model: None,
                value_proposition: None,
                founded_year: None,
                total_funding: None,
            },
            score: 80,
        }
    }

    #[test]
    fn cosine_basics() {
        let a = vec![1.0f32, 0.0];
        let b = vec![1.0f32, 0.0];
        let c = vec![0.0f32, 1.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn fingerprint_skips_empty_fields() {
        let c = scored("Kuda", "https://kuda.com");
        let fp = fingerprint(&c.candidate);
        assert_eq!(fp, "Kuda | desc | fintech");
    }

    #[tokio::test]
    async fn within_batch_first_occurrence_wins() {
        let store = crate::fixtures::MemoryStore::default();
        let batch = vec![
            scored("Kuda", "https://kuda.com"),
            scored("Kuda clone", "https://www.kuda.com/about"),
            scored("Carbon", "https://carbon.ng"),
        ];
        let kept = dedup(Uuid::new_v4(), batch, &store, None).await.unwrap();
        let names: Vec<&str> = kept.iter().map(|d| d.scored.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["Kuda", "Carbon"]);
        assert_eq!(kept[0].domain, "kuda.com");
    }

    #[tokio::test]
    async fn corpus_domains_are_excluded() {
        let store = crate::fixtures::MemoryStore::default();
        let org = Uuid::new_v4();
        store.seed_competitor(org, "Paystack", "https://paystack.com");

        let batch = vec![
            scored("Paystack", "https://www.paystack.com"),
            scored("Carbon", "https://carbon.ng"),
        ];
        let kept = dedup(org, batch, &store, None).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].scored.candidate.name, "Carbon");
    }
}
