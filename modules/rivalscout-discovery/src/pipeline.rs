//! The discovery pipeline: query build → search fan-out with fallback →
//! extraction → scoring → dedup → idempotent persistence.
//!
//! Recovery posture: everything that can be recovered in-situ is. The only
//! conditions that fail a run are fatal persistence errors, the per-job
//! wall-clock timeout (enforced by the worker), and unhandled errors.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use rivalscout_common::{
    CompetitorRecord, DiscoveryContext, ProjectProfile, RunStatus, SearchHit,
};
use rivalscout_store::StoreError;

use crate::dedup;
use crate::embedder::TextEmbedder;
use crate::extract::{CandidateExtractor, ExtractionContext};
use crate::providers::{
    dedup_hits_by_url, CandidateSynthesizer, ProviderError, SearchOptions, SearchProvider,
};
use crate::query;
use crate::score::{Scorer, ScoringContext};
use crate::traits::PipelineStore;

/// Retries for a single transient provider or persistence call.
const TRANSIENT_RETRIES: u32 = 2;
/// Candidates the fallback provider is asked for.
const FALLBACK_LIMIT: usize = 10;

pub struct PipelineDeps {
    pub store: Arc<dyn PipelineStore>,
    pub primary: Arc<dyn SearchProvider>,
    pub fallback: Arc<dyn CandidateSynthesizer>,
    pub extractor: Arc<dyn CandidateExtractor>,
    pub embedder: Option<Arc<dyn TextEmbedder>>,
    pub relevance_threshold: i32,
    /// Delay between consecutive provider calls.
    pub search_inter_call: Duration,
    /// Delay between query iterations.
    pub query_inter_call: Duration,
}

/// Stats from one discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryStats {
    pub queries_issued: u32,
    pub queries_skipped: u32,
    pub search_hits: u32,
    pub fallback_used: bool,
    pub credits_exhausted: bool,
    pub candidates_extracted: u32,
    pub candidates_scored_out: u32,
    pub candidates_deduplicated: u32,
    pub competitors_inserted: u32,
}

impl std::fmt::Display for DiscoveryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Discovery Run Complete ===")?;
        writeln!(f, "Queries issued:      {}", self.queries_issued)?;
        writeln!(f, "Queries skipped:     {}", self.queries_skipped)?;
        writeln!(f, "Search hits:         {}", self.search_hits)?;
        writeln!(f, "Fallback used:       {}", self.fallback_used)?;
        writeln!(f, "Credits exhausted:   {}", self.credits_exhausted)?;
        writeln!(f, "Candidates:          {}", self.candidates_extracted)?;
        writeln!(f, "Dropped by score:    {}", self.candidates_scored_out)?;
        writeln!(f, "Dropped as dupes:    {}", self.candidates_deduplicated)?;
        writeln!(f, "Competitors stored:  {}", self.competitors_inserted)?;
        Ok(())
    }
}

pub struct DiscoveryPipeline {
    deps: PipelineDeps,
}

impl DiscoveryPipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    /// Run one discovery job end to end, driving the run's status forward.
    pub async fn run(&self, ctx: &DiscoveryContext) -> Result<DiscoveryStats> {
        let mut stats = DiscoveryStats::default();
        let store = &*self.deps.store;

        self.update_status_with_retry(ctx.run_id, RunStatus::Searching, None, None)
            .await?;

        // The run snapshot wins over current project fields; the project
        // lookup only supplies name/description for query building.
        let project = store
            .find_project(ctx.project_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| ProjectProfile {
                id: ctx.project_id,
                organization_id: ctx.organization_id,
                name: String::new(),
                description: String::new(),
                keywords: vec![],
                industries: vec![],
                target_regions: vec![],
            });
        let profile = ProjectProfile {
            keywords: ctx.keywords.clone(),
            industries: ctx.industries.clone(),
            target_regions: ctx.regions.clone(),
            ..project
        };

        let queries = query::build(&profile);
        info!(run_id = %ctx.run_id, count = queries.len(), "Built search queries");

        let hits = self.search_phase(ctx, &queries, &mut stats).await;
        stats.search_hits = hits.len() as u32;

        if hits.is_empty() {
            // Empty search is a normal outcome, not a failure.
            info!(run_id = %ctx.run_id, "No search results, completing with zero results");
            self.update_status_with_retry(ctx.run_id, RunStatus::Completed, Some(0), None)
                .await?;
            return Ok(stats);
        }

        self.update_status_with_retry(ctx.run_id, RunStatus::Extracting, None, None)
            .await?;

        let extraction_ctx = ExtractionContext {
            keywords: ctx.keywords.clone(),
            regions: ctx.regions.clone(),
            industry: ctx.industries.first().cloned(),
        };
        let candidates = self
            .deps
            .extractor
            .extract(&hits, &extraction_ctx)
            .await
            .context("candidate extraction failed")?;
        stats.candidates_extracted = candidates.len() as u32;

        let scorer = Scorer::new(self.deps.relevance_threshold);
        let scoring_ctx = ScoringContext::new(ctx.industries.clone(), ctx.regions.clone());
        let before_scoring = candidates.len();
        let scored = scorer.filter(candidates, &scoring_ctx);
        stats.candidates_scored_out = (before_scoring - scored.len()) as u32;

        let embedder = self.deps.embedder.as_deref();
        let before_dedup = scored.len();
        let deduped = dedup::dedup(ctx.organization_id, scored, store, embedder).await?;
        stats.candidates_deduplicated = (before_dedup - deduped.len()) as u32;

        let max_results = ctx.max_results.max(1) as usize;
        let records: Vec<CompetitorRecord> = deduped
            .into_iter()
            .take(max_results)
            .map(|d| CompetitorRecord {
                organization_id: ctx.organization_id,
                search_run_id: ctx.run_id,
                name: d.scored.candidate.name,
                website: d.scored.candidate.website,
                description: d.scored.candidate.description,
                industry: d.scored.candidate.industry,
                country: d.scored.candidate.country,
                business_model: d.scored.candidate.business_model,
                value_proposition: d.scored.candidate.value_proposition,
                founded_year: d.scored.candidate.founded_year,
                total_funding: d.scored.candidate.total_funding,
                relevance_score: d.scored.score,
                embedding: d.embedding,
            })
            .collect();

        let inserted = self.insert_with_retry(&records).await?;
        stats.competitors_inserted = inserted.len() as u32;

        self.update_status_with_retry(
            ctx.run_id,
            RunStatus::Completed,
            Some(inserted.len() as i32),
            None,
        )
        .await?;

        Ok(stats)
    }

    /// Fan out over queries against the primary provider, then fall back to
    /// the AI provider when nothing came back. Dedups by URL across all
    /// providers, preserving query-issuance and provider order.
    async fn search_phase(
        &self,
        ctx: &DiscoveryContext,
        queries: &[String],
        stats: &mut DiscoveryStats,
    ) -> Vec<SearchHit> {
        let opts = SearchOptions {
            limit: ctx.max_results.clamp(1, 20) as usize,
            scrape_content: true,
        };

        let mut hits: Vec<SearchHit> = Vec::new();

        if self.deps.primary.is_available() {
            for (i, query) in queries.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.deps.query_inter_call).await;
                }
                match self.search_with_retry(query, opts).await {
                    Ok(batch) => {
                        stats.queries_issued += 1;
                        hits.extend(batch);
                    }
                    Err(ProviderError::InsufficientCredits) => {
                        warn!(run_id = %ctx.run_id, "Search credits exhausted, stopping primary fan-out");
                        stats.credits_exhausted = true;
                        stats.queries_skipped += (queries.len() - i) as u32;
                        break;
                    }
                    Err(ProviderError::Unavailable) => {
                        stats.queries_skipped += (queries.len() - i) as u32;
                        break;
                    }
                    Err(e) => {
                        warn!(query = query.as_str(), error = %e, "Query failed, skipping");
                        stats.queries_skipped += 1;
                    }
                }
            }
        } else {
            stats.queries_skipped = queries.len() as u32;
        }

        if hits.is_empty() {
            info!(run_id = %ctx.run_id, "Primary search empty, invoking AI fallback");
            stats.fallback_used = true;
            match self
                .deps
                .fallback
                .synthesize(
                    &ctx.keywords,
                    &ctx.regions,
                    ctx.industries.first().map(|s| s.as_str()),
                    FALLBACK_LIMIT,
                )
                .await
            {
                Ok(batch) => hits.extend(batch),
                Err(e) => warn!(error = %e, "AI fallback failed"),
            }
        }

        dedup_hits_by_url(hits)
    }

    /// One provider call with bounded retries for transient errors. The
    /// fixed inter-call delay paces every attempt.
    async fn search_with_retry(
        &self,
        query: &str,
        opts: SearchOptions,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let backoff = self.deps.search_inter_call * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(backoff).await;
            } else {
                tokio::time::sleep(self.deps.search_inter_call).await;
            }

            match self.deps.primary.search(query, opts).await {
                Ok(hits) => return Ok(hits),
                Err(e) if e.is_transient() && attempt < TRANSIENT_RETRIES => {
                    warn!(query, attempt, error = %e, "Transient search error, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn update_status_with_retry(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<i32>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self
                .deps
                .store
                .update_run_status(run_id, status, results_count, error_message)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < TRANSIENT_RETRIES => {
                    warn!(run_id = %run_id, attempt, error = %e, "Transient status update, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e).context("run status update failed"),
            }
        }
    }

    async fn insert_with_retry(&self, records: &[CompetitorRecord]) -> Result<Vec<Uuid>> {
        let mut attempt = 0;
        loop {
            match self.deps.store.insert_competitors(records).await {
                Ok(ids) => return Ok(ids),
                Err(StoreError::Conflict(msg)) => {
                    // The adapter skips conflicts row-by-row; a batch-level
                    // conflict means "already known" and is not a failure.
                    warn!(msg = msg.as_str(), "Insert conflict treated as already-known");
                    return Ok(Vec::new());
                }
                Err(e) if e.is_transient() && attempt < TRANSIENT_RETRIES => {
                    warn!(attempt, error = %e, "Transient insert error, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e).context("competitor insert failed"),
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let jitter = Duration::from_millis(rand::rng().random_range(0..250));
    Duration::from_millis(500) * 2u32.saturating_pow(attempt) + jitter
}
