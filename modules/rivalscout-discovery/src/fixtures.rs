//! Test fixtures: deterministic fakes over the pipeline's trait seams.
//! No network, no database — `cargo test` in seconds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use rivalscout_common::{
    normalize_domain, CompetitorRecord, ProjectProfile, RunStatus, SearchHit,
};
use rivalscout_store::{CompetitorMatch, Result as StoreResult, StoreError};

use crate::dedup::cosine_similarity;
use crate::embedder::TextEmbedder;
use crate::enrichment::analysis::{CompetitorAnalyst, CompetitorAnalysis};
use crate::extract::{BasicCandidate, CandidateExtractor, ExtractionContext};
use crate::providers::{
    CandidateSynthesizer, PageFetcher, ProviderError, ProviderResult, SearchOptions,
    SearchProvider,
};
use crate::traits::PipelineStore;

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredCompetitor {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub search_run_id: Option<Uuid>,
    pub name: String,
    pub website: String,
    pub domain: String,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Default)]
struct RunState {
    status: RunStatus,
    results_count: i32,
    error_message: Option<String>,
    transitions: Vec<RunStatus>,
}

#[derive(Default)]
struct MemoryState {
    projects: HashMap<Uuid, ProjectProfile>,
    runs: HashMap<Uuid, RunState>,
    competitors: Vec<StoredCompetitor>,
}

/// In-memory `PipelineStore` with the same transition and uniqueness rules
/// as the Postgres adapter.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn seed_project(&self, project: ProjectProfile) {
        self.state.lock().unwrap().projects.insert(project.id, project);
    }

    pub fn seed_run(&self, run_id: Uuid) {
        self.state.lock().unwrap().runs.insert(run_id, RunState::default());
    }

    pub fn seed_competitor(&self, organization_id: Uuid, name: &str, website: &str) {
        self.seed_competitor_embedded(organization_id, name, website, None);
    }

    pub fn seed_competitor_embedded(
        &self,
        organization_id: Uuid,
        name: &str,
        website: &str,
        embedding: Option<Vec<f32>>,
    ) {
        let domain = normalize_domain(website).expect("seed website must have a domain");
        self.state.lock().unwrap().competitors.push(StoredCompetitor {
            id: Uuid::new_v4(),
            organization_id,
            search_run_id: None,
            name: name.to_string(),
            website: website.to_string(),
            domain,
            embedding,
        });
    }

    pub fn run_status(&self, run_id: Uuid) -> Option<RunStatus> {
        self.state.lock().unwrap().runs.get(&run_id).map(|r| r.status)
    }

    pub fn run_results_count(&self, run_id: Uuid) -> Option<i32> {
        self.state.lock().unwrap().runs.get(&run_id).map(|r| r.results_count)
    }

    pub fn run_error(&self, run_id: Uuid) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .runs
            .get(&run_id)
            .and_then(|r| r.error_message.clone())
    }

    pub fn run_transitions(&self, run_id: Uuid) -> Vec<RunStatus> {
        self.state
            .lock()
            .unwrap()
            .runs
            .get(&run_id)
            .map(|r| r.transitions.clone())
            .unwrap_or_default()
    }

    pub fn competitors(&self, organization_id: Uuid) -> Vec<StoredCompetitor> {
        self.state
            .lock()
            .unwrap()
            .competitors
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<ProjectProfile>> {
        Ok(self.state.lock().unwrap().projects.get(&project_id).cloned())
    }

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<i32>,
        error_message: Option<&str>,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| StoreError::NotFound(format!("run {run_id}")))?;

        if run.status == status {
            return Ok(());
        }
        if !run.status.can_transition_to(status) {
            return Err(StoreError::Conflict(format!(
                "run {run_id}: cannot transition {} -> {status}",
                run.status
            )));
        }
        run.status = status;
        run.transitions.push(status);
        if let Some(count) = results_count {
            run.results_count = count;
        }
        if let Some(message) = error_message {
            run.error_message = Some(message.to_string());
        }
        Ok(())
    }

    async fn insert_competitors(&self, records: &[CompetitorRecord]) -> StoreResult<Vec<Uuid>> {
        let mut state = self.state.lock().unwrap();
        let mut inserted = Vec::new();
        for record in records {
            let domain = match normalize_domain(&record.website) {
                Some(d) => d,
                None => continue,
            };
            let exists = state
                .competitors
                .iter()
                .any(|c| c.organization_id == record.organization_id && c.domain == domain);
            if exists {
                continue;
            }
            let id = Uuid::new_v4();
            state.competitors.push(StoredCompetitor {
                id,
                organization_id: record.organization_id,
                search_run_id: Some(record.search_run_id),
                name: record.name.clone(),
                website: record.website.clone(),
                domain,
                embedding: record.embedding.clone(),
            });
            inserted.push(id);
        }
        Ok(inserted)
    }

    async fn existing_websites(&self, organization_id: Uuid) -> StoreResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .competitors
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .map(|c| c.website.clone())
            .collect())
    }

    async fn match_by_embedding(
        &self,
        organization_id: Uuid,
        embedding: &[f32],
        threshold: f64,
        limit: i64,
    ) -> StoreResult<Vec<CompetitorMatch>> {
        let state = self.state.lock().unwrap();
        let mut matches: Vec<CompetitorMatch> = state
            .competitors
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .filter_map(|c| {
                let stored = c.embedding.as_ref()?;
                let similarity = cosine_similarity(embedding, stored);
                (similarity > threshold).then(|| CompetitorMatch {
                    id: c.id,
                    name: c.name.clone(),
                    website: c.website.clone(),
                    similarity,
                })
            })
            .collect();
        matches.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        matches.truncate(limit as usize);
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

pub enum SearchBehavior {
    /// Return these hits on the first call, nothing on later calls.
    Hits(Vec<SearchHit>),
    InsufficientCredits,
    RateLimited,
    Empty,
}

pub struct FixtureSearcher {
    behavior: SearchBehavior,
    available: bool,
    pub calls: AtomicUsize,
}

impl FixtureSearcher {
    pub fn new(behavior: SearchBehavior) -> Self {
        Self {
            behavior,
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            behavior: SearchBehavior::Empty,
            available: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for FixtureSearcher {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn search(&self, _query: &str, _opts: SearchOptions) -> ProviderResult<Vec<SearchHit>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SearchBehavior::Hits(hits) if call == 0 => Ok(hits.clone()),
            SearchBehavior::Hits(_) => Ok(Vec::new()),
            SearchBehavior::InsufficientCredits => Err(ProviderError::InsufficientCredits),
            SearchBehavior::RateLimited => Err(ProviderError::RateLimited),
            SearchBehavior::Empty => Ok(Vec::new()),
        }
    }
}

pub struct FixtureSynthesizer {
    hits: Vec<SearchHit>,
    pub calls: AtomicUsize,
}

impl FixtureSynthesizer {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateSynthesizer for FixtureSynthesizer {
    async fn synthesize(
        &self,
        _keywords: &[String],
        _regions: &[String],
        _industry: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

pub struct FixtureExtractor {
    candidates: Vec<BasicCandidate>,
}

impl FixtureExtractor {
    pub fn new(candidates: Vec<BasicCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CandidateExtractor for FixtureExtractor {
    async fn extract(
        &self,
        results: &[SearchHit],
        _ctx: &ExtractionContext,
    ) -> Result<Vec<BasicCandidate>> {
        if results.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.candidates.clone())
    }
}

// ---------------------------------------------------------------------------
// Embedder
// ---------------------------------------------------------------------------

/// Deterministic embedder: identical text always maps to the identical
/// vector, so semantic-dedup assertions are stable.
pub struct FixtureEmbedder;

impl FixtureEmbedder {
    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut accumulator = [0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            accumulator[i % 8] += byte as f32 / 255.0;
        }
        accumulator.to_vec()
    }
}

#[async_trait]
impl TextEmbedder for FixtureEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}

// ---------------------------------------------------------------------------
// Enrichment fakes
// ---------------------------------------------------------------------------

/// Serves canned markdown per URL and one structured-extraction value.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    extraction: Option<serde_json::Value>,
    pub scrape_calls: AtomicUsize,
}

impl FixtureFetcher {
    pub fn with_page(mut self, url: &str, markdown: &str) -> Self {
        self.pages.insert(url.trim_end_matches('/').to_string(), markdown.to_string());
        self
    }

    pub fn with_extraction(mut self, value: serde_json::Value) -> Self {
        self.extraction = Some(value);
        self
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn scrape(&self, url: &str) -> ProviderResult<String> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url.trim_end_matches('/')) {
            Some(content) => Ok(content.clone()),
            None => Err(ProviderError::Transport(format!("no fixture page for {url}"))),
        }
    }

    async fn extract_structured(
        &self,
        url: &str,
        _schema: &serde_json::Value,
    ) -> ProviderResult<serde_json::Value> {
        match &self.extraction {
            Some(value) => Ok(value.clone()),
            None => Err(ProviderError::Transport(format!(
                "no fixture extraction for {url}"
            ))),
        }
    }
}

pub struct FixtureAnalyst {
    analysis: Option<CompetitorAnalysis>,
}

impl FixtureAnalyst {
    pub fn new(analysis: CompetitorAnalysis) -> Self {
        Self {
            analysis: Some(analysis),
        }
    }

    pub fn failing() -> Self {
        Self { analysis: None }
    }
}

#[async_trait]
impl CompetitorAnalyst for FixtureAnalyst {
    async fn analyze(&self, _profile: &str, _context: &str) -> Result<CompetitorAnalysis> {
        match &self.analysis {
            Some(analysis) => Ok(analysis.clone()),
            None => anyhow::bail!("analysis model unavailable"),
        }
    }
}
