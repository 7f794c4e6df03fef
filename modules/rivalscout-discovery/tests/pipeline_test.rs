//! End-to-end pipeline scenarios over fixture providers and the in-memory
//! store. No network, no database.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use rivalscout_common::{DiscoveryContext, RunStatus, SearchHit, SubscriptionTier};
use rivalscout_discovery::dedup;
use rivalscout_discovery::extract::BasicCandidate;
use rivalscout_discovery::fixtures::{
    FixtureEmbedder, FixtureExtractor, FixtureSearcher, FixtureSynthesizer, MemoryStore,
    SearchBehavior,
};
use rivalscout_discovery::pipeline::{DiscoveryPipeline, PipelineDeps};
use rivalscout_discovery::traits::PipelineStore;

struct Harness {
    store: Arc<MemoryStore>,
    searcher: Arc<FixtureSearcher>,
    synthesizer: Arc<FixtureSynthesizer>,
    pipeline: DiscoveryPipeline,
    ctx: DiscoveryContext,
}

fn harness(
    behavior: SearchBehavior,
    fallback_hits: Vec<SearchHit>,
    candidates: Vec<BasicCandidate>,
    with_embedder: bool,
) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let searcher = Arc::new(FixtureSearcher::new(behavior));
    let synthesizer = Arc::new(FixtureSynthesizer::new(fallback_hits));

    let ctx = DiscoveryContext {
        run_id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        keywords: vec!["neobank".to_string()],
        regions: vec!["NG".to_string()],
        industries: vec!["fintech".to_string()],
        max_results: 10,
        tier: SubscriptionTier::Premium,
    };
    store.seed_run(ctx.run_id);

    let pipeline = DiscoveryPipeline::new(PipelineDeps {
        store: store.clone() as Arc<dyn PipelineStore>,
        primary: searcher.clone(),
        fallback: synthesizer.clone(),
        extractor: Arc::new(FixtureExtractor::new(candidates)),
        embedder: if with_embedder {
            Some(Arc::new(FixtureEmbedder))
        } else {
            None
        },
        relevance_threshold: 75,
        search_inter_call: Duration::ZERO,
        query_inter_call: Duration::ZERO,
    });

    Harness {
        store,
        searcher,
        synthesizer,
        pipeline,
        ctx,
    }
}

fn hit(url: &str, title: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        snippet: format!("{title} snippet"),
        content: Some(format!("{title} page content")),
    }
}

fn strong(name: &str, website: &str) -> BasicCandidate {
    BasicCandidate {
        name: name.to_string(),
        website: website.to_string(),
        description: Some(format!("{name} is a digital bank")),
        industry: Some("fintech".to_string()),
        country: Some("NG".to_string()),
        business_model: Some("B2C".to_string()),
        value_proposition: Some("Free banking for everyone".to_string()),
        founded_year: Some(2024),
        total_funding: Some(10_000_000),
    }
}

fn weak(name: &str, website: &str) -> BasicCandidate {
    BasicCandidate {
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

#[tokio::test]
async fn happy_path_neobank_discovery() {
    let hits = vec![
        hit("https://kuda.com", "Kuda"),
        hit("https://carbon.ng", "Carbon"),
        hit("https://fintechlist.example/top10", "Top 10 neobanks"),
        hit("https://news.example/banks", "African banking news"),
        hit("https://fairmoney.io", "FairMoney"),
    ];
    let candidates = vec![
        strong("Kuda", "https://kuda.com"),
        strong("Carbon", "https://carbon.ng"),
        strong("FairMoney", "https://fairmoney.io"),
        strong("PiggyVest", "https://piggyvest.com"),
        weak("SomeBlog", "https://someblog.example"),
        weak("Directory", "https://directory.example"),
        weak("Thin", "https://thin.example"),
    ];
    let h = harness(SearchBehavior::Hits(hits), vec![], candidates, false);

    let stats = h.pipeline.run(&h.ctx).await.unwrap();

    assert_eq!(stats.search_hits, 5);
    assert_eq!(stats.candidates_extracted, 7);
    assert_eq!(stats.candidates_scored_out, 3);
    assert_eq!(stats.competitors_inserted, 4);
    assert!(!stats.fallback_used);

    assert_eq!(h.store.run_status(h.ctx.run_id), Some(RunStatus::Completed));
    assert_eq!(h.store.run_results_count(h.ctx.run_id), Some(4));
    assert_eq!(
        h.store.run_transitions(h.ctx.run_id),
        vec![RunStatus::Searching, RunStatus::Extracting, RunStatus::Completed]
    );
    assert_eq!(h.store.competitors(h.ctx.organization_id).len(), 4);
}

#[tokio::test]
async fn credits_exhausted_engages_fallback_once() {
    let fallback_hits: Vec<SearchHit> = (0..6)
        .map(|i| hit(&format!("https://synth{i}.com"), &format!("Synth {i}")))
        .collect();
    let candidates = vec![
        strong("Synth0", "https://synth0.com"),
        strong("Synth1", "https://synth1.com"),
        strong("Synth2", "https://synth2.com"),
        weak("Synth3", "https://synth3.com"),
        weak("Synth4", "https://synth4.com"),
        weak("Synth5", "https://synth5.com"),
    ];
    let h = harness(
        SearchBehavior::InsufficientCredits,
        fallback_hits,
        candidates,
        false,
    );

    let stats = h.pipeline.run(&h.ctx).await.unwrap();

    assert!(stats.credits_exhausted);
    assert!(stats.fallback_used);
    // Credits error stops primary iteration after the first call.
    assert_eq!(h.searcher.call_count(), 1);
    assert_eq!(h.synthesizer.call_count(), 1);
    assert_eq!(stats.competitors_inserted, 3);
    assert_eq!(h.store.run_status(h.ctx.run_id), Some(RunStatus::Completed));
    assert_eq!(h.store.run_results_count(h.ctx.run_id), Some(3));
}

#[tokio::test]
async fn empty_everywhere_completes_with_zero_results() {
    let h = harness(SearchBehavior::Empty, vec![], vec![], false);

    let stats = h.pipeline.run(&h.ctx).await.unwrap();

    assert_eq!(stats.competitors_inserted, 0);
    assert!(stats.fallback_used);
    assert_eq!(h.store.run_status(h.ctx.run_id), Some(RunStatus::Completed));
    assert_eq!(h.store.run_results_count(h.ctx.run_id), Some(0));
    // No extraction phase for an empty run.
    assert_eq!(
        h.store.run_transitions(h.ctx.run_id),
        vec![RunStatus::Searching, RunStatus::Completed]
    );
    assert!(h.store.competitors(h.ctx.organization_id).is_empty());
}

#[tokio::test]
async fn existing_corpus_domains_are_skipped() {
    let hits = vec![hit("https://fintechlist.example/top20", "Top 20")];
    // 7 candidates above threshold, 3 of which the tenant already tracks.
    let candidates = vec![
        strong("Paystack", "https://paystack.com"),
        strong("Kuda", "https://kuda.com"),
        strong("Carbon", "https://carbon.ng"),
        strong("FairMoney", "https://fairmoney.io"),
        strong("PiggyVest", "https://piggyvest.com"),
        strong("Moniepoint", "https://moniepoint.com"),
        strong("OPay", "https://opay.com"),
    ];
    let h = harness(SearchBehavior::Hits(hits), vec![], candidates, false);
    h.store
        .seed_competitor(h.ctx.organization_id, "Paystack", "https://www.paystack.com");
    h.store
        .seed_competitor(h.ctx.organization_id, "Kuda", "https://kuda.com");
    h.store
        .seed_competitor(h.ctx.organization_id, "Carbon", "https://carbon.ng/");

    let stats = h.pipeline.run(&h.ctx).await.unwrap();

    assert_eq!(stats.candidates_deduplicated, 3);
    assert_eq!(stats.competitors_inserted, 4);
    assert_eq!(h.store.run_results_count(h.ctx.run_id), Some(4));
    // 3 seeded + 4 new
    assert_eq!(h.store.competitors(h.ctx.organization_id).len(), 7);
}

#[tokio::test]
async fn rerunning_same_discovery_inserts_nothing_new() {
    let hits = vec![hit("https://kuda.com", "Kuda")];
    let candidates = vec![
        strong("Kuda", "https://kuda.com"),
        strong("Carbon", "https://carbon.ng"),
    ];

    let h = harness(
        SearchBehavior::Hits(hits.clone()),
        vec![],
        candidates.clone(),
        false,
    );
    let stats = h.pipeline.run(&h.ctx).await.unwrap();
    assert_eq!(stats.competitors_inserted, 2);

    // Second run: fresh run id, identical inputs, same tenant corpus.
    let second = DiscoveryContext {
        run_id: Uuid::new_v4(),
        ..h.ctx.clone()
    };
    h.store.seed_run(second.run_id);
    let searcher = Arc::new(FixtureSearcher::new(SearchBehavior::Hits(hits)));
    let rerun = DiscoveryPipeline::new(PipelineDeps {
        store: h.store.clone() as Arc<dyn PipelineStore>,
        primary: searcher,
        fallback: Arc::new(FixtureSynthesizer::empty()),
        extractor: Arc::new(FixtureExtractor::new(candidates)),
        embedder: None,
        relevance_threshold: 75,
        search_inter_call: Duration::ZERO,
        query_inter_call: Duration::ZERO,
    });

    let stats = rerun.run(&second).await.unwrap();
    assert_eq!(stats.competitors_inserted, 0);
    assert_eq!(h.store.run_status(second.run_id), Some(RunStatus::Completed));
    assert_eq!(h.store.run_results_count(second.run_id), Some(0));
    assert_eq!(h.store.competitors(h.ctx.organization_id).len(), 2);
}

#[tokio::test]
async fn semantic_duplicates_are_dropped_by_embedding() {
    let hits = vec![hit("https://kudabank.example", "Kuda rebrand")];
    let candidate = strong("Kuda", "https://kudabank.example");
    // Seed an existing competitor under a different domain but with the
    // exact fingerprint embedding of the incoming candidate.
    let fingerprint = dedup::fingerprint(&candidate);
    let h = harness(SearchBehavior::Hits(hits), vec![], vec![candidate], true);
    h.store.seed_competitor_embedded(
        h.ctx.organization_id,
        "Kuda",
        "https://kuda.com",
        Some(FixtureEmbedder::vector_for(&fingerprint)),
    );

    let stats = h.pipeline.run(&h.ctx).await.unwrap();

    assert_eq!(stats.competitors_inserted, 0);
    assert_eq!(stats.candidates_deduplicated, 1);
    assert_eq!(h.store.run_status(h.ctx.run_id), Some(RunStatus::Completed));
}

#[tokio::test]
async fn max_results_caps_inserts() {
    let hits = vec![hit("https://list.example", "Big list")];
    let candidates: Vec<BasicCandidate> = (0..30)
        .map(|i| strong(&format!("Co{i}"), &format!("https://co{i}.com")))
        .collect();
    let mut h = harness(SearchBehavior::Hits(hits), vec![], candidates, false);
    h.ctx.max_results = 5;

    let stats = h.pipeline.run(&h.ctx).await.unwrap();
    assert_eq!(stats.competitors_inserted, 5);
    assert_eq!(h.store.run_results_count(h.ctx.run_id), Some(5));
}

#[tokio::test]
async fn unavailable_primary_goes_straight_to_fallback() {
    let fallback_hits = vec![hit("https://synth.com", "Synth")];
    let candidates = vec![strong("Synth", "https://synth.com")];

    let store = Arc::new(MemoryStore::default());
    let searcher = Arc::new(FixtureSearcher::unavailable());
    let synthesizer = Arc::new(FixtureSynthesizer::new(fallback_hits));
    let ctx = DiscoveryContext {
        run_id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        keywords: vec!["neobank".to_string()],
        regions: vec!["NG".to_string()],
        industries: vec![],
        max_results: 10,
        tier: SubscriptionTier::Free,
    };
    store.seed_run(ctx.run_id);

    let pipeline = DiscoveryPipeline::new(PipelineDeps {
        store: store.clone() as Arc<dyn PipelineStore>,
        primary: searcher.clone(),
        fallback: synthesizer.clone(),
        extractor: Arc::new(FixtureExtractor::new(candidates)),
        embedder: None,
        relevance_threshold: 75,
        search_inter_call: Duration::ZERO,
        query_inter_call: Duration::ZERO,
    });

    let stats = pipeline.run(&ctx).await.unwrap();
    assert_eq!(searcher.call_count(), 0);
    assert_eq!(synthesizer.call_count(), 1);
    assert!(stats.fallback_used);
    assert_eq!(stats.competitors_inserted, 1);
}
