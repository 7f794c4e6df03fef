use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use rivalscout_common::{Competitor, DiscoveryRun, RunStatus, ValidationStatus};
use rivalscout_discovery::enrichment::{EnrichmentEngine, EnrichmentOptions};
use rivalscout_discovery::service::{CreateRunRequest, DiscoveryService};
use rivalscout_store::{CompetitorFilter, Store};

use crate::context::Tenant;
use crate::error::ApiError;

const RUN_LIST_LIMIT: i64 = 20;
const COMPETITOR_LIST_LIMIT: i64 = 100;
const ENRICH_CRAWL_DEPTH: u32 = 2;

pub struct AppState {
    pub store: Store,
    pub service: DiscoveryService,
    pub enricher: Option<EnrichmentEngine>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/discovery/runs", post(create_run).get(list_runs))
        .route("/discovery/runs/:id", get(get_run))
        .route("/competitors", get(list_competitors))
        .route("/competitors/:id", get(get_competitor))
        .route("/competitors/:id/validate", patch(validate_competitor))
        .route("/competitors/:id/enrich", post(enrich_competitor))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResponse {
    id: Uuid,
    project_id: Uuid,
    status: RunStatus,
    keywords: Vec<String>,
    regions: Vec<String>,
    results_count: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<ProjectSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectSummary {
    id: Uuid,
    name: String,
}

impl RunResponse {
    fn from_run(run: DiscoveryRun, project: Option<ProjectSummary>) -> Self {
        Self {
            id: run.id,
            project_id: run.project_id,
            status: run.status,
            keywords: run.keywords,
            regions: run.regions,
            results_count: run.results_count,
            error_message: run.error_message,
            created_at: run.created_at,
            completed_at: run.completed_at,
            project,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery runs
// ---------------------------------------------------------------------------

async fn create_run(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<CreateRunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = state.service.create_run(&ctx, body).await?;
    Ok(Json(RunResponse::from_run(run, None)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRunsQuery {
    project_id: Uuid,
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<Vec<RunResponse>>, ApiError> {
    let project = state
        .store
        .find_project(query.project_id)
        .await?
        .filter(|p| p.organization_id == ctx.organization_id)
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    let runs = state.store.list_runs(project.id, RUN_LIST_LIMIT).await?;
    let summary = ProjectSummary {
        id: project.id,
        name: project.name.clone(),
    };
    Ok(Json(
        runs.into_iter()
            .map(|run| {
                RunResponse::from_run(
                    run,
                    Some(ProjectSummary {
                        id: summary.id,
                        name: summary.name.clone(),
                    }),
                )
            })
            .collect(),
    ))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = state
        .store
        .get_run(id)
        .await?
        .ok_or_else(|| ApiError::not_found("run not found"))?;

    // Accessibility check: the run's project must live in the caller's org.
    let project = state
        .store
        .find_project(run.project_id)
        .await?
        .filter(|p| p.organization_id == ctx.organization_id)
        .ok_or_else(|| ApiError::not_found("run not found"))?;

    Ok(Json(RunResponse::from_run(
        run,
        Some(ProjectSummary {
            id: project.id,
            name: project.name,
        }),
    )))
}

// ---------------------------------------------------------------------------
// Competitors
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompetitorListQuery {
    region: Option<String>,
    country: Option<String>,
    industry: Option<String>,
    // Documented as snake_case; the alias keeps both spellings working.
    #[serde(alias = "validation_status")]
    validation_status: Option<String>,
    search_run_id: Option<Uuid>,
}

async fn list_competitors(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(query): Query<CompetitorListQuery>,
) -> Result<Json<Vec<Competitor>>, ApiError> {
    let validation_status = match query.validation_status.as_deref() {
        Some(raw) => Some(
            ValidationStatus::parse(raw)
                .ok_or_else(|| ApiError::bad_request("invalid validation_status"))?,
        ),
        None => None,
    };

    let filter = CompetitorFilter {
        region: query.region,
        country: query.country,
        industry: query.industry,
        validation_status,
        search_run_id: query.search_run_id,
    };
    let competitors = state
        .store
        .list_competitors(ctx.organization_id, &filter, COMPETITOR_LIST_LIMIT)
        .await?;
    Ok(Json(competitors))
}

async fn get_competitor(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Competitor>, ApiError> {
    let competitor = find_in_org(&state.store, id, ctx.organization_id).await?;
    Ok(Json(competitor))
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    status: String,
}

async fn validate_competitor(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(body): Json<ValidateBody>,
) -> Result<Json<Competitor>, ApiError> {
    let status = match ValidationStatus::parse(&body.status) {
        Some(status @ (ValidationStatus::Approved | ValidationStatus::Rejected)) => status,
        _ => return Err(ApiError::bad_request("status must be approved or rejected")),
    };

    // Scope before write.
    find_in_org(&state.store, id, ctx.organization_id).await?;

    let validator = (!ctx.user_id.is_nil()).then_some(ctx.user_id);
    state
        .store
        .update_competitor_validation(id, status, validator)
        .await?;

    let competitor = find_in_org(&state.store, id, ctx.organization_id).await?;
    Ok(Json(competitor))
}

async fn enrich_competitor(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Competitor>, ApiError> {
    let enricher = state
        .enricher
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("enrichment providers not configured"))?;

    let competitor = find_in_org(&state.store, id, ctx.organization_id).await?;
    if competitor.website.trim().is_empty() {
        return Err(ApiError::unprocessable("competitor has no website"));
    }

    let opts = EnrichmentOptions {
        include_social_media: true,
        include_ai_analysis: true,
        crawl_depth: ENRICH_CRAWL_DEPTH,
    };
    let record = enricher
        .enrich(&competitor.website, Some(&competitor), &opts)
        .await
        .map_err(|e| ApiError::internal(format!("enrichment failed: {e:#}")))?;

    state
        .store
        .update_competitor_enrichment(id, &record.to_patch())
        .await?;

    let updated = find_in_org(&state.store, id, ctx.organization_id).await?;
    Ok(Json(updated))
}

async fn find_in_org(
    store: &Store,
    id: Uuid,
    organization_id: Uuid,
) -> Result<Competitor, ApiError> {
    store
        .find_competitor(id)
        .await?
        .filter(|c| c.organization_id == organization_id)
        .ok_or_else(|| ApiError::not_found("competitor not found"))
}
