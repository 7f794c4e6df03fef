//! Persistence adapter over the storage collaborator's Postgres schema.
//!
//! All writes are idempotent by a unique key: runs by id, competitors by the
//! `(organization_id, normalized domain)` unique index. Run status
//! transitions are enforced here — forward-only, terminal states immutable.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use rivalscout_common::{
    Competitor, CompetitorRecord, DiscoveryRun, EnrichmentPatch, ProjectProfile, RunStatus,
    SocialLinks, SocialMetrics, Swot, ValidationStatus,
};

use crate::error::{Result, StoreError};

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

/// Filters for the competitor listing. All optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct CompetitorFilter {
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub validation_status: Option<ValidationStatus>,
    pub search_run_id: Option<Uuid>,
}

/// A similarity hit from the `match_competitors` function.
#[derive(Debug, Clone, FromRow)]
pub struct CompetitorMatch {
    pub id: Uuid,
    pub name: String,
    pub website: String,
    pub similarity: f64,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Projects (read-side contract; CRUD is external)
    // -----------------------------------------------------------------------

    pub async fn find_project(&self, project_id: Uuid) -> Result<Option<ProjectProfile>> {
        let row = sqlx::query(
            "SELECT id, organization_id, name, description, keywords, industries, target_regions
             FROM projects WHERE id = $1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ProjectProfile {
            id: r.get("id"),
            organization_id: r.get("organization_id"),
            name: r.get("name"),
            description: r.get::<Option<String>, _>("description").unwrap_or_default(),
            keywords: r.get::<Option<Vec<String>>, _>("keywords").unwrap_or_default(),
            industries: r
                .get::<Option<Vec<String>>, _>("industries")
                .unwrap_or_default(),
            target_regions: r
                .get::<Option<Vec<String>>, _>("target_regions")
                .unwrap_or_default(),
        }))
    }

    // -----------------------------------------------------------------------
    // Discovery runs
    // -----------------------------------------------------------------------

    pub async fn create_run(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        keywords: &[String],
        regions: &[String],
    ) -> Result<DiscoveryRun> {
        let row = sqlx::query(
            "INSERT INTO search_runs (id, project_id, status, keywords, regions, results_count, created_by, created_at)
             VALUES ($1, $2, 'pending', $3, $4, 0, $5, now())
             RETURNING id, project_id, status, keywords, regions, results_count,
                       error_message, created_by, created_at, completed_at",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(keywords)
        .bind(regions)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let run = row_to_run(&row)?;
        info!(run_id = %run.id, project_id = %project_id, "Created discovery run");
        Ok(run)
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<Option<DiscoveryRun>> {
        let row = sqlx::query(
            "SELECT id, project_id, status, keywords, regions, results_count,
                    error_message, created_by, created_at, completed_at
             FROM search_runs WHERE id = $1",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_run(&r)).transpose()
    }

    /// Latest runs for a project, newest first.
    pub async fn list_runs(&self, project_id: Uuid, limit: i64) -> Result<Vec<DiscoveryRun>> {
        let rows = sqlx::query(
            "SELECT id, project_id, status, keywords, regions, results_count,
                    error_message, created_by, created_at, completed_at
             FROM search_runs WHERE project_id = $1
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_run).collect()
    }

    /// Transition a run's status. Forward-only: the WHERE clause names the
    /// statuses allowed to precede `status`, so a stale or backward update
    /// matches zero rows. Repeating a transition the run already made is
    /// idempotent; anything else is a `Conflict`.
    pub async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<i32>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let predecessors: Vec<String> = [
            RunStatus::Pending,
            RunStatus::Searching,
            RunStatus::Extracting,
        ]
        .iter()
        .filter(|s| s.can_transition_to(status))
        .map(|s| s.as_str().to_string())
        .collect();

        let completed_at: Option<DateTime<Utc>> = status.is_terminal().then(Utc::now);

        let updated = sqlx::query(
            "UPDATE search_runs
             SET status = $2,
                 results_count = COALESCE($3, results_count),
                 error_message = COALESCE($4, error_message),
                 completed_at = COALESCE($5, completed_at)
             WHERE id = $1 AND status = ANY($6)",
        )
        .bind(run_id)
        .bind(status.as_str())
        .bind(results_count)
        .bind(error_message)
        .bind(completed_at)
        .bind(&predecessors)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            debug!(run_id = %run_id, status = %status, "Run status updated");
            return Ok(());
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM search_runs WHERE id = $1")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?;

        match current {
            None => Err(StoreError::NotFound(format!("run {run_id}"))),
            Some(s) if s == status.as_str() => Ok(()), // idempotent repeat
            Some(s) => Err(StoreError::Conflict(format!(
                "run {run_id}: cannot transition {s} -> {status}"
            ))),
        }
    }

    // -----------------------------------------------------------------------
    // Competitors
    // -----------------------------------------------------------------------

    /// Insert competitor records, skipping any that collide with the
    /// `(organization_id, normalized domain)` unique index. Returns the ids
    /// actually inserted, in input order.
    pub async fn insert_competitors(&self, records: &[CompetitorRecord]) -> Result<Vec<Uuid>> {
        let mut inserted = Vec::new();

        for record in records {
            let embedding = record.embedding.as_ref().map(|v| Vector::from(v.clone()));
            let id: Option<Uuid> = sqlx::query_scalar(
                "INSERT INTO competitors
                    (id, organization_id, search_run_id, name, website, description,
                     industry, country, business_model, value_proposition, founded_year,
                     total_funding, relevance_score, embedding, validation_status,
                     created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                         'pending', now(), now())
                 ON CONFLICT DO NOTHING
                 RETURNING id",
            )
            .bind(Uuid::new_v4())
            .bind(record.organization_id)
            .bind(record.search_run_id)
            .bind(&record.name)
            .bind(&record.website)
            .bind(&record.description)
            .bind(&record.industry)
            .bind(&record.country)
            .bind(&record.business_model)
            .bind(&record.value_proposition)
            .bind(record.founded_year)
            .bind(record.total_funding)
            .bind(record.relevance_score)
            .bind(embedding)
            .fetch_optional(&self.pool)
            .await?;

            match id {
                Some(id) => inserted.push(id),
                None => debug!(
                    website = record.website.as_str(),
                    "Competitor already known, skipping"
                ),
            }
        }

        info!(
            attempted = records.len(),
            inserted = inserted.len(),
            "Competitor insert batch"
        );
        Ok(inserted)
    }

    pub async fn find_competitor(&self, id: Uuid) -> Result<Option<Competitor>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_competitor(&r)).transpose()
    }

    /// Filtered competitor listing, newest first.
    pub async fn list_competitors(
        &self,
        organization_id: Uuid,
        filter: &CompetitorFilter,
        limit: i64,
    ) -> Result<Vec<Competitor>> {
        let mut qb: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE organization_id = "
        ));
        qb.push_bind(organization_id);

        // `region` and `country` both compare against the country column —
        // target regions are ISO2 codes.
        if let Some(region) = filter.region.as_deref().or(filter.country.as_deref()) {
            qb.push(" AND upper(country) = upper(");
            qb.push_bind(region.to_string());
            qb.push(")");
        }
        if let Some(industry) = &filter.industry {
            qb.push(" AND industry ILIKE ");
            qb.push_bind(format!("%{industry}%"));
        }
        if let Some(status) = filter.validation_status {
            qb.push(" AND validation_status = ");
            qb.push_bind(status.as_str());
        }
        if let Some(run_id) = filter.search_run_id {
            qb.push(" AND search_run_id = ");
            qb.push_bind(run_id);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_competitor).collect()
    }

    /// All website values for an organization, for domain dedup.
    pub async fn existing_websites(&self, organization_id: Uuid) -> Result<Vec<String>> {
        let websites: Vec<String> =
            sqlx::query_scalar("SELECT website FROM competitors WHERE organization_id = $1")
                .bind(organization_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(websites)
    }

    pub async fn update_competitor_validation(
        &self,
        id: Uuid,
        status: ValidationStatus,
        validator_id: Option<Uuid>,
    ) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE competitors
             SET validation_status = $2, validated_by = $3, validated_at = now(), updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(validator_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(format!("competitor {id}")));
        }
        Ok(())
    }

    /// Merge an enrichment patch: only fields present in the patch are
    /// written; `enrichment_date` is always stamped.
    pub async fn update_competitor_enrichment(
        &self,
        id: Uuid,
        patch: &EnrichmentPatch,
    ) -> Result<()> {
        let social_links = patch
            .social_links
            .as_ref()
            .map(|v| serde_json::to_value(v).unwrap_or_default());
        let swot = patch
            .swot
            .as_ref()
            .map(|v| serde_json::to_value(v).unwrap_or_default());
        let metrics = patch
            .metrics
            .as_ref()
            .map(|v| serde_json::to_value(v).unwrap_or_default());

        let updated = sqlx::query(
            "UPDATE competitors SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                tagline = COALESCE($4, tagline),
                industry = COALESCE($5, industry),
                country = COALESCE($6, country),
                headquarters = COALESCE($7, headquarters),
                founded_year = COALESCE($8, founded_year),
                founders = COALESCE($9, founders),
                funding_stage = COALESCE($10, funding_stage),
                total_funding = COALESCE($11, total_funding),
                investors = COALESCE($12, investors),
                business_model = COALESCE($13, business_model),
                value_proposition = COALESCE($14, value_proposition),
                target_market = COALESCE($15, target_market),
                technologies = COALESCE($16, technologies),
                social_links = COALESCE($17, social_links),
                swot = COALESCE($18, swot),
                metrics = COALESCE($19, metrics),
                confidence_score = COALESCE($20, confidence_score),
                data_completeness = COALESCE($21, data_completeness),
                data_sources = COALESCE($22, data_sources),
                enrichment_date = now(),
                updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.tagline)
        .bind(&patch.industry)
        .bind(&patch.country)
        .bind(&patch.headquarters)
        .bind(patch.founded_year)
        .bind(&patch.founders)
        .bind(&patch.funding_stage)
        .bind(patch.total_funding)
        .bind(&patch.investors)
        .bind(&patch.business_model)
        .bind(&patch.value_proposition)
        .bind(&patch.target_market)
        .bind(&patch.technologies)
        .bind(social_links)
        .bind(swot)
        .bind(metrics)
        .bind(patch.confidence_score)
        .bind(patch.data_completeness)
        .bind(&patch.data_sources)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(format!("competitor {id}")));
        }
        Ok(())
    }

    /// Cosine-similarity candidates above `threshold` within an organization,
    /// via the storage collaborator's `match_competitors` function.
    pub async fn match_competitors_by_embedding(
        &self,
        organization_id: Uuid,
        embedding: &[f32],
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<CompetitorMatch>> {
        let rows = sqlx::query_as::<_, CompetitorMatch>(
            "SELECT id, name, website, similarity FROM match_competitors($1, $2, $3, $4)",
        )
        .bind(Vector::from(embedding.to_vec()))
        .bind(threshold)
        .bind(limit)
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

const COMPETITOR_COLUMNS: &str = "id, organization_id, search_run_id, name, website, description, \
    industry, country, tagline, headquarters, founded_year, founders, funding_stage, \
    total_funding, investors, business_model, value_proposition, target_market, technologies, \
    social_links, swot, metrics, relevance_score, confidence_score, data_completeness, \
    data_sources, enrichment_date, validation_status, validated_by, validated_at, \
    created_at, updated_at";

fn row_to_run(row: &PgRow) -> Result<DiscoveryRun> {
    let status_raw: String = row.get("status");
    let status = RunStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Fatal(format!("unknown run status '{status_raw}'")))?;
    Ok(DiscoveryRun {
        id: row.get("id"),
        project_id: row.get("project_id"),
        status,
        keywords: row.get::<Option<Vec<String>>, _>("keywords").unwrap_or_default(),
        regions: row.get::<Option<Vec<String>>, _>("regions").unwrap_or_default(),
        results_count: row.get("results_count"),
        error_message: row.get("error_message"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        completed_at: row.get("completed_at"),
    })
}

fn row_to_competitor(row: &PgRow) -> Result<Competitor> {
    let validation_raw: Option<String> = row.get("validation_status");
    let validation_status = validation_raw
        .as_deref()
        .and_then(ValidationStatus::parse)
        .unwrap_or(ValidationStatus::Pending);

    let social_links: SocialLinks = row
        .get::<Option<serde_json::Value>, _>("social_links")
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let swot: Option<Swot> = row
        .get::<Option<serde_json::Value>, _>("swot")
        .and_then(|v| serde_json::from_value(v).ok());
    let metrics: SocialMetrics = row
        .get::<Option<serde_json::Value>, _>("metrics")
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    Ok(Competitor {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        search_run_id: row.get("search_run_id"),
        name: row.get("name"),
        website: row.get("website"),
        description: row.get("description"),
        industry: row.get("industry"),
        country: row.get("country"),
        tagline: row.get("tagline"),
        headquarters: row.get("headquarters"),
        founded_year: row.get("founded_year"),
        founders: row.get::<Option<Vec<String>>, _>("founders").unwrap_or_default(),
        funding_stage: row.get("funding_stage"),
        total_funding: row.get("total_funding"),
        investors: row.get::<Option<Vec<String>>, _>("investors").unwrap_or_default(),
        business_model: row.get("business_model"),
        value_proposition: row.get("value_proposition"),
        target_market: row.get("target_market"),
        technologies: row
            .get::<Option<Vec<String>>, _>("technologies")
            .unwrap_or_default(),
        social_links,
        swot,
        metrics,
        relevance_score: row.get("relevance_score"),
        confidence_score: row.get("confidence_score"),
        data_completeness: row.get("data_completeness"),
        data_sources: row
            .get::<Option<Vec<String>>, _>("data_sources")
            .unwrap_or_default(),
        enrichment_date: row.get("enrichment_date"),
        validation_status,
        validated_by: row.get("validated_by"),
        validated_at: row.get("validated_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
