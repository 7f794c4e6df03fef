//! Trait seam between the pipeline and the storage adapter.
//!
//! The pipeline depends on this trait, not on `Store` directly, so tests run
//! against an in-memory store: no network, no database.

use async_trait::async_trait;
use uuid::Uuid;

use rivalscout_common::{CompetitorRecord, ProjectProfile, RunStatus};
use rivalscout_store::{CompetitorMatch, Result as StoreResult, Store};

#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<ProjectProfile>>;

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<i32>,
        error_message: Option<&str>,
    ) -> StoreResult<()>;

    async fn insert_competitors(&self, records: &[CompetitorRecord]) -> StoreResult<Vec<Uuid>>;

    async fn existing_websites(&self, organization_id: Uuid) -> StoreResult<Vec<String>>;

    async fn match_by_embedding(
        &self,
        organization_id: Uuid,
        embedding: &[f32],
        threshold: f64,
        limit: i64,
    ) -> StoreResult<Vec<CompetitorMatch>>;
}

#[async_trait]
impl PipelineStore for Store {
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<ProjectProfile>> {
        Store::find_project(self, project_id).await
    }

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<i32>,
        error_message: Option<&str>,
    ) -> StoreResult<()> {
        Store::update_run_status(self, run_id, status, results_count, error_message).await
    }

    async fn insert_competitors(&self, records: &[CompetitorRecord]) -> StoreResult<Vec<Uuid>> {
        Store::insert_competitors(self, records).await
    }

    async fn existing_websites(&self, organization_id: Uuid) -> StoreResult<Vec<String>> {
        Store::existing_websites(self, organization_id).await
    }

    async fn match_by_embedding(
        &self,
        organization_id: Uuid,
        embedding: &[f32],
        threshold: f64,
        limit: i64,
    ) -> StoreResult<Vec<CompetitorMatch>> {
        Store::match_competitors_by_embedding(self, organization_id, embedding, threshold, limit)
            .await
    }
}
