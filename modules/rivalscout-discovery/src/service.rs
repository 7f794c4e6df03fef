//! Request-side discovery service: validate, verify project scope, check
//! quota, create the run, enqueue the job.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use rivalscout_common::{
    DiscoveryContext, DiscoveryRun, RequestContext, RivalScoutError,
};
use rivalscout_store::{JobQueue, Store, StoreError};

pub const DISCOVER_JOB_KIND: &str = "discover";

const DEFAULT_MAX_RESULTS: u32 = 10;
const MAX_MAX_RESULTS: u32 = 25;

/// Billing/quota collaborator contract. The default gate allows everything;
/// deployments wire the real accounting service here.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    async fn check_discovery_allowed(&self, organization_id: Uuid) -> Result<(), RivalScoutError>;
}

pub struct AllowAllQuota;

#[async_trait]
impl QuotaGate for AllowAllQuota {
    async fn check_discovery_allowed(&self, _organization_id: Uuid) -> Result<(), RivalScoutError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunRequest {
    pub project_id: Uuid,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    pub max_results: Option<u32>,
}

pub struct DiscoveryService {
    store: Store,
    queue: JobQueue,
    quota: Box<dyn QuotaGate>,
    job_max_attempts: u32,
}

impl DiscoveryService {
    pub fn new(
        store: Store,
        queue: JobQueue,
        quota: Box<dyn QuotaGate>,
        job_max_attempts: u32,
    ) -> Self {
        Self {
            store,
            queue,
            quota,
            job_max_attempts,
        }
    }

    /// Validate and create a run, then enqueue its discovery job. The run is
    /// never created when validation or scope checks fail.
    pub async fn create_run(
        &self,
        ctx: &RequestContext,
        req: CreateRunRequest,
    ) -> Result<DiscoveryRun, RivalScoutError> {
        let keywords = trimmed_non_empty(req.keywords);
        if keywords.is_empty() {
            return Err(RivalScoutError::Validation(
                "keywords must not be empty".to_string(),
            ));
        }
        let regions = trimmed_non_empty(req.regions);
        if regions.is_empty() {
            return Err(RivalScoutError::Validation(
                "regions must not be empty".to_string(),
            ));
        }
        if req.project_id.is_nil() {
            return Err(RivalScoutError::Validation("invalid project id".to_string()));
        }

        let project = self
            .store
            .find_project(req.project_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| RivalScoutError::Scope("project not found".to_string()))?;
        if project.organization_id != ctx.organization_id {
            // Same surface as a missing project; existence is not leaked
            // across tenants.
            return Err(RivalScoutError::Scope("project not found".to_string()));
        }

        self.quota.check_discovery_allowed(ctx.organization_id).await?;

        let run = self
            .store
            .create_run(project.id, ctx.user_id, &keywords, &regions)
            .await
            .map_err(store_err)?;

        let industries = if req.industries.is_empty() {
            project.industries.clone()
        } else {
            trimmed_non_empty(req.industries)
        };
        let payload = DiscoveryContext {
            run_id: run.id,
            project_id: project.id,
            organization_id: ctx.organization_id,
            user_id: ctx.user_id,
            keywords,
            regions,
            industries,
            max_results: req
                .max_results
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .clamp(1, MAX_MAX_RESULTS),
            tier: ctx.tier,
        };

        let payload_json = serde_json::to_value(&payload)
            .map_err(|e| RivalScoutError::Validation(format!("payload serialization: {e}")))?;
        let job_id = self
            .queue
            .enqueue(DISCOVER_JOB_KIND, &payload_json, self.job_max_attempts)
            .await
            .map_err(store_err)?;

        info!(run_id = %run.id, job_id = %job_id, "Discovery run queued");
        Ok(run)
    }
}

fn trimmed_non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn store_err(err: StoreError) -> RivalScoutError {
    RivalScoutError::Anyhow(anyhow::Error::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_entries_are_stripped() {
        let cleaned = trimmed_non_empty(vec![
            " fintech ".to_string(),
            "".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(cleaned, vec!["fintech".to_string()]);
    }

    #[test]
    fn create_run_request_accepts_camel_case() {
        let json = r#"{
            "projectId": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "keywords": ["neobank"],
            "regions": ["NG"],
            "maxResults": 15
        }"#;
        let req: CreateRunRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.keywords, vec!["neobank".to_string()]);
        assert_eq!(req.max_results, Some(15));
        assert!(req.industries.is_empty());
    }
}
