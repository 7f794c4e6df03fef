//! Per-request tenant context.
//!
//! The auth collaborator (out of scope here) authenticates the caller and
//! injects identity headers; `organizationId` in the query string is the
//! documented fallback for tooling. No handler hard-codes ids.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use rivalscout_common::{RequestContext, SubscriptionTier};

use crate::error::ApiError;

pub struct Tenant(pub RequestContext);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id = header_uuid(parts, "x-organization-id")
            .or_else(|| query_uuid(parts, "organizationId"))
            .ok_or_else(|| ApiError::bad_request("organizationId is required"))?;

        let user_id = header_uuid(parts, "x-user-id").unwrap_or_else(Uuid::nil);

        let tier = parts
            .headers
            .get("x-subscription-tier")
            .and_then(|v| v.to_str().ok())
            .map(SubscriptionTier::parse)
            .unwrap_or_default();

        Ok(Tenant(RequestContext {
            user_id,
            organization_id,
            tier,
        }))
    }
}

fn header_uuid(parts: &Parts, name: &str) -> Option<Uuid> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

fn query_uuid(parts: &Parts, name: &str) -> Option<Uuid> {
    let query = parts.uri.query()?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name)
            .then(|| Uuid::parse_str(value.trim()).ok())
            .flatten()
    })
}
