use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Tenant context
// ---------------------------------------------------------------------------

/// Subscription tier of the organization a request runs on behalf of.
/// Consulted by the pipeline to decide whether enrichment extras run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Trial,
    Premium,
}

impl SubscriptionTier {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "premium" => Self::Premium,
            "trial" => Self::Trial,
            _ => Self::Free,
        }
    }

    /// Whether AI analysis is included by default during enrichment.
    pub fn includes_ai_analysis(self) -> bool {
        matches!(self, Self::Trial | Self::Premium)
    }
}

/// Resolved per-request tenant identity, passed down explicitly.
/// The auth collaborator resolves it; no handler hard-codes ids.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub tier: SubscriptionTier,
}

// ---------------------------------------------------------------------------
// Discovery runs
// ---------------------------------------------------------------------------

/// Lifecycle state of a discovery run. Transitions are monotonically
/// forward; completed and failed runs are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Searching,
    Extracting,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Searching => "searching",
            Self::Extracting => "extracting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "searching" => Some(Self::Searching),
            "extracting" => Some(Self::Extracting),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Searching => 1,
            Self::Extracting => 2,
            Self::Completed | Self::Failed => 3,
        }
    }

    /// Forward-only transitions. A terminal run accepts nothing further.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work: one discovery invocation with its inputs, status,
/// and aggregate result count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRun {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: RunStatus,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub results_count: i32,
    pub error_message: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Project fields the pipeline reads. Project CRUD is external; this is
/// the read-side contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub industries: Vec<String>,
    pub target_regions: Vec<String>,
}

/// Queue payload for a discovery job. Everything the worker needs without
/// re-resolving the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryContext {
    pub run_id: Uuid,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub industries: Vec<String>,
    pub max_results: u32,
    pub tier: SubscriptionTier,
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// One ranked web result from a search provider. `content` is the page
/// rendered to markdown when the provider scraped it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Competitors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Profile URLs per social network. Stored as jsonb.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none()
            && self.twitter.is_none()
            && self.facebook.is_none()
            && self.instagram.is_none()
            && self.youtube.is_none()
    }

    /// Fill holes from another set without overwriting existing links.
    pub fn merge_missing_from(&mut self, other: &SocialLinks) {
        if self.linkedin.is_none() {
            self.linkedin = other.linkedin.clone();
        }
        if self.twitter.is_none() {
            self.twitter = other.twitter.clone();
        }
        if self.facebook.is_none() {
            self.facebook = other.facebook.clone();
        }
        if self.instagram.is_none() {
            self.instagram = other.instagram.clone();
        }
        if self.youtube.is_none() {
            self.youtube = other.youtube.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Swot {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

impl Swot {
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.opportunities.is_empty()
            && self.threats.is_empty()
    }
}

/// Audience metrics scraped from social profiles. Stored as jsonb.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_followers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_employees: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_followers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_followers: Option<u64>,
}

impl SocialMetrics {
    pub fn is_empty(&self) -> bool {
        self.linkedin_followers.is_none()
            && self.linkedin_employees.is_none()
            && self.twitter_followers.is_none()
            && self.facebook_likes.is_none()
            && self.facebook_followers.is_none()
    }
}

/// A persisted competitor row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub search_run_id: Option<Uuid>,
    pub name: String,
    pub website: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub tagline: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub founders: Vec<String>,
    pub funding_stage: Option<String>,
    pub total_funding: Option<i64>,
    pub investors: Vec<String>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub target_market: Option<String>,
    pub technologies: Vec<String>,
    pub social_links: SocialLinks,
    pub swot: Option<Swot>,
    pub metrics: SocialMetrics,
    pub relevance_score: Option<i32>,
    pub confidence_score: Option<i32>,
    pub data_completeness: Option<i32>,
    pub data_sources: Vec<String>,
    pub enrichment_date: Option<DateTime<Utc>>,
    pub validation_status: ValidationStatus,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a newly discovered competitor.
#[derive(Debug, Clone)]
pub struct CompetitorRecord {
    pub organization_id: Uuid,
    pub search_run_id: Uuid,
    pub name: String,
    pub website: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub founded_year: Option<i32>,
    pub total_funding: Option<i64>,
    pub relevance_score: i32,
    pub embedding: Option<Vec<f32>>,
}

/// Closed enrichment patch: only fields present here are written; the
/// adapter leaves everything else untouched and always stamps
/// `enrichment_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tagline: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub founders: Option<Vec<String>>,
    pub funding_stage: Option<String>,
    pub total_funding: Option<i64>,
    pub investors: Option<Vec<String>>,
    pub business_model: Option<String>,
    pub value_proposition: Option<String>,
    pub target_market: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub social_links: Option<SocialLinks>,
    pub swot: Option<Swot>,
    pub metrics: Option<SocialMetrics>,
    pub confidence_score: Option<i32>,
    pub data_completeness: Option<i32>,
    pub data_sources: Option<Vec<String>>,
}
