//! Metered usage types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{SubscriptionId, UserId};

/// Unique usage record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageRecordId(pub Uuid);

impl UsageRecordId {
    /// Create a new random usage record ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UsageRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UsageRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Countable resources subject to a plan quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// One completed clinical case
    CaseCompletion,
    /// One AI tutor request
    AiRequest,
}

impl ResourceType {
    /// Get the resource type string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaseCompletion => "case_completion",
            Self::AiRequest => "ai_request",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = ResourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "case_completion" => Ok(Self::CaseCompletion),
            "ai_request" => Ok(Self::AiRequest),
            _ => Err(ResourceParseError(s.to_string())),
        }
    }
}

/// Error parsing a resource type string
#[derive(Debug, Clone)]
pub struct ResourceParseError(pub String);

impl std::fmt::Display for ResourceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid resource type: {}", self.0)
    }
}

impl std::error::Error for ResourceParseError {}

/// One metered consumption event
///
/// Records are window-stamped at write time and never mutated, so historical
/// counts stay stable even if the subscription later changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Usage record ID
    pub id: UsageRecordId,
    /// User who consumed the resource
    pub user_id: UserId,
    /// Subscription active at write time; free users have none
    pub subscription_id: Option<SubscriptionId>,
    /// What was consumed
    pub resource: ResourceType,
    /// Units consumed (at least 1)
    pub quantity: i64,
    /// Billing window start the record was stamped with (inclusive)
    pub billing_period_start: DateTime<Utc>,
    /// Billing window end the record was stamped with (exclusive)
    pub billing_period_end: DateTime<Utc>,
    /// When the usage was recorded
    pub recorded_at: DateTime<Utc>,
    /// Opaque caller-supplied context
    pub metadata: Option<serde_json::Value>,
}

/// Usage position inside the current billing window, computed on demand
///
/// `limit == None` denotes an unlimited plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Units consumed this window
    pub used: i64,
    /// Plan quota; `None` is unlimited
    pub limit: Option<i64>,
    /// Quota left, never negative; `None` is unlimited
    pub remaining: Option<i64>,
    /// Percentage of quota consumed, rounded; 0 for unlimited
    pub percentage: u32,
    /// Whether one more unit may be consumed
    pub can_access: bool,
}

impl UsageSnapshot {
    /// Compute a snapshot from a used count and a plan quota.
    ///
    /// A zero quota denies access and reports 0% rather than dividing by zero.
    pub fn compute(used: i64, limit: Option<i64>) -> Self {
        match limit {
            None => Self {
                used,
                limit: None,
                remaining: None,
                percentage: 0,
                can_access: true,
            },
            Some(limit) => {
                let remaining = (limit - used).max(0);
                let percentage = if limit > 0 {
                    ((used as f64 / limit as f64) * 100.0).round().max(0.0) as u32
                } else {
                    0
                };
                Self {
                    used,
                    limit: Some(limit),
                    remaining: Some(remaining),
                    percentage,
                    can_access: used < limit,
                }
            }
        }
    }

    /// Snapshot for an unlimited plan; counting is skipped entirely
    pub fn unlimited() -> Self {
        Self::compute(0, None)
    }
}
