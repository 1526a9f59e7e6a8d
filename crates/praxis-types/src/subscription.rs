//! Subscription lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Plan, PlanId, PlanName, UserId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription status
///
/// An absent subscription row is a distinct implicit state: the user is on the
/// free plan by default. See [`EffectivePlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In trial period
    Trialing,
    /// Paid and current
    Active,
    /// Trial elapsed without conversion
    Expired,
    /// Canceled immediately, or past a scheduled cancellation
    Canceled,
}

impl SubscriptionStatus {
    /// Get the status string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
        }
    }

    /// Whether this status grants plan access
    pub const fn is_current(&self) -> bool {
        matches!(self, Self::Trialing | Self::Active)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trialing" => Ok(Self::Trialing),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "canceled" => Ok(Self::Canceled),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a subscription status string
#[derive(Debug, Clone)]
pub struct StatusParseError(pub String);

impl std::fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid subscription status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}

/// One user's relationship to a plan over time
///
/// Rows are never physically deleted; canceled and expired subscriptions are
/// retained for audit and payment reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// User who owns the subscription
    pub user_id: UserId,
    /// Plan the subscription is on
    pub plan_id: PlanId,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// Trial start; set only when the plan has a trial
    pub trial_start: Option<DateTime<Utc>>,
    /// Trial end; non-null whenever status is trialing
    pub trial_end: Option<DateTime<Utc>>,
    /// Current billing period start (inclusive)
    pub current_period_start: DateTime<Utc>,
    /// Current billing period end (exclusive)
    pub current_period_end: DateTime<Utc>,
    /// Whether the subscription ends when the current period does
    pub cancel_at_period_end: bool,
    /// When cancellation was requested
    pub canceled_at: Option<DateTime<Utc>>,
    /// Free-form cancellation reason
    pub cancel_reason: Option<String>,
    /// Opaque payment-gateway reference
    pub external_payment_ref: Option<String>,
    /// When the subscription was created
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether `at` falls inside the current billing period (half-open window)
    pub fn period_contains(&self, at: DateTime<Utc>) -> bool {
        self.current_period_start <= at && at < self.current_period_end
    }
}

/// The plan a user is effectively on, resolved once per request
///
/// Modeling the "no subscription row" case explicitly keeps the free-plan
/// fallback in one place instead of threading nullable subscriptions through
/// the meter and the feature gate.
#[derive(Debug, Clone)]
pub enum EffectivePlan {
    /// User holds a current (active or trialing) subscription
    Subscribed {
        /// The subscription row, after lazy transitions were applied
        subscription: Subscription,
        /// The plan it points at
        plan: Plan,
    },
    /// No current subscription; metered against the free plan
    DefaultFree(Plan),
}

impl EffectivePlan {
    /// The plan in effect
    pub fn plan(&self) -> &Plan {
        match self {
            Self::Subscribed { plan, .. } => plan,
            Self::DefaultFree(plan) => plan,
        }
    }

    /// The subscription, when one is current
    pub fn subscription(&self) -> Option<&Subscription> {
        match self {
            Self::Subscribed { subscription, .. } => Some(subscription),
            Self::DefaultFree(_) => None,
        }
    }
}

/// Read-only subscription projection for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionView {
    /// Subscription ID
    pub id: SubscriptionId,
    /// User who owns the subscription
    pub user_id: UserId,
    /// Plan the subscription is on
    pub plan_id: PlanId,
    /// Plan name for display
    pub plan_name: PlanName,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// Trial end, if a trial was granted
    pub trial_end: Option<DateTime<Utc>>,
    /// Whole days of trial left; `None` when not trialing
    pub days_left_in_trial: Option<i64>,
    /// Current billing period start
    pub current_period_start: DateTime<Utc>,
    /// Current billing period end
    pub current_period_end: DateTime<Utc>,
    /// Whether the subscription ends at the period boundary
    pub cancel_at_period_end: bool,
    /// When cancellation was requested
    pub canceled_at: Option<DateTime<Utc>>,
}

impl SubscriptionView {
    /// Build a view from a subscription and its plan, as of `now`
    pub fn from_subscription(sub: &Subscription, plan: &Plan, now: DateTime<Utc>) -> Self {
        let days_left_in_trial = match (sub.status, sub.trial_end) {
            (SubscriptionStatus::Trialing, Some(end)) if end > now => {
                Some((end - now).num_days())
            }
            _ => None,
        };

        Self {
            id: sub.id,
            user_id: sub.user_id,
            plan_id: sub.plan_id,
            plan_name: plan.name,
            status: sub.status,
            trial_end: sub.trial_end,
            days_left_in_trial,
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            canceled_at: sub.canceled_at,
        }
    }
}
