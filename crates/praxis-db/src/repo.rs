//! Repository traits
//!
//! Define async repository interfaces for database operations. State-machine
//! transitions that must be safe under concurrent readers (trial expiry,
//! period rollover) are expressed as conditional updates returning whether the
//! row actually changed, so a duplicate write is a harmless no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Find a plan by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>>;

    /// Find the active plan with the given name
    async fn find_active_by_name(&self, name: &str) -> DbResult<Option<PlanRow>>;

    /// List active plans ordered by ascending price
    async fn list_active(&self) -> DbResult<Vec<PlanRow>>;
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the current (active or trialing) subscription for a user
    async fn find_current_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Create a new subscription, unless the user already holds a current one.
    ///
    /// The existence check and the insert are one atomic unit (backed by a
    /// partial unique index on `user_id` over current rows), so two
    /// concurrent creates for the same user cannot both succeed. Returns
    /// `None` when a current row already exists.
    async fn create(&self, sub: CreateSubscription) -> DbResult<Option<SubscriptionRow>>;

    /// Expire a trial whose end has passed.
    ///
    /// Conditional update: only rows still `trialing` with `trial_end < now`
    /// change. Returns whether the transition happened in this call.
    async fn expire_trial(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<bool>;

    /// Roll the billing period forward.
    ///
    /// Conditional on `current_period_end` still being `expected_end`, so two
    /// concurrent readers advance the window once. Returns whether this call
    /// performed the roll.
    async fn roll_period(
        &self,
        id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        expected_end: DateTime<Utc>,
    ) -> DbResult<bool>;

    /// Finish a subscription scheduled to cancel, once its period has elapsed.
    ///
    /// Conditional update: only rows with `cancel_at_period_end` and
    /// `current_period_end <= now` flip to canceled.
    async fn finish_scheduled_cancellation(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<bool>;

    /// Schedule cancellation at period end; status is left unchanged
    async fn schedule_cancellation(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> DbResult<()>;

    /// Cancel immediately
    async fn cancel_now(&self, id: Uuid, at: DateTime<Utc>, reason: Option<&str>) -> DbResult<()>;

    /// Clear a scheduled cancellation (reactivate)
    async fn clear_cancellation(&self, id: Uuid) -> DbResult<()>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub external_payment_ref: Option<String>,
}

/// Usage repository trait
///
/// Usage records are append-only; nothing here mutates or deletes them.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Insert a usage record without checking any quota
    async fn insert(&self, rec: CreateUsageRecord) -> DbResult<UsageRecordRow>;

    /// Insert a usage record only if the window total stays within `limit`.
    ///
    /// Check and insert are one atomic unit; two concurrent calls for the
    /// same user, resource, and window must not both succeed on the last unit
    /// of quota. Returns `None` when the quota would be exceeded.
    async fn insert_if_under_limit(
        &self,
        rec: CreateUsageRecord,
        limit: i64,
    ) -> DbResult<Option<UsageRecordRow>>;

    /// Sum quantities for records whose stamped window contains `at`
    async fn total_at(&self, user_id: Uuid, resource: &str, at: DateTime<Utc>) -> DbResult<i64>;
}

/// Create usage record input
#[derive(Debug, Clone)]
pub struct CreateUsageRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub resource: String,
    pub quantity: i64,
    pub billing_period_start: DateTime<Utc>,
    pub billing_period_end: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}
