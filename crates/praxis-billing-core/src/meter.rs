//! Usage metering
//!
//! Counts metered consumption inside the billing window in effect and
//! enforces plan quotas. Limit checking and recording are deliberately
//! separate calls so a caller can warn before blocking; the composed
//! check-then-record path is [`UsageMeter::try_consume`], which pushes the
//! check-and-increment into one atomic repository operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use praxis_db::{CreateUsageRecord, UsageRepository};
use praxis_types::{EffectivePlan, ResourceType, UsageRecord, UsageSnapshot, UserId};

use crate::clock::Clock;
use crate::error::{BillingError, BillingResult};
use crate::period;

/// Usage meter
pub struct UsageMeter<U: UsageRepository> {
    repo: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U: UsageRepository> UsageMeter<U> {
    /// Create a new usage meter
    pub fn new(repo: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Where usage lands right now: the subscription's billing period, or the
    /// calendar month for free users without a subscription row.
    fn window_for(
        effective: &EffectivePlan,
        now: DateTime<Utc>,
    ) -> BillingResult<(DateTime<Utc>, DateTime<Utc>)> {
        match effective.subscription() {
            Some(sub) => Ok((sub.current_period_start, sub.current_period_end)),
            None => period::calendar_month_window(now)
                .ok_or_else(|| BillingError::Internal("calendar window overflow".into())),
        }
    }

    /// Usage position for the current window.
    ///
    /// Unlimited plans skip counting entirely and report zero used.
    pub async fn snapshot(
        &self,
        user_id: UserId,
        resource: ResourceType,
        effective: &EffectivePlan,
    ) -> BillingResult<UsageSnapshot> {
        let Some(limit) = effective.plan().max_usage_per_period else {
            return Ok(UsageSnapshot::unlimited());
        };

        let now = self.clock.now();
        let used = self
            .repo
            .total_at(user_id.0, resource.as_str(), now)
            .await?;

        Ok(UsageSnapshot::compute(used, Some(limit)))
    }

    /// Record consumption without checking any quota.
    ///
    /// The record is stamped with the window active at write time; historical
    /// counts stay stable if the subscription later changes.
    pub async fn record(
        &self,
        user_id: UserId,
        resource: ResourceType,
        quantity: i64,
        metadata: Option<serde_json::Value>,
        effective: &EffectivePlan,
    ) -> BillingResult<UsageRecord> {
        let rec = self.build_record(user_id, resource, quantity, metadata, effective)?;
        let row = self.repo.insert(rec).await?;
        Ok(row.try_into()?)
    }

    /// Record consumption only if the window quota has room.
    ///
    /// The quota check and the insert are one atomic repository operation, so
    /// two concurrent calls cannot both take the last unit.
    pub async fn try_consume(
        &self,
        user_id: UserId,
        resource: ResourceType,
        quantity: i64,
        metadata: Option<serde_json::Value>,
        effective: &EffectivePlan,
    ) -> BillingResult<UsageRecord> {
        let Some(limit) = effective.plan().max_usage_per_period else {
            return self
                .record(user_id, resource, quantity, metadata, effective)
                .await;
        };

        let rec = self.build_record(user_id, resource, quantity, metadata, effective)?;
        let recorded_at = rec.recorded_at;

        match self.repo.insert_if_under_limit(rec, limit).await? {
            Some(row) => Ok(row.try_into()?),
            None => {
                let used = self
                    .repo
                    .total_at(user_id.0, resource.as_str(), recorded_at)
                    .await?;
                debug!(user_id = %user_id, resource = %resource, used, limit, "Usage denied at quota");
                Err(BillingError::LimitExceeded { used, limit })
            }
        }
    }

    fn build_record(
        &self,
        user_id: UserId,
        resource: ResourceType,
        quantity: i64,
        metadata: Option<serde_json::Value>,
        effective: &EffectivePlan,
    ) -> BillingResult<CreateUsageRecord> {
        if quantity < 1 {
            return Err(BillingError::InvalidQuantity);
        }

        let now = self.clock.now();
        let (window_start, window_end) = Self::window_for(effective, now)?;

        Ok(CreateUsageRecord {
            id: Uuid::new_v4(),
            user_id: user_id.0,
            subscription_id: effective.subscription().map(|s| s.id.0),
            resource: resource.as_str().to_string(),
            quantity,
            billing_period_start: window_start,
            billing_period_end: window_end,
            recorded_at: now,
            metadata,
        })
    }
}

impl<U: UsageRepository> std::fmt::Debug for UsageMeter<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageMeter").finish()
    }
}
