//! Subscription lifecycle state machine
//!
//! States: trialing, active, expired, canceled. An absent row is the implicit
//! fifth state, "on the free plan". Trial expiry and period rollover are lazy:
//! they happen on the next read through [`SubscriptionLifecycle::effective`],
//! never from a background job. The persisted transitions are conditional
//! updates, so concurrent readers racing on the same row are harmless no-ops.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use praxis_db::{CreateSubscription, PlanRepository, SubscriptionRepository, SubscriptionRow};
use praxis_types::{Plan, PlanId, Subscription, SubscriptionId, SubscriptionStatus, UserId};

use crate::catalog::PlanCatalog;
use crate::clock::Clock;
use crate::error::{BillingError, BillingResult};
use crate::period;
use crate::provider::PaymentGateway;

/// Subscription lifecycle manager
pub struct SubscriptionLifecycle<S: SubscriptionRepository, P: PlanRepository> {
    subs: Arc<S>,
    catalog: PlanCatalog<P>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
}

impl<S: SubscriptionRepository, P: PlanRepository> SubscriptionLifecycle<S, P> {
    /// Create a new lifecycle manager
    pub fn new(
        subs: Arc<S>,
        catalog: PlanCatalog<P>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subs,
            catalog,
            gateway,
            clock,
        }
    }

    /// Activate a subscription for a user.
    ///
    /// Plans with a trial start in `trialing`, everything else starts
    /// `active`. The billing period runs from now to the cadence-derived end.
    /// A user who already holds a current subscription is rejected; callers
    /// cancel first.
    pub async fn activate(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        external_ref: Option<String>,
    ) -> BillingResult<(Subscription, Plan)> {
        let plan = self.catalog.plan(plan_id).await?;

        if let Some(existing) = self.subs.find_current_by_user_id(user_id.0).await? {
            let (existing, _) = self.effective(existing).await?;
            if existing.status.is_current() {
                return Err(BillingError::InvalidState {
                    current: existing.status,
                });
            }
        }

        let now = self.clock.now();
        let period_end = period::period_end(now, plan.cadence)
            .ok_or_else(|| BillingError::Internal("billing period overflow".into()))?;

        let (status, trial_start, trial_end) = if plan.trial_days > 0 {
            let trial_end = now + Duration::days(i64::from(plan.trial_days));
            (SubscriptionStatus::Trialing, Some(now), Some(trial_end))
        } else {
            (SubscriptionStatus::Active, None, None)
        };

        debug!(user_id = %user_id, plan = %plan.name, status = %status, "Activating subscription");

        // The repository refuses the insert when a current row exists, so two
        // concurrent activations cannot both slip past the check above.
        let row = self
            .subs
            .create(CreateSubscription {
                id: Uuid::new_v4(),
                user_id: user_id.0,
                plan_id: plan_id.0,
                status: status.as_str().to_string(),
                trial_start,
                trial_end,
                current_period_start: now,
                current_period_end: period_end,
                external_payment_ref: external_ref,
            })
            .await?;

        let Some(row) = row else {
            return match self.subs.find_current_by_user_id(user_id.0).await? {
                Some(existing) => {
                    let existing: Subscription = existing.try_into()?;
                    Err(BillingError::InvalidState {
                        current: existing.status,
                    })
                }
                None => Err(BillingError::ConcurrencyConflict),
            };
        };

        Ok((row.try_into()?, plan))
    }

    /// Resolve a row to its effective state as of now, persisting any lazy
    /// transition exactly once.
    pub async fn effective(&self, row: SubscriptionRow) -> BillingResult<(Subscription, Plan)> {
        let mut sub: Subscription = row.try_into()?;
        let plan = self.catalog.plan(sub.plan_id).await?;
        let now = self.clock.now();

        // Trial elapsed: expire before anyone sees the row. Re-running on an
        // already-expired row is a no-op at the repository.
        if sub.status == SubscriptionStatus::Trialing {
            if let Some(trial_end) = sub.trial_end {
                if now > trial_end {
                    self.subs.expire_trial(sub.id.0, now).await?;
                    sub.status = SubscriptionStatus::Expired;
                }
            }
        }

        // Period elapsed: a scheduled cancellation takes effect, otherwise
        // the window rolls forward to the one containing now. Trialing rows
        // roll too: a trial can outlast the billing cadence, and usage must
        // land in a window containing the recording instant.
        if now >= sub.current_period_end && sub.status.is_current() {
            if sub.cancel_at_period_end {
                self.subs.finish_scheduled_cancellation(sub.id.0, now).await?;
                sub.status = SubscriptionStatus::Canceled;
            } else {
                let expected_end = sub.current_period_end;
                let mut start = sub.current_period_start;
                let mut end = sub.current_period_end;
                while now >= end {
                    start = end;
                    end = period::period_end(start, plan.cadence)
                        .ok_or_else(|| BillingError::Internal("billing period overflow".into()))?;
                }
                // The roll is deterministic, so losing the conditional update
                // to a concurrent reader leaves the same values in place.
                self.subs
                    .roll_period(sub.id.0, start, end, expected_end)
                    .await?;
                sub.current_period_start = start;
                sub.current_period_end = end;
            }
        }

        Ok((sub, plan))
    }

    /// The user's current subscription, if they hold one that is still
    /// active or trialing after lazy transitions.
    pub async fn current(&self, user_id: UserId) -> BillingResult<Option<(Subscription, Plan)>> {
        let Some(row) = self.subs.find_current_by_user_id(user_id.0).await? else {
            return Ok(None);
        };

        let (sub, plan) = self.effective(row).await?;
        if sub.status.is_current() {
            Ok(Some((sub, plan)))
        } else {
            Ok(None)
        }
    }

    /// Cancel a subscription.
    ///
    /// At period end (the default posture) the status is left untouched and
    /// the subscription stays usable until the window closes; immediate
    /// cancellation is terminal. The remote gateway cancellation is
    /// best-effort: the local change always commits, and a failure is
    /// surfaced as a structured warning for drift detection.
    pub async fn cancel(
        &self,
        id: SubscriptionId,
        at_period_end: bool,
        reason: Option<&str>,
    ) -> BillingResult<(Subscription, Plan)> {
        let row = self
            .subs
            .find_by_id(id.0)
            .await?
            .ok_or(BillingError::SubscriptionNotFound)?;

        let (mut sub, plan) = self.effective(row).await?;
        if !sub.status.is_current() {
            return Err(BillingError::InvalidState {
                current: sub.status,
            });
        }

        let now = self.clock.now();
        if at_period_end {
            self.subs.schedule_cancellation(id.0, now, reason).await?;
            sub.cancel_at_period_end = true;
        } else {
            self.subs.cancel_now(id.0, now, reason).await?;
            sub.status = SubscriptionStatus::Canceled;
        }
        sub.canceled_at = Some(now);
        sub.cancel_reason = reason.map(str::to_string);

        if let Some(provider_ref) = sub.external_payment_ref.as_deref() {
            if let Err(e) = self.gateway.cancel_recurring(provider_ref).await {
                warn!(
                    subscription_id = %id,
                    provider_ref = %provider_ref,
                    error = %e,
                    "gateway cancellation failed; local cancellation committed"
                );
            }
        }

        Ok((sub, plan))
    }

    /// Undo a scheduled cancellation before the period closes.
    ///
    /// The prior status was never changed, so clearing the cancellation
    /// fields restores it. Once the period has elapsed the lazy transition
    /// has made the cancellation final and this fails.
    pub async fn reactivate(&self, id: SubscriptionId) -> BillingResult<(Subscription, Plan)> {
        let row = self
            .subs
            .find_by_id(id.0)
            .await?
            .ok_or(BillingError::SubscriptionNotFound)?;

        let (mut sub, plan) = self.effective(row).await?;
        if !sub.status.is_current() || !sub.cancel_at_period_end {
            return Err(BillingError::InvalidState {
                current: sub.status,
            });
        }

        self.subs.clear_cancellation(id.0).await?;
        sub.cancel_at_period_end = false;
        sub.canceled_at = None;
        sub.cancel_reason = None;

        Ok((sub, plan))
    }
}

impl<S: SubscriptionRepository, P: PlanRepository> std::fmt::Debug
    for SubscriptionLifecycle<S, P>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionLifecycle").finish()
    }
}
