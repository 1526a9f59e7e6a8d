//! Billing service - ties together the catalog, lifecycle, meter, and gate
//!
//! The transport-independent surface the API layer calls. Every operation
//! resolves the user's [`EffectivePlan`] at most once and passes it down, so
//! the free-plan fallback cannot diverge between the meter and the gate.

use std::sync::Arc;

use tracing::instrument;

use praxis_db::{PlanRepository, SubscriptionRepository, UsageRepository, UserRepository};
use praxis_types::{
    Customer, EffectivePlan, Plan, PlanId, ResourceType, SubscriptionId, SubscriptionView,
    UsageRecord, UsageSnapshot, UserId,
};

use crate::catalog::PlanCatalog;
use crate::clock::Clock;
use crate::error::{BillingError, BillingResult};
use crate::gate;
use crate::lifecycle::SubscriptionLifecycle;
use crate::meter::UsageMeter;
use crate::provider::{external_reference, PaymentGateway};

/// A checkout handed back to the caller for redirect
///
/// `reference` is the activation attempt's external reference; gateway
/// callbacks echo it so the collaborator can reconcile them.
#[derive(Debug, Clone)]
pub struct CheckoutIntent {
    /// URL to redirect the user to
    pub redirect_url: String,
    /// External reference for this activation attempt
    pub reference: String,
}

/// Billing service
pub struct BillingService<P, S, U, M>
where
    P: PlanRepository,
    S: SubscriptionRepository,
    U: UserRepository,
    M: UsageRepository,
{
    catalog: PlanCatalog<P>,
    lifecycle: SubscriptionLifecycle<S, P>,
    meter: UsageMeter<M>,
    users: Arc<U>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
}

impl<P, S, U, M> BillingService<P, S, U, M>
where
    P: PlanRepository,
    S: SubscriptionRepository,
    U: UserRepository,
    M: UsageRepository,
{
    /// Create a new billing service
    pub fn new(
        plans: Arc<P>,
        subscriptions: Arc<S>,
        users: Arc<U>,
        usage: Arc<M>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = PlanCatalog::new(plans);
        Self {
            lifecycle: SubscriptionLifecycle::new(
                subscriptions,
                catalog.clone(),
                Arc::clone(&gateway),
                Arc::clone(&clock),
            ),
            meter: UsageMeter::new(usage, Arc::clone(&clock)),
            catalog,
            users,
            gateway,
            clock,
        }
    }

    // =========================================================================
    // Read paths
    // =========================================================================

    /// List plans open to new subscribers, cheapest first
    pub async fn list_active_plans(&self) -> BillingResult<Vec<Plan>> {
        self.catalog.active_plans().await
    }

    /// The user's current subscription, if any, as a display projection
    #[instrument(skip(self))]
    pub async fn get_current_subscription(
        &self,
        user_id: UserId,
    ) -> BillingResult<Option<SubscriptionView>> {
        let Some((sub, plan)) = self.lifecycle.current(user_id).await? else {
            return Ok(None);
        };
        Ok(Some(SubscriptionView::from_subscription(
            &sub,
            &plan,
            self.clock.now(),
        )))
    }

    /// Resolve the plan in effect for a user: their current subscription, or
    /// the free plan when they hold none
    pub async fn effective_plan(&self, user_id: UserId) -> BillingResult<EffectivePlan> {
        match self.lifecycle.current(user_id).await? {
            Some((subscription, plan)) => Ok(EffectivePlan::Subscribed { subscription, plan }),
            None => Ok(EffectivePlan::DefaultFree(self.catalog.free_plan().await?)),
        }
    }

    /// Whether the user's plan grants a feature
    #[instrument(skip(self))]
    pub async fn can_access_feature(
        &self,
        user_id: UserId,
        feature_key: &str,
    ) -> BillingResult<bool> {
        let effective = self.effective_plan(user_id).await?;
        Ok(gate::can_access_feature(&effective, feature_key))
    }

    /// Usage position for the current billing window
    #[instrument(skip(self))]
    pub async fn check_usage(
        &self,
        user_id: UserId,
        resource: ResourceType,
    ) -> BillingResult<UsageSnapshot> {
        let effective = self.effective_plan(user_id).await?;
        self.meter.snapshot(user_id, resource, &effective).await
    }

    // =========================================================================
    // Usage writes
    // =========================================================================

    /// Record consumption without checking the quota
    #[instrument(skip(self, metadata))]
    pub async fn record_usage(
        &self,
        user_id: UserId,
        resource: ResourceType,
        quantity: i64,
        metadata: Option<serde_json::Value>,
    ) -> BillingResult<UsageRecord> {
        let effective = self.effective_plan(user_id).await?;
        self.meter
            .record(user_id, resource, quantity, metadata, &effective)
            .await
    }

    /// Record consumption atomically against the quota.
    ///
    /// Fails with `LimitExceeded` when the window has no room; two concurrent
    /// calls cannot both take the last unit.
    #[instrument(skip(self, metadata))]
    pub async fn try_consume(
        &self,
        user_id: UserId,
        resource: ResourceType,
        quantity: i64,
        metadata: Option<serde_json::Value>,
    ) -> BillingResult<UsageRecord> {
        let effective = self.effective_plan(user_id).await?;
        self.meter
            .try_consume(user_id, resource, quantity, metadata, &effective)
            .await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a checkout for a plan.
    ///
    /// Fail-closed: a gateway rejection or timeout propagates and no local
    /// state is created. Activation happens later, when the collaborator
    /// confirms payment and calls [`Self::activate_subscription`].
    #[instrument(skip(self))]
    pub async fn start_subscription(
        &self,
        user_id: UserId,
        plan_id: PlanId,
    ) -> BillingResult<CheckoutIntent> {
        let user = self
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or(BillingError::UserNotFound)?;
        let plan = self.catalog.plan(plan_id).await?;

        let customer = Customer {
            user_id,
            email: user.email,
            display_name: user.display_name,
        };
        let reference = external_reference(user_id, plan_id, self.clock.now());

        let intent = if plan.is_recurring() {
            self.gateway
                .create_recurring(&plan, &customer, &reference)
                .await?
        } else {
            self.gateway
                .create_payment_intent(&plan, &customer, &reference)
                .await?
        };

        Ok(CheckoutIntent {
            redirect_url: intent.redirect_url,
            reference,
        })
    }

    /// Activate a subscription once payment is confirmed
    #[instrument(skip(self))]
    pub async fn activate_subscription(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        external_ref: Option<String>,
    ) -> BillingResult<SubscriptionView> {
        let (sub, plan) = self.lifecycle.activate(user_id, plan_id, external_ref).await?;
        Ok(SubscriptionView::from_subscription(
            &sub,
            &plan,
            self.clock.now(),
        ))
    }

    /// Cancel a subscription, at period end by default
    #[instrument(skip(self, reason))]
    pub async fn cancel_subscription(
        &self,
        id: SubscriptionId,
        at_period_end: bool,
        reason: Option<&str>,
    ) -> BillingResult<SubscriptionView> {
        let (sub, plan) = self.lifecycle.cancel(id, at_period_end, reason).await?;
        Ok(SubscriptionView::from_subscription(
            &sub,
            &plan,
            self.clock.now(),
        ))
    }

    /// Undo a scheduled cancellation before the period closes
    #[instrument(skip(self))]
    pub async fn reactivate_subscription(
        &self,
        id: SubscriptionId,
    ) -> BillingResult<SubscriptionView> {
        let (sub, plan) = self.lifecycle.reactivate(id).await?;
        Ok(SubscriptionView::from_subscription(
            &sub,
            &plan,
            self.clock.now(),
        ))
    }
}

impl<P, S, U, M> std::fmt::Debug for BillingService<P, S, U, M>
where
    P: PlanRepository,
    S: SubscriptionRepository,
    U: UserRepository,
    M: UsageRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingService").finish()
    }
}
