//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use praxis_billing_core::{BillingError, PaymentGateway, PaymentIntent};
use praxis_db::{
    CreateSubscription, CreateUsageRecord, DbResult, PlanRepository, PlanRow,
    SubscriptionRepository, SubscriptionRow, UsageRecordRow, UsageRepository, UserRepository,
    UserRow,
};
use praxis_types::{Customer, Plan};

/// In-memory plan repository for testing
#[derive(Default, Clone)]
pub struct MockPlanRepository {
    plans: Arc<DashMap<Uuid, PlanRow>>,
}

impl MockPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a plan directly
    pub fn insert_plan(&self, plan: PlanRow) {
        self.plans.insert(plan.id, plan);
    }
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }

    async fn find_active_by_name(&self, name: &str) -> DbResult<Option<PlanRow>> {
        Ok(self
            .plans
            .iter()
            .find(|r| r.value().name == name && r.value().is_active)
            .map(|r| r.value().clone()))
    }

    async fn list_active(&self) -> DbResult<Vec<PlanRow>> {
        let mut plans: Vec<PlanRow> = self
            .plans
            .iter()
            .filter(|r| r.value().is_active)
            .map(|r| r.value().clone())
            .collect();
        plans.sort_by_key(|p| p.price_cents);
        Ok(plans)
    }
}

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }
}

/// In-memory subscription repository for testing
///
/// Conditional transitions mirror the SQL semantics and count how many calls
/// actually changed a row, so tests can assert exactly-once persistence.
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subs: Arc<DashMap<Uuid, SubscriptionRow>>,
    create_gate: Arc<Mutex<()>>,
    expire_writes: Arc<AtomicUsize>,
    roll_writes: Arc<AtomicUsize>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many `expire_trial` calls actually transitioned a row
    pub fn expire_write_count(&self) -> usize {
        self.expire_writes.load(Ordering::SeqCst)
    }

    /// How many `roll_period` calls actually advanced a window
    pub fn roll_write_count(&self) -> usize {
        self.roll_writes.load(Ordering::SeqCst)
    }

    /// Fetch a row directly, bypassing lazy transitions
    pub fn raw(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subs.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subs.get(&id).map(|r| r.value().clone()))
    }

    async fn find_current_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let mut current: Vec<SubscriptionRow> = self
            .subs
            .iter()
            .filter(|r| {
                r.value().user_id == user_id
                    && matches!(r.value().status.as_str(), "active" | "trialing")
            })
            .map(|r| r.value().clone())
            .collect();
        current.sort_by_key(|s| s.created_at);
        Ok(current.pop())
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<Option<SubscriptionRow>> {
        // Mirrors the partial-unique-index guard: check and insert under one
        // lock so concurrent creates cannot both succeed.
        let _gate = self
            .create_gate
            .lock()
            .map_err(|_| praxis_db::DbError::NotFound)?;
        let has_current = self.subs.iter().any(|r| {
            r.value().user_id == sub.user_id
                && matches!(r.value().status.as_str(), "active" | "trialing")
        });
        if has_current {
            return Ok(None);
        }

        let now = Utc::now();
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            plan_id: sub.plan_id,
            status: sub.status,
            trial_start: sub.trial_start,
            trial_end: sub.trial_end,
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: false,
            canceled_at: None,
            cancel_reason: None,
            external_payment_ref: sub.external_payment_ref,
            created_at: now,
            updated_at: now,
        };
        self.subs.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn expire_trial(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<bool> {
        if let Some(mut row) = self.subs.get_mut(&id) {
            if row.status == "trialing" && row.trial_end.is_some_and(|end| end < now) {
                row.status = "expired".to_string();
                row.updated_at = now;
                self.expire_writes.fetch_add(1, Ordering::SeqCst);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn roll_period(
        &self,
        id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        expected_end: DateTime<Utc>,
    ) -> DbResult<bool> {
        if let Some(mut row) = self.subs.get_mut(&id) {
            if row.current_period_end == expected_end {
                row.current_period_start = new_start;
                row.current_period_end = new_end;
                self.roll_writes.fetch_add(1, Ordering::SeqCst);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn finish_scheduled_cancellation(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<bool> {
        if let Some(mut row) = self.subs.get_mut(&id) {
            if row.cancel_at_period_end
                && row.current_period_end <= now
                && matches!(row.status.as_str(), "active" | "trialing")
            {
                row.status = "canceled".to_string();
                row.updated_at = now;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn schedule_cancellation(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> DbResult<()> {
        if let Some(mut row) = self.subs.get_mut(&id) {
            row.cancel_at_period_end = true;
            row.canceled_at = Some(at);
            row.cancel_reason = reason.map(str::to_string);
            row.updated_at = at;
        }
        Ok(())
    }

    async fn cancel_now(&self, id: Uuid, at: DateTime<Utc>, reason: Option<&str>) -> DbResult<()> {
        if let Some(mut row) = self.subs.get_mut(&id) {
            row.status = "canceled".to_string();
            row.canceled_at = Some(at);
            row.cancel_reason = reason.map(str::to_string);
            row.updated_at = at;
        }
        Ok(())
    }

    async fn clear_cancellation(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut row) = self.subs.get_mut(&id) {
            row.cancel_at_period_end = false;
            row.canceled_at = None;
            row.cancel_reason = None;
        }
        Ok(())
    }
}

/// In-memory usage repository for testing
///
/// A single mutex around the record list makes `insert_if_under_limit`
/// genuinely atomic, which the concurrency tests rely on.
#[derive(Default, Clone)]
pub struct MockUsageRepository {
    records: Arc<Mutex<Vec<UsageRecordRow>>>,
}

impl MockUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records
    pub fn record_count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn make_row(rec: CreateUsageRecord) -> UsageRecordRow {
        UsageRecordRow {
            id: rec.id,
            user_id: rec.user_id,
            subscription_id: rec.subscription_id,
            resource: rec.resource,
            quantity: rec.quantity,
            billing_period_start: rec.billing_period_start,
            billing_period_end: rec.billing_period_end,
            recorded_at: rec.recorded_at,
            metadata: rec.metadata,
        }
    }

    fn total_locked(
        records: &[UsageRecordRow],
        user_id: Uuid,
        resource: &str,
        at: DateTime<Utc>,
    ) -> i64 {
        records
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && r.resource == resource
                    && r.billing_period_start <= at
                    && at < r.billing_period_end
            })
            .map(|r| r.quantity)
            .sum()
    }
}

#[async_trait]
impl UsageRepository for MockUsageRepository {
    async fn insert(&self, rec: CreateUsageRecord) -> DbResult<UsageRecordRow> {
        let row = Self::make_row(rec);
        self.records
            .lock()
            .map_err(|_| praxis_db::DbError::NotFound)?
            .push(row.clone());
        Ok(row)
    }

    async fn insert_if_under_limit(
        &self,
        rec: CreateUsageRecord,
        limit: i64,
    ) -> DbResult<Option<UsageRecordRow>> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| praxis_db::DbError::NotFound)?;
        let used = Self::total_locked(&records, rec.user_id, &rec.resource, rec.recorded_at);
        if used + rec.quantity > limit {
            return Ok(None);
        }
        let row = Self::make_row(rec);
        records.push(row.clone());
        Ok(Some(row))
    }

    async fn total_at(&self, user_id: Uuid, resource: &str, at: DateTime<Utc>) -> DbResult<i64> {
        let records = self
            .records
            .lock()
            .map_err(|_| praxis_db::DbError::NotFound)?;
        Ok(Self::total_locked(&records, user_id, resource, at))
    }
}

/// Scripted payment gateway for testing
#[derive(Default)]
pub struct MockGateway {
    cancel_calls: Mutex<Vec<String>>,
    pub fail_cancel: AtomicBool,
    pub fail_create: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider refs passed to `cancel_recurring`
    pub fn cancel_calls(&self) -> Vec<String> {
        self.cancel_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        _plan: &Plan,
        _customer: &Customer,
        reference: &str,
    ) -> Result<PaymentIntent, BillingError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BillingError::Gateway("gateway unavailable".into()));
        }
        Ok(PaymentIntent {
            redirect_url: format!("https://checkout.test/{reference}"),
            provider_ref: format!("TXN_{reference}"),
        })
    }

    async fn create_recurring(
        &self,
        _plan: &Plan,
        _customer: &Customer,
        reference: &str,
    ) -> Result<PaymentIntent, BillingError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BillingError::Gateway("gateway unavailable".into()));
        }
        Ok(PaymentIntent {
            redirect_url: format!("https://checkout.test/{reference}"),
            provider_ref: format!("RCR_{reference}"),
        })
    }

    async fn cancel_recurring(&self, provider_ref: &str) -> Result<(), BillingError> {
        if let Ok(mut calls) = self.cancel_calls.lock() {
            calls.push(provider_ref.to_string());
        }
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(BillingError::Gateway("gateway unavailable".into()));
        }
        Ok(())
    }
}
