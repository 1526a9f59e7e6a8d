//! Shared test fixtures
#![allow(dead_code)]

pub mod mock_repos;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use praxis_billing_core::{BillingService, ManualClock};
use praxis_db::{PlanRow, UserRow};
use praxis_types::{PlanId, UserId};

use mock_repos::{
    MockGateway, MockPlanRepository, MockSubscriptionRepository, MockUsageRepository,
    MockUserRepository,
};

pub type TestService = BillingService<
    MockPlanRepository,
    MockSubscriptionRepository,
    MockUserRepository,
    MockUsageRepository,
>;

/// A fully wired billing service over in-memory repositories, a scripted
/// gateway, and a manually driven clock.
pub struct TestContext {
    pub service: Arc<TestService>,
    pub plans: MockPlanRepository,
    pub subs: MockSubscriptionRepository,
    pub users: MockUserRepository,
    pub usage: MockUsageRepository,
    pub gateway: Arc<MockGateway>,
    pub clock: ManualClock,
    pub user_id: UserId,
    pub free_plan: PlanId,
    pub basic_plan: PlanId,
    pub premium_plan: PlanId,
}

impl TestContext {
    /// Build a context with the clock pinned at `start` (RFC 3339).
    ///
    /// Seeds the standard catalog: free (15 cases/month), basic (7-day trial,
    /// 100 cases/month, one-off payment), premium (no trial, unlimited,
    /// recurring).
    pub fn new(start: &str) -> Self {
        let clock = ManualClock::new(start.parse().expect("valid RFC 3339 start"));

        let plans = MockPlanRepository::new();
        let free = plan_row("free", 0, 0, Some(15), &["case_library"], None);
        let basic = plan_row(
            "basic",
            9_900,
            7,
            Some(100),
            &["case_library", "case_review"],
            None,
        );
        let premium = plan_row(
            "premium",
            49_900,
            0,
            None,
            &["case_library", "case_review", "ai_tutor"],
            Some("PLN_premium_monthly"),
        );
        let (free_plan, basic_plan, premium_plan) =
            (PlanId(free.id), PlanId(basic.id), PlanId(premium.id));
        plans.insert_plan(free);
        plans.insert_plan(basic);
        plans.insert_plan(premium);

        let users = MockUserRepository::new();
        let user_id = UserId::new();
        users.insert_user(UserRow {
            id: user_id.0,
            email: "student@example.com".to_string(),
            display_name: Some("Test Student".to_string()),
            created_at: Utc::now(),
        });

        let subs = MockSubscriptionRepository::new();
        let usage = MockUsageRepository::new();
        let gateway = Arc::new(MockGateway::new());

        let service = Arc::new(BillingService::new(
            Arc::new(plans.clone()),
            Arc::new(subs.clone()),
            Arc::new(users.clone()),
            Arc::new(usage.clone()),
            gateway.clone(),
            Arc::new(clock.clone()),
        ));

        Self {
            service,
            plans,
            subs,
            users,
            usage,
            gateway,
            clock,
            user_id,
            free_plan,
            basic_plan,
            premium_plan,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use praxis_billing_core::Clock;
        self.clock.now()
    }
}

/// Build a monthly plan row
pub fn plan_row(
    name: &str,
    price_cents: i64,
    trial_days: i32,
    max_usage_per_period: Option<i64>,
    features: &[&str],
    recurring_plan_code: Option<&str>,
) -> PlanRow {
    PlanRow {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price_cents,
        currency: "zar".to_string(),
        cadence: "monthly".to_string(),
        trial_days,
        max_usage_per_period,
        features: features.iter().map(|f| f.to_string()).collect(),
        recurring_plan_code: recurring_plan_code.map(str::to_string),
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Parse an RFC 3339 timestamp, panicking on bad input
pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC 3339 timestamp")
}
