//! Plan catalog
//!
//! Read-only view over the plans table. The catalog is small and read-mostly,
//! so by-name lookups (the free-plan fallback sits on every request path) are
//! cached for a short TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use praxis_db::PlanRepository;
use praxis_types::{Plan, PlanId, PlanName};

use crate::error::{BillingError, BillingResult};

/// Plan catalog with cached by-name lookups
pub struct PlanCatalog<P: PlanRepository> {
    repo: Arc<P>,
    by_name: Cache<String, Plan>,
}

impl<P: PlanRepository> PlanCatalog<P> {
    /// Create a new plan catalog
    pub fn new(repo: Arc<P>) -> Self {
        Self {
            repo,
            by_name: Cache::builder()
                .time_to_live(Duration::from_secs(60))
                .max_capacity(64)
                .build(),
        }
    }

    /// List active plans, cheapest first
    pub async fn active_plans(&self) -> BillingResult<Vec<Plan>> {
        let rows = self.repo.list_active().await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(BillingError::from))
            .collect()
    }

    /// Look up a plan by ID
    pub async fn plan(&self, id: PlanId) -> BillingResult<Plan> {
        let row = self
            .repo
            .find_by_id(id.0)
            .await?
            .ok_or(BillingError::PlanNotFound)?;
        Ok(row.try_into()?)
    }

    /// Look up the active plan with the given name
    pub async fn plan_by_name(&self, name: PlanName) -> BillingResult<Plan> {
        let cache_key = name.as_str().to_string();

        if let Some(plan) = self.by_name.get(&cache_key).await {
            return Ok(plan);
        }

        let row = self
            .repo
            .find_active_by_name(name.as_str())
            .await?
            .ok_or(BillingError::PlanNotFound)?;
        let plan: Plan = row.try_into()?;

        self.by_name.insert(cache_key, plan.clone()).await;

        Ok(plan)
    }

    /// The default plan for users without a subscription row
    pub async fn free_plan(&self) -> BillingResult<Plan> {
        self.plan_by_name(PlanName::Free).await
    }

    /// Drop a cached by-name entry (call after admin edits)
    pub async fn invalidate(&self, name: PlanName) {
        self.by_name.invalidate(name.as_str()).await;
    }
}

impl<P: PlanRepository> Clone for PlanCatalog<P> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            by_name: self.by_name.clone(),
        }
    }
}

impl<P: PlanRepository> std::fmt::Debug for PlanCatalog<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCatalog").finish()
    }
}
