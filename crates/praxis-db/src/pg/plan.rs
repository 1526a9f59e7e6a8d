//! PostgreSQL plan repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PlanRow;
use crate::repo::PlanRepository;

/// PostgreSQL plan repository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    /// Create a new plan repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        let plan = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, price_cents, currency, cadence, trial_days,
                   max_usage_per_period, features, recurring_plan_code,
                   is_active, created_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn find_active_by_name(&self, name: &str) -> DbResult<Option<PlanRow>> {
        let plan = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, price_cents, currency, cadence, trial_days,
                   max_usage_per_period, features, recurring_plan_code,
                   is_active, created_at
            FROM plans
            WHERE name = $1 AND is_active
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn list_active(&self) -> DbResult<Vec<PlanRow>> {
        let plans = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, price_cents, currency, cadence, trial_days,
                   max_usage_per_period, features, recurring_plan_code,
                   is_active, created_at
            FROM plans
            WHERE is_active
            ORDER BY price_cents ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }
}
