//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionRepository};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_id, status, trial_start, trial_end, \
     current_period_start, current_period_end, cancel_at_period_end, \
     canceled_at, cancel_reason, external_payment_ref, created_at, updated_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_current_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1 AND status IN ('active', 'trialing')
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<Option<SubscriptionRow>> {
        // The NOT EXISTS guard plus the partial unique index on
        // subscriptions(user_id) WHERE status IN ('active', 'trialing') make
        // the check-and-insert atomic under concurrent activations.
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            INSERT INTO subscriptions (id, user_id, plan_id, status, trial_start, trial_end,
                                       current_period_start, current_period_end,
                                       external_payment_ref)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE NOT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE user_id = $2 AND status IN ('active', 'trialing')
            )
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(sub.plan_id)
        .bind(&sub.status)
        .bind(sub.trial_start)
        .bind(sub.trial_end)
        .bind(sub.current_period_start)
        .bind(sub.current_period_end)
        .bind(&sub.external_payment_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn expire_trial(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = $2
            WHERE id = $1 AND status = 'trialing' AND trial_end < $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn roll_period(
        &self,
        id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        expected_end: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET current_period_start = $2, current_period_end = $3, updated_at = NOW()
            WHERE id = $1 AND current_period_end = $4
            "#,
        )
        .bind(id)
        .bind(new_start)
        .bind(new_end)
        .bind(expected_end)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn finish_scheduled_cancellation(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'canceled', updated_at = $2
            WHERE id = $1 AND cancel_at_period_end AND current_period_end <= $2
              AND status IN ('active', 'trialing')
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn schedule_cancellation(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET cancel_at_period_end = TRUE, canceled_at = $2, cancel_reason = $3,
                updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel_now(&self, id: Uuid, at: DateTime<Utc>, reason: Option<&str>) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'canceled', canceled_at = $2, cancel_reason = $3, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_cancellation(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET cancel_at_period_end = FALSE, canceled_at = NULL, cancel_reason = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
