//! PostgreSQL usage repository implementation
//!
//! `insert_if_under_limit` takes a per-(user, resource) advisory lock for the
//! duration of its transaction, so the count-then-insert cannot interleave
//! with a concurrent call and overshoot the quota.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UsageRecordRow;
use crate::repo::{CreateUsageRecord, UsageRepository};

const USAGE_COLUMNS: &str = "id, user_id, subscription_id, resource, quantity, \
     billing_period_start, billing_period_end, recorded_at, metadata";

/// PostgreSQL usage repository
#[derive(Clone)]
pub struct PgUsageRepository {
    pool: PgPool,
}

impl PgUsageRepository {
    /// Create a new usage repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn insert(&self, rec: CreateUsageRecord) -> DbResult<UsageRecordRow> {
        let row = sqlx::query_as::<_, UsageRecordRow>(&format!(
            r#"
            INSERT INTO usage_records (id, user_id, subscription_id, resource, quantity,
                                       billing_period_start, billing_period_end,
                                       recorded_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(rec.id)
        .bind(rec.user_id)
        .bind(rec.subscription_id)
        .bind(&rec.resource)
        .bind(rec.quantity)
        .bind(rec.billing_period_start)
        .bind(rec.billing_period_end)
        .bind(rec.recorded_at)
        .bind(&rec.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_if_under_limit(
        &self,
        rec: CreateUsageRecord,
        limit: i64,
    ) -> DbResult<Option<UsageRecordRow>> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent consumers of the same quota key
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{}:{}", rec.user_id, rec.resource))
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, UsageRecordRow>(&format!(
            r#"
            INSERT INTO usage_records (id, user_id, subscription_id, resource, quantity,
                                       billing_period_start, billing_period_end,
                                       recorded_at, metadata)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE (
                SELECT COALESCE(SUM(quantity), 0)
                FROM usage_records
                WHERE user_id = $2 AND resource = $4
                  AND billing_period_start <= $8 AND billing_period_end > $8
            ) + $5 <= $10
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(rec.id)
        .bind(rec.user_id)
        .bind(rec.subscription_id)
        .bind(&rec.resource)
        .bind(rec.quantity)
        .bind(rec.billing_period_start)
        .bind(rec.billing_period_end)
        .bind(rec.recorded_at)
        .bind(&rec.metadata)
        .bind(limit)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row)
    }

    async fn total_at(&self, user_id: Uuid, resource: &str, at: DateTime<Utc>) -> DbResult<i64> {
        let result: (Option<i64>,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM usage_records
            WHERE user_id = $1 AND resource = $2
              AND billing_period_start <= $3 AND billing_period_end > $3
            "#,
        )
        .bind(user_id)
        .bind(resource)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0.unwrap_or(0))
    }
}
