//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Conversions into `praxis-types` domain types live here so the core never
//! sees raw status/name strings.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use praxis_types::{
    Plan, PlanId, Subscription, SubscriptionId, UsageRecord, UsageRecordId, UserId,
};

use crate::error::DbError;

/// Plan row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub cadence: String,
    pub trial_days: i32,
    pub max_usage_per_period: Option<i64>,
    pub features: Vec<String>,
    pub recurring_plan_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub external_payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usage record row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UsageRecordRow {
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

/// User row from the database
///
/// The identity provider owns users; this layer only reads the contact
/// details the payment gateway needs.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }
}

impl TryFrom<PlanRow> for Plan {
    type Error = DbError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: PlanId(row.id),
            name: row
                .name
                .parse()
                .map_err(|e: praxis_types::PlanNameParseError| DbError::Decode(e.to_string()))?,
            price_cents: row.price_cents,
            currency: row.currency,
            cadence: row
                .cadence
                .parse()
                .map_err(|e: praxis_types::CadenceParseError| DbError::Decode(e.to_string()))?,
            trial_days: row.trial_days.max(0) as u32,
            max_usage_per_period: row.max_usage_per_period,
            features: row.features,
            recurring_plan_code: row.recurring_plan_code,
            is_active: row.is_active,
        })
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DbError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId(row.id),
            user_id: UserId(row.user_id),
            plan_id: PlanId(row.plan_id),
            status: row
                .status
                .parse()
                .map_err(|e: praxis_types::StatusParseError| DbError::Decode(e.to_string()))?,
            trial_start: row.trial_start,
            trial_end: row.trial_end,
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            canceled_at: row.canceled_at,
            cancel_reason: row.cancel_reason,
            external_payment_ref: row.external_payment_ref,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<UsageRecordRow> for UsageRecord {
    type Error = DbError;

    fn try_from(row: UsageRecordRow) -> Result<Self, Self::Error> {
        Ok(UsageRecord {
            id: UsageRecordId(row.id),
            user_id: UserId(row.user_id),
            subscription_id: row.subscription_id.map(SubscriptionId),
            resource: row
                .resource
                .parse()
                .map_err(|e: praxis_types::ResourceParseError| DbError::Decode(e.to_string()))?,
            quantity: row.quantity,
            billing_period_start: row.billing_period_start,
            billing_period_end: row.billing_period_end,
            recorded_at: row.recorded_at,
            metadata: row.metadata,
        })
    }
}
