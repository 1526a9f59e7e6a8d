//! Payment gateway abstraction
//!
//! The engine never processes money; it records gateway-issued references and
//! asks the gateway to create or cancel remote resources through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use praxis_types::{Customer, Plan, PlanId, UserId};

use crate::error::BillingError;

/// A checkout the gateway has prepared for the user to complete
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// URL to redirect the user to
    pub redirect_url: String,
    /// Gateway-issued reference for the remote resource
    pub provider_ref: String,
}

/// Payment gateway trait
///
/// Abstracts payment processing to allow different providers (Paystack, etc.)
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a one-off payment for a non-recurring plan
    async fn create_payment_intent(
        &self,
        plan: &Plan,
        customer: &Customer,
        reference: &str,
    ) -> Result<PaymentIntent, BillingError>;

    /// Create a recurring subscription for a plan with a billing template
    async fn create_recurring(
        &self,
        plan: &Plan,
        customer: &Customer,
        reference: &str,
    ) -> Result<PaymentIntent, BillingError>;

    /// Cancel a remote recurring subscription
    async fn cancel_recurring(&self, provider_ref: &str) -> Result<(), BillingError>;
}

/// Build the external reference attached to one activation attempt.
///
/// Unique per attempt; asynchronous gateway callbacks echo it back so the
/// collaborator can reconcile them to the right user and plan.
pub fn external_reference(user_id: UserId, plan_id: PlanId, at: DateTime<Utc>) -> String {
    format!("SUB_{}_{}_{}", user_id, plan_id, at.timestamp_millis())
}
