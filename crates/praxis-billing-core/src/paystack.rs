//! Paystack payment gateway implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use praxis_types::{Customer, Plan};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{PaymentGateway, PaymentIntent};

const PAYSTACK_API_BASE: &str = "https://api.paystack.co";

/// Paystack payment gateway
#[derive(Clone)]
pub struct PaystackProvider {
    client: Client,
    config: BillingConfig,
}

impl PaystackProvider {
    /// Create a new Paystack provider
    pub fn new(config: BillingConfig) -> Result<Self, BillingError> {
        let client = Client::builder()
            .timeout(config.gateway_timeout)
            .build()
            .map_err(|e| BillingError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Make authenticated request to Paystack
    async fn paystack_request<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, BillingError> {
        let url = format!("{PAYSTACK_API_BASE}{endpoint}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.paystack_secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Paystack API request failed");
                BillingError::Gateway(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Paystack API error");
            return Err(BillingError::Gateway(format!(
                "Paystack API error: {status}"
            )));
        }

        let envelope: PaystackEnvelope<T> = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Paystack response");
            BillingError::Internal(e.to_string())
        })?;

        if !envelope.status {
            return Err(BillingError::Gateway(envelope.message));
        }

        Ok(envelope.data)
    }

    fn initialize_body(&self, plan: &Plan, customer: &Customer, reference: &str) -> serde_json::Value {
        serde_json::json!({
            "email": customer.email,
            "amount": plan.price_cents,
            "currency": plan.currency.to_uppercase(),
            "reference": reference,
            "callback_url": self.config.callback_url,
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackProvider {
    #[instrument(skip(self, plan, customer), fields(plan = %plan.name, user_id = %customer.user_id))]
    async fn create_payment_intent(
        &self,
        plan: &Plan,
        customer: &Customer,
        reference: &str,
    ) -> Result<PaymentIntent, BillingError> {
        debug!(reference = %reference, "Initializing one-off transaction");

        let body = self.initialize_body(plan, customer, reference);
        let txn: PaystackTransaction = self
            .paystack_request("/transaction/initialize", &body)
            .await?;

        Ok(PaymentIntent {
            redirect_url: txn.authorization_url,
            provider_ref: txn.reference,
        })
    }

    #[instrument(skip(self, plan, customer), fields(plan = %plan.name, user_id = %customer.user_id))]
    async fn create_recurring(
        &self,
        plan: &Plan,
        customer: &Customer,
        reference: &str,
    ) -> Result<PaymentIntent, BillingError> {
        debug!(reference = %reference, "Initializing recurring transaction");

        let plan_code = plan
            .recurring_plan_code
            .as_deref()
            .ok_or_else(|| BillingError::Internal("plan has no recurring plan code".into()))?;

        let mut body = self.initialize_body(plan, customer, reference);
        body["plan"] = serde_json::Value::String(plan_code.to_string());

        let txn: PaystackTransaction = self
            .paystack_request("/transaction/initialize", &body)
            .await?;

        Ok(PaymentIntent {
            redirect_url: txn.authorization_url,
            provider_ref: txn.reference,
        })
    }

    #[instrument(skip(self))]
    async fn cancel_recurring(&self, provider_ref: &str) -> Result<(), BillingError> {
        debug!(provider_ref = %provider_ref, "Disabling recurring subscription");

        let body = serde_json::json!({ "code": provider_ref });
        let _: serde_json::Value = self.paystack_request("/subscription/disable", &body).await?;

        Ok(())
    }
}

// Paystack API response types

/// Paystack response envelope
#[derive(Debug, Clone, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: T,
}

/// Initialized Paystack transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackTransaction {
    /// Checkout URL to redirect the user to
    pub authorization_url: String,
    /// One-time access code for the checkout
    pub access_code: Option<String>,
    /// Transaction reference
    pub reference: String,
}
