//! Billing configuration

use std::time::Duration;

/// Billing engine configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Paystack secret key
    pub paystack_secret_key: String,
    /// URL the gateway redirects back to after checkout
    pub callback_url: String,
    /// Timeout applied to every gateway call; calls are never retried here
    pub gateway_timeout: Duration,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(paystack_secret_key: impl Into<String>) -> Self {
        Self {
            paystack_secret_key: paystack_secret_key.into(),
            callback_url: "https://app.praxis.health/billing/return".to_string(),
            gateway_timeout: Duration::from_secs(10),
        }
    }

    /// Set the checkout callback URL
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = url.into();
        self
    }

    /// Set the gateway call timeout
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }
}
