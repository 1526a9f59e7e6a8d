//! Praxis Billing Core - Subscription lifecycle and usage metering
//!
//! Decides, for any user at any instant, which plan they are on, whether a
//! trial is still valid, how much metered usage they have consumed in the
//! current billing window, and whether one more unit is allowed. Trial expiry
//! and period rollover are applied lazily on read; usage check-and-increment
//! is atomic at the persistence layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use praxis_billing_core::{BillingService, SystemClock, PaystackProvider, BillingConfig};
//! use std::sync::Arc;
//!
//! let gateway = Arc::new(PaystackProvider::new(BillingConfig::new("sk_live_..."))?);
//! let billing = BillingService::new(plans, subscriptions, users, usage, gateway, Arc::new(SystemClock));
//!
//! // Gate, check, consume
//! if billing.can_access_feature(user_id, "case_library").await? {
//!     let snapshot = billing.check_usage(user_id, ResourceType::CaseCompletion).await?;
//!     if snapshot.can_access {
//!         billing.try_consume(user_id, ResourceType::CaseCompletion, 1, None).await?;
//!     }
//! }
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod meter;
pub mod paystack;
pub mod period;
pub mod provider;
pub mod service;

pub use catalog::PlanCatalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BillingConfig;
pub use error::{BillingError, BillingResult};
pub use gate::can_access_feature;
pub use lifecycle::SubscriptionLifecycle;
pub use meter::UsageMeter;
pub use paystack::PaystackProvider;
pub use provider::{external_reference, PaymentGateway, PaymentIntent};
pub use service::{BillingService, CheckoutIntent};
