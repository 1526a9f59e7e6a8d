//! Plan catalog types
//!
//! Plans are immutable catalog entries created by admin tooling; the billing
//! engine only reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Create a new random plan ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a plan ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Well-known plan names
///
/// At most one plan per name is active at a time; the catalog enforces that,
/// not this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanName {
    /// Default plan for users without a subscription row
    Free,
    /// Entry paid plan
    Basic,
    /// Unlimited-usage plan
    Premium,
}

impl PlanName {
    /// Get the plan name string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for PlanName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanName {
    type Err = PlanNameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            _ => Err(PlanNameParseError(s.to_string())),
        }
    }
}

/// Error parsing a plan name string
#[derive(Debug, Clone)]
pub struct PlanNameParseError(pub String);

impl std::fmt::Display for PlanNameParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid plan name: {}", self.0)
    }
}

impl std::error::Error for PlanNameParseError {}

/// Billing cadence for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCadence {
    /// One calendar month per period
    Monthly,
    /// Three calendar months per period
    Quarterly,
    /// One calendar year per period
    Yearly,
}

impl BillingCadence {
    /// Number of calendar months in one period
    pub const fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }

    /// Get the cadence string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for BillingCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BillingCadence {
    type Err = CadenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(CadenceParseError(s.to_string())),
        }
    }
}

/// Error parsing a billing cadence string
#[derive(Debug, Clone)]
pub struct CadenceParseError(pub String);

impl std::fmt::Display for CadenceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid billing cadence: {}", self.0)
    }
}

impl std::error::Error for CadenceParseError {}

/// Plan catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID
    pub id: PlanId,
    /// Well-known plan name
    pub name: PlanName,
    /// Price per period in cents
    pub price_cents: i64,
    /// ISO currency code (e.g. "zar")
    pub currency: String,
    /// Billing cadence
    pub cadence: BillingCadence,
    /// Trial length in days; 0 means no trial
    pub trial_days: u32,
    /// Metered-usage quota per billing period; `None` is unlimited
    pub max_usage_per_period: Option<i64>,
    /// Capability flags granted by this plan
    pub features: Vec<String>,
    /// Gateway billing-template code for recurring plans
    pub recurring_plan_code: Option<String>,
    /// Whether the plan is offered to new subscribers
    pub is_active: bool,
}

impl Plan {
    /// Whether this plan grants a feature; absent keys are denied
    pub fn has_feature(&self, key: &str) -> bool {
        self.features.iter().any(|f| f == key)
    }

    /// Whether this plan bills through a recurring gateway template
    pub fn is_recurring(&self) -> bool {
        self.recurring_plan_code.is_some()
    }

    /// Whether usage on this plan is unmetered
    pub fn is_unlimited(&self) -> bool {
        self.max_usage_per_period.is_none()
    }
}
