//! Feature gating
//!
//! A boolean capability check over the plan in effect. This is independent of
//! quota: "can you use the AI tutor at all" is a different question from
//! "have you used up this month's cases", and combining them belongs to the
//! caller.

use praxis_types::EffectivePlan;

/// Whether the plan in effect grants a feature.
///
/// [`EffectivePlan`] resolution has already applied lazy lifecycle
/// transitions and the free-plan fallback, so an expired or canceled
/// subscriber is checked against the free plan's feature set here. Absent
/// keys are denied.
pub fn can_access_feature(effective: &EffectivePlan, feature_key: &str) -> bool {
    effective.plan().has_feature(feature_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_types::{BillingCadence, Plan, PlanId, PlanName};

    fn plan(features: &[&str]) -> Plan {
        Plan {
            id: PlanId::new(),
            name: PlanName::Premium,
            price_cents: 49_900,
            currency: "zar".to_string(),
            cadence: BillingCadence::Monthly,
            trial_days: 0,
            max_usage_per_period: None,
            features: features.iter().map(|f| f.to_string()).collect(),
            recurring_plan_code: None,
            is_active: true,
        }
    }

    #[test]
    fn test_granted_feature() {
        let effective = EffectivePlan::DefaultFree(plan(&["case_library", "ai_tutor"]));
        assert!(can_access_feature(&effective, "ai_tutor"));
    }

    #[test]
    fn test_absent_key_denied() {
        let effective = EffectivePlan::DefaultFree(plan(&["case_library"]));
        assert!(!can_access_feature(&effective, "ai_tutor"));
    }

    #[test]
    fn test_empty_feature_set_denied() {
        let effective = EffectivePlan::DefaultFree(plan(&[]));
        assert!(!can_access_feature(&effective, "case_library"));
    }
}
