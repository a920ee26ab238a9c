use rust_decimal::Decimal;

use tourfare_core::domain::rule::{
    ConditionKind, ConditionOperator, ConditionValue, DemandMetric, PricingAdjustment,
    PricingCondition, PricingRule, RoundingRule, RuleId,
};
use tourfare_core::domain::service::ServiceType;

/// Back-office starter rule set, served when no rule file is configured.
///
/// Priorities follow one ladder across service types: season (10), booking
/// lead (20), party or stay size (30), weekday (40), demand (50). Demand rules
/// round to whole units so the surcharge never leaves fractional prices.
pub fn default_rules() -> Vec<PricingRule> {
    vec![
        rule(
            "tour-summer-surcharge",
            "Summer season surcharge",
            ServiceType::Tour,
            seasonal("summer"),
            PricingAdjustment::percentage(15),
            10,
        ),
        rule(
            "tour-tet-surcharge",
            "Tet holiday surcharge",
            ServiceType::Tour,
            seasonal("tet_holiday"),
            PricingAdjustment::percentage(25),
            10,
        ),
        rule(
            "tour-early-bird",
            "Early-bird discount (30+ days ahead)",
            ServiceType::Tour,
            PricingCondition::new(
                ConditionKind::AdvanceBooking,
                ConditionOperator::GreaterThan,
                ConditionValue::number(30),
            ),
            PricingAdjustment::percentage(-10),
            20,
        ),
        rule(
            "tour-group-discount",
            "Group discount (10+ travellers)",
            ServiceType::Tour,
            PricingCondition::new(
                ConditionKind::GroupSize,
                ConditionOperator::GreaterThan,
                ConditionValue::number(9),
            ),
            PricingAdjustment::percentage(-8),
            30,
        ),
        rule(
            "tour-weekend-surcharge",
            "Weekend departure surcharge",
            ServiceType::Tour,
            weekend(),
            PricingAdjustment::percentage(5),
            40,
        ),
        rule(
            "tour-high-demand",
            "High occupancy surcharge",
            ServiceType::Tour,
            occupancy_above(Decimal::new(8, 1)),
            PricingAdjustment::percentage(12).rounded(RoundingRule::Round),
            50,
        ),
        rule(
            "hotel-summer-surcharge",
            "Summer season surcharge",
            ServiceType::Hotel,
            seasonal("summer"),
            PricingAdjustment::percentage(20),
            10,
        ),
        rule(
            "hotel-tet-surcharge",
            "Tet holiday surcharge",
            ServiceType::Hotel,
            seasonal("tet_holiday"),
            PricingAdjustment::percentage(30),
            10,
        ),
        rule(
            "hotel-long-stay",
            "Long-stay discount (7+ nights)",
            ServiceType::Hotel,
            PricingCondition::new(
                ConditionKind::Duration,
                ConditionOperator::GreaterThan,
                ConditionValue::number(6),
            ),
            PricingAdjustment::percentage(-15),
            30,
        ),
        rule(
            "hotel-weekend-surcharge",
            "Weekend night surcharge",
            ServiceType::Hotel,
            weekend(),
            PricingAdjustment::percentage(10),
            40,
        ),
        rule(
            "hotel-high-demand",
            "High occupancy surcharge",
            ServiceType::Hotel,
            occupancy_above(Decimal::new(85, 2)),
            PricingAdjustment::percentage(15).rounded(RoundingRule::Round),
            50,
        ),
        rule(
            "activity-early-bird",
            "Early-bird discount (14+ days ahead)",
            ServiceType::Activity,
            PricingCondition::new(
                ConditionKind::AdvanceBooking,
                ConditionOperator::GreaterThan,
                ConditionValue::number(14),
            ),
            PricingAdjustment::percentage(-5),
            20,
        ),
        rule(
            "activity-weekend-surcharge",
            "Weekend surcharge",
            ServiceType::Activity,
            weekend(),
            PricingAdjustment::percentage(10),
            40,
        ),
    ]
}

fn rule(
    id: &str,
    name: &str,
    service_type: ServiceType,
    condition: PricingCondition,
    adjustment: PricingAdjustment,
    priority: i32,
) -> PricingRule {
    PricingRule {
        id: RuleId(id.to_string()),
        name: name.to_string(),
        service_type,
        condition,
        adjustment,
        priority,
        is_active: true,
        valid_from: None,
        valid_to: None,
    }
}

fn seasonal(label: &str) -> PricingCondition {
    PricingCondition::new(
        ConditionKind::Seasonal,
        ConditionOperator::Equals,
        ConditionValue::text(label),
    )
}

fn weekend() -> PricingCondition {
    PricingCondition::new(
        ConditionKind::DayOfWeek,
        ConditionOperator::In,
        ConditionValue::texts(["saturday", "sunday"]),
    )
}

fn occupancy_above(threshold: Decimal) -> PricingCondition {
    PricingCondition::new(
        ConditionKind::Demand,
        ConditionOperator::GreaterThan,
        ConditionValue::number(threshold),
    )
    .with_metric(DemandMetric::OccupancyRate)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tourfare_core::domain::service::ServiceType;
    use tourfare_core::pricing::lint_rules;

    use super::default_rules;

    #[test]
    fn default_rules_pass_lint() {
        let rules = default_rules();
        let report = lint_rules(&rules);
        assert!(report.valid, "default rules should lint clean: {:?}", report.issues);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn default_rule_ids_are_unique() {
        let rules = default_rules();
        let ids: HashSet<_> = rules.iter().map(|rule| rule.id.0.as_str()).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn default_rules_cover_the_bookable_services() {
        let rules = default_rules();
        for service_type in [ServiceType::Tour, ServiceType::Hotel, ServiceType::Activity] {
            assert!(
                rules.iter().any(|rule| rule.service_type == service_type),
                "expected at least one rule for {service_type}"
            );
        }
        assert!(rules.iter().all(|rule| rule.is_active));
    }
}
