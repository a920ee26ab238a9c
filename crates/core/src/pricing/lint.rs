use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rule::{
    AdjustmentKind, ConditionKind, ConditionOperator, ConditionValue, DemandMetric, PricingRule,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleIssue {
    pub code: String,
    pub rule_id: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLintReport {
    pub valid: bool,
    pub issues: Vec<RuleIssue>,
}

impl Default for RuleLintReport {
    fn default() -> Self {
        Self { valid: true, issues: Vec::new() }
    }
}

impl RuleLintReport {
    pub fn issues_for(&self, rule_id: &str) -> impl Iterator<Item = &RuleIssue> + '_ {
        let rule_id = rule_id.to_owned();
        self.issues.iter().filter(move |issue| issue.rule_id == rule_id)
    }
}

/// Structural checks over a rule set. Evaluation never depends on this: a
/// rule that fails lint still evaluates fail-closed.
pub fn lint_rules(rules: &[PricingRule]) -> RuleLintReport {
    let mut report = RuleLintReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for rule in rules {
        let rule_id = rule.id.0.trim().to_owned();
        let mut push = |code: &str, message: String, suggestion: Option<&str>| {
            report.issues.push(RuleIssue {
                code: code.to_string(),
                rule_id: rule_id.clone(),
                message,
                suggestion: suggestion.map(str::to_string),
            });
        };

        if rule_id.is_empty() {
            push(
                "MISSING_RULE_ID",
                "Rule is missing an id".to_string(),
                Some("Give every rule a unique id"),
            );
        } else if !seen_ids.insert(rule_id.clone()) {
            push(
                "DUPLICATE_RULE_ID",
                format!("Duplicate rule id in rule set: {rule_id}"),
                Some("Rename one of the rules; applied-rule audit trails are keyed by id"),
            );
        }

        if rule.name.trim().is_empty() {
            push("MISSING_RULE_NAME", format!("Rule {rule_id} has no name"), None);
        }

        if let (Some(from), Some(to)) = (rule.valid_from, rule.valid_to) {
            if from > to {
                push(
                    "INVERTED_VALIDITY",
                    format!("Rule {rule_id} is valid from {from} to {to}, which never matches"),
                    Some("Swap valid_from and valid_to"),
                );
            }
        }

        for (code, message, suggestion) in condition_issues(rule) {
            push(code, message, suggestion);
        }

        for (code, message, suggestion) in adjustment_issues(rule) {
            push(code, message, suggestion);
        }
    }

    report.valid = report.issues.is_empty();
    report
}

/// [`lint_rules`] plus a check that every currency-bound adjustment is written
/// in `currency`. Rules priced in another currency are skipped at quote time.
pub fn lint_rules_for_currency(rules: &[PricingRule], currency: &str) -> RuleLintReport {
    let mut report = lint_rules(rules);

    for rule in rules.iter().filter(|rule| !rule.adjustment.matches_currency(currency)) {
        report.issues.push(RuleIssue {
            code: "CURRENCY_MISMATCH".to_string(),
            rule_id: rule.id.0.trim().to_owned(),
            message: format!(
                "Rule {} adjusts by an amount in {} but quotes are priced in {currency}",
                rule.id.0,
                rule.adjustment.currency.as_deref().unwrap_or_default()
            ),
            suggestion: Some(
                "Drop the rule or restate the amount in the quoting currency".to_string(),
            ),
        });
    }

    report.valid = report.issues.is_empty();
    report
}

type Finding = (&'static str, String, Option<&'static str>);

fn condition_issues(rule: &PricingRule) -> Vec<Finding> {
    let condition = &rule.condition;
    let rule_id = &rule.id.0;
    let mut findings = Vec::new();

    if condition.kind == ConditionKind::Unknown {
        findings.push((
            "UNKNOWN_CONDITION_TYPE",
            format!("Rule {rule_id} has an unrecognized condition type"),
            Some("Use seasonal|demand|duration|advance_booking|group_size|day_of_week|location"),
        ));
        return findings;
    }

    if condition.operator == ConditionOperator::Unknown {
        findings.push((
            "UNKNOWN_OPERATOR",
            format!("Rule {rule_id} has an unrecognized operator"),
            Some("Use equals|greater_than|less_than|between|in|not_in"),
        ));
        return findings;
    }

    let numeric = matches!(
        condition.kind,
        ConditionKind::Demand
            | ConditionKind::Duration
            | ConditionKind::AdvanceBooking
            | ConditionKind::GroupSize
    );
    let supported = if numeric {
        matches!(
            condition.operator,
            ConditionOperator::Equals
                | ConditionOperator::GreaterThan
                | ConditionOperator::LessThan
                | ConditionOperator::Between
        )
    } else {
        matches!(
            condition.operator,
            ConditionOperator::Equals | ConditionOperator::In | ConditionOperator::NotIn
        )
    };

    if !supported {
        findings.push((
            "UNSUPPORTED_OPERATOR",
            format!(
                "Rule {rule_id}: operator {:?} is not supported for {:?} conditions",
                condition.operator, condition.kind
            ),
            Some(if numeric {
                "Numeric conditions accept equals|greater_than|less_than|between"
            } else {
                "Text conditions accept equals|in|not_in"
            }),
        ));
        return findings;
    }

    if let ConditionValue::Unsupported(raw) = &condition.value {
        findings.push((
            "VALUE_SHAPE_MISMATCH",
            format!("Rule {rule_id}: condition value {raw} is not a number, text or list of those"),
            Some("Booleans, nulls and objects never match; use numbers or text"),
        ));
        return findings;
    }

    match condition.operator {
        ConditionOperator::Between => {
            if condition.value.as_range().is_none() {
                findings.push((
                    "MALFORMED_RANGE",
                    format!("Rule {rule_id}: between needs exactly two numeric bounds"),
                    Some("Write the value as [low, high]"),
                ));
            }
        }
        ConditionOperator::In | ConditionOperator::NotIn => {
            if condition.value.as_list().is_none() {
                findings.push((
                    "EXPECTED_LIST",
                    format!("Rule {rule_id}: membership operators need a list value"),
                    Some("Wrap the value in a list"),
                ));
            }
        }
        _ => {
            let scalar = condition.value.as_scalar();
            let shape_ok = match scalar {
                Some(scalar) if numeric => scalar.as_number().is_some(),
                Some(scalar) => scalar.as_text().is_some(),
                None => false,
            };
            if !shape_ok {
                findings.push((
                    "VALUE_SHAPE_MISMATCH",
                    format!(
                        "Rule {rule_id}: {:?} with {:?} expects a single {} value",
                        condition.kind,
                        condition.operator,
                        if numeric { "numeric" } else { "text" }
                    ),
                    None,
                ));
            }
        }
    }

    if let ConditionValue::List(values) = &condition.value {
        if !numeric && values.iter().any(|value| value.as_text().is_none()) {
            findings.push((
                "VALUE_SHAPE_MISMATCH",
                format!("Rule {rule_id}: text conditions only match text list entries"),
                None,
            ));
        }
    }

    let metric = condition.metadata.as_ref().and_then(|metadata| metadata.metric);
    if condition.kind == ConditionKind::Demand && metric == Some(DemandMetric::Unknown) {
        findings.push((
            "UNKNOWN_DEMAND_METRIC",
            format!("Rule {rule_id} reads an unrecognized demand metric"),
            Some("Use occupancy_rate or popularity_score"),
        ));
    }

    findings
}

fn adjustment_issues(rule: &PricingRule) -> Vec<Finding> {
    let adjustment = &rule.adjustment;
    let rule_id = &rule.id.0;
    let mut findings = Vec::new();

    match adjustment.kind {
        AdjustmentKind::Percentage if adjustment.value < -Decimal::ONE_HUNDRED => {
            findings.push((
                "PERCENTAGE_BELOW_FLOOR",
                format!("Rule {rule_id} discounts more than 100%"),
                Some("Use replace with value 0 to make a service free"),
            ));
        }
        AdjustmentKind::Replace if adjustment.value.is_sign_negative() => {
            findings.push((
                "NEGATIVE_REPLACEMENT",
                format!("Rule {rule_id} replaces the price with a negative amount"),
                None,
            ));
        }
        _ => {}
    }

    findings
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use serde_json::json;

    use super::{lint_rules, lint_rules_for_currency};
    use crate::domain::rule::{
        ConditionKind, ConditionOperator, ConditionValue, DemandMetric, PricingAdjustment,
        PricingCondition, PricingRule, RuleId,
    };
    use crate::domain::service::ServiceType;

    fn rule(id: &str, condition: PricingCondition, adjustment: PricingAdjustment) -> PricingRule {
        PricingRule {
            id: RuleId(id.to_string()),
            name: format!("Rule {id}"),
            service_type: ServiceType::Hotel,
            condition,
            adjustment,
            priority: 1,
            is_active: true,
            valid_from: None,
            valid_to: None,
        }
    }

    fn codes(rules: &[PricingRule]) -> Vec<String> {
        lint_rules(rules).issues.into_iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn clean_rule_set_is_valid() {
        let rules = vec![
            rule(
                "long-stay",
                PricingCondition::new(
                    ConditionKind::Duration,
                    ConditionOperator::GreaterThan,
                    ConditionValue::number(7),
                ),
                PricingAdjustment::percentage(-12),
            ),
            rule(
                "weekend",
                PricingCondition::new(
                    ConditionKind::DayOfWeek,
                    ConditionOperator::In,
                    ConditionValue::texts(["saturday", "sunday"]),
                ),
                PricingAdjustment::percentage(10),
            ),
        ];

        let report = lint_rules(&rules);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn detects_identity_and_validity_problems() {
        let base = rule(
            "dup",
            PricingCondition::new(
                ConditionKind::GroupSize,
                ConditionOperator::GreaterThan,
                ConditionValue::number(9),
            ),
            PricingAdjustment::percentage(-15),
        );
        let rules = vec![
            base.clone(),
            PricingRule { name: " ".to_string(), ..base.clone() },
            PricingRule {
                id: RuleId("  ".to_string()),
                valid_from: NaiveDate::from_ymd_opt(2026, 9, 1),
                valid_to: NaiveDate::from_ymd_opt(2026, 6, 1),
                ..base
            },
        ];

        let codes = codes(&rules);
        assert!(codes.contains(&"DUPLICATE_RULE_ID".to_string()));
        assert!(codes.contains(&"MISSING_RULE_NAME".to_string()));
        assert!(codes.contains(&"MISSING_RULE_ID".to_string()));
        assert!(codes.contains(&"INVERTED_VALIDITY".to_string()));
    }

    #[test]
    fn detects_condition_shape_problems() {
        let rules = vec![
            rule(
                "bad-range",
                PricingCondition::new(
                    ConditionKind::Duration,
                    ConditionOperator::Between,
                    ConditionValue::number(3),
                ),
                PricingAdjustment::percentage(5),
            ),
            rule(
                "bad-membership",
                PricingCondition::new(
                    ConditionKind::Location,
                    ConditionOperator::In,
                    ConditionValue::text("hanoi"),
                ),
                PricingAdjustment::percentage(5),
            ),
            rule(
                "text-threshold",
                PricingCondition::new(
                    ConditionKind::AdvanceBooking,
                    ConditionOperator::GreaterThan,
                    ConditionValue::text("thirty"),
                ),
                PricingAdjustment::percentage(5),
            ),
            rule(
                "ordered-season",
                PricingCondition::new(
                    ConditionKind::Seasonal,
                    ConditionOperator::GreaterThan,
                    ConditionValue::text("summer"),
                ),
                PricingAdjustment::percentage(5),
            ),
            rule(
                "unknown-metric",
                PricingCondition::new(
                    ConditionKind::Demand,
                    ConditionOperator::GreaterThan,
                    ConditionValue::number(1),
                )
                .with_metric(DemandMetric::Unknown),
                PricingAdjustment::percentage(5),
            ),
            rule(
                "unknown-kind",
                PricingCondition::new(
                    ConditionKind::Unknown,
                    ConditionOperator::Equals,
                    ConditionValue::text("x"),
                ),
                PricingAdjustment::percentage(5),
            ),
        ];

        let report = lint_rules(&rules);
        let code_of = |id: &str| -> Vec<String> {
            report.issues_for(id).map(|issue| issue.code.clone()).collect()
        };

        assert_eq!(code_of("bad-range"), vec!["MALFORMED_RANGE"]);
        assert_eq!(code_of("bad-membership"), vec!["EXPECTED_LIST"]);
        assert_eq!(code_of("text-threshold"), vec!["VALUE_SHAPE_MISMATCH"]);
        assert_eq!(code_of("ordered-season"), vec!["UNSUPPORTED_OPERATOR"]);
        assert_eq!(code_of("unknown-metric"), vec!["UNKNOWN_DEMAND_METRIC"]);
        assert_eq!(code_of("unknown-kind"), vec!["UNKNOWN_CONDITION_TYPE"]);
        assert!(!report.valid);
    }

    #[test]
    fn detects_adjustment_problems() {
        let always = PricingCondition::new(
            ConditionKind::GroupSize,
            ConditionOperator::GreaterThan,
            ConditionValue::number(0),
        );
        let rules = vec![
            rule("too-deep", always.clone(), PricingAdjustment::percentage(-120)),
            rule("negative", always.clone(), PricingAdjustment::replace(-1)),
            rule("free", always, PricingAdjustment::percentage(-100)),
        ];

        let codes = codes(&rules);
        assert_eq!(codes, vec!["PERCENTAGE_BELOW_FLOOR", "NEGATIVE_REPLACEMENT"]);
    }

    #[test]
    fn flags_values_that_can_never_match() {
        let odd_bounds = PricingCondition::new(
            ConditionKind::GroupSize,
            ConditionOperator::Between,
            ConditionValue::Unsupported(json!([3, null])),
        );
        let flag = PricingCondition::new(
            ConditionKind::Location,
            ConditionOperator::Equals,
            ConditionValue::Unsupported(json!(true)),
        );
        let rules = vec![
            rule("odd-bounds", odd_bounds, PricingAdjustment::percentage(-5)),
            rule("flag", flag, PricingAdjustment::percentage(5)),
        ];

        let report = lint_rules(&rules);
        for id in ["odd-bounds", "flag"] {
            let found: Vec<&str> = report.issues_for(id).map(|issue| issue.code.as_str()).collect();
            assert_eq!(found, vec!["VALUE_SHAPE_MISMATCH"], "rule {id}");
        }
    }

    #[test]
    fn flags_amounts_written_in_another_currency() {
        let always = PricingCondition::new(
            ConditionKind::GroupSize,
            ConditionOperator::GreaterThan,
            ConditionValue::number(0),
        );
        let rules = vec![
            rule(
                "dong-flat",
                always.clone(),
                PricingAdjustment::fixed_amount(50_000).in_currency("VND"),
            ),
            rule("usd-flat", always.clone(), PricingAdjustment::fixed_amount(5).in_currency("usd")),
            rule("unbound-flat", always.clone(), PricingAdjustment::fixed_amount(5)),
            rule("dong-percent", always, PricingAdjustment::percentage(5).in_currency("VND")),
        ];

        assert!(lint_rules(&rules).valid);

        let report = lint_rules_for_currency(&rules, "USD");
        let flagged: Vec<&str> = report
            .issues
            .iter()
            .filter(|issue| issue.code == "CURRENCY_MISMATCH")
            .map(|issue| issue.rule_id.as_str())
            .collect();
        assert_eq!(flagged, vec!["dong-flat"]);
        assert!(!report.valid);
    }
}
