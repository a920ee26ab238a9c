use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tourfare_core::config::{AppConfig, LoadOptions};
use tourfare_core::domain::context::PricingContext;
use tourfare_core::domain::service::{ServiceId, ServiceType};
use tourfare_core::pricing::{lint_rules_for_currency, RuleBasedPricingEngine};
use tourfare_store::InMemoryRuleRepository;

use crate::commands::{
    current_thread_runtime, open_rule_repository, CommandResult, EXIT_CONFIG, EXIT_INPUT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let (report, exit_code) = build_report(options);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: LoadOptions) -> (DoctorReport, u8) {
    let mut checks = Vec::new();
    let mut exit_code = 0;

    match AppConfig::load(options) {
        Ok(config) => {
            checks
                .push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            match open_rule_repository(&config) {
                Ok((repository, source)) => {
                    checks.push(DoctorCheck::pass(
                        "rule_source",
                        format!("rules loaded from {source}"),
                    ));
                    checks.extend(check_rule_set(&config, &repository));
                }
                Err(error) => {
                    checks.push(DoctorCheck::fail("rule_source", error.to_string()));
                    checks.push(DoctorCheck::skipped("rule_lint", "rules did not load"));
                    checks.push(DoctorCheck::skipped("pricing_smoke", "rules did not load"));
                }
            }
            if checks.iter().any(|check| check.status == CheckStatus::Fail) {
                exit_code = EXIT_INPUT;
            }
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["rule_source", "rule_lint", "pricing_smoke"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
            exit_code = EXIT_CONFIG;
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    (DoctorReport { overall_status, summary, checks }, exit_code)
}

fn check_rule_set(config: &AppConfig, repository: &InMemoryRuleRepository) -> Vec<DoctorCheck> {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "rule_lint",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("pricing_smoke", "async runtime did not start"),
            ];
        }
    };

    let rules = runtime.block_on(repository.list());
    let report = lint_rules_for_currency(&rules, &config.pricing.default_currency);
    let lint = if report.valid {
        DoctorCheck::pass("rule_lint", format!("{} rules, no structural issues", rules.len()))
    } else {
        let codes: Vec<&str> = report.issues.iter().map(|issue| issue.code.as_str()).collect();
        DoctorCheck::fail(
            "rule_lint",
            format!("{} issue(s) across {} rules: {}", codes.len(), rules.len(), codes.join(", ")),
        )
    };

    let engine = RuleBasedPricingEngine::default().with_policy(config.pricing.policy());
    let booked_at = Utc::now();
    let degraded: Vec<&str> = ServiceType::ALL
        .into_iter()
        .filter_map(|service_type| {
            let context = PricingContext {
                service_id: ServiceId(format!("doctor-{service_type}")),
                service_type,
                base_price: Decimal::ONE_HUNDRED,
                currency: config.pricing.default_currency.clone(),
                booking_date: booked_at,
                service_date: booked_at + Duration::days(45),
                duration: Some(1),
                group_size: Some(2),
                location: None,
                seasonal_factors: None,
                demand_factors: None,
            };
            let result = runtime.block_on(engine.quote(repository, &context));
            result.is_fallback.then_some(service_type.as_str())
        })
        .collect();

    let smoke = if degraded.is_empty() {
        DoctorCheck::pass("pricing_smoke", "every service type priced without falling back")
    } else {
        DoctorCheck::fail("pricing_smoke", format!("fallback pricing for {}", degraded.join(", ")))
    };

    vec![lint, smoke]
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
