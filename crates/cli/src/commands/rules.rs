use serde::Serialize;
use tourfare_core::config::{AppConfig, LoadOptions};
use tourfare_core::domain::rule::PricingRule;
use tourfare_core::domain::service::ServiceType;
use tourfare_core::pricing::{lint_rules_for_currency, RuleLintReport};

use crate::commands::{current_thread_runtime, open_rule_repository, CommandResult, EXIT_INPUT};

const COMMAND: &str = "rules";

#[derive(Debug, Serialize)]
struct RuleListing {
    source: String,
    rule_count: usize,
    rules: Vec<PricingRule>,
    lint: RuleLintReport,
}

/// Lists rules in evaluation order. Lint runs over the whole loaded set so
/// duplicate ids are caught even when a service filter hides one of them.
pub fn run(options: LoadOptions, service_type: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure(COMMAND, error),
    };

    let service_type = match service_type.map(str::parse::<ServiceType>).transpose() {
        Ok(service_type) => service_type,
        Err(error) => return CommandResult::input_failure(COMMAND, error.to_string()),
    };

    let (repository, source) = match open_rule_repository(&config) {
        Ok(opened) => opened,
        Err(error) => return CommandResult::input_failure(COMMAND, error.to_string()),
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_INPUT,
            );
        }
    };

    let all_rules = runtime.block_on(repository.list());
    let lint = lint_rules_for_currency(&all_rules, &config.pricing.default_currency);
    let rules: Vec<PricingRule> = all_rules
        .into_iter()
        .filter(|rule| service_type.map_or(true, |wanted| rule.service_type == wanted))
        .collect();

    CommandResult::document(
        COMMAND,
        &RuleListing { source: source.to_string(), rule_count: rules.len(), rules, lint },
    )
}
