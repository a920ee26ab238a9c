use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tourfare_core::config::{AppConfig, LoadOptions};
use tourfare_core::domain::context::PricingContext;
use tourfare_core::pricing::{
    DeterministicAdjustmentApplier, DeterministicConditionEvaluator, FixedClock,
    RuleBasedPricingEngine,
};
use tracing::info;

use crate::commands::{current_thread_runtime, open_rule_repository, CommandResult, EXIT_INPUT};

const COMMAND: &str = "quote";

pub fn run(options: LoadOptions, context_path: &Path, now: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure(COMMAND, error),
    };

    let now = match now.map(parse_instant).transpose() {
        Ok(now) => now.unwrap_or_else(Utc::now),
        Err(message) => return CommandResult::input_failure(COMMAND, message),
    };

    let context = match read_context(context_path) {
        Ok(context) => context,
        Err(message) => return CommandResult::input_failure(COMMAND, message),
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

    let engine = RuleBasedPricingEngine::new(
        DeterministicConditionEvaluator::default(),
        DeterministicAdjustmentApplier,
        FixedClock(now),
    )
    .with_policy(config.pricing.policy());

    let result = runtime.block_on(engine.quote(&repository, &context));
    info!(
        event_name = "cli.quote.priced",
        service_id = %context.service_id.0,
        rule_source = %source,
        applied_rules = result.applied_rules.len(),
        is_fallback = result.is_fallback,
        "quote computed"
    );

    CommandResult::document(COMMAND, &result)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|error| format!("--now must be an RFC 3339 timestamp: {error}"))
}

fn read_context(path: &Path) -> Result<PricingContext, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read context file `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse context file `{}`: {error}", path.display()))
}
