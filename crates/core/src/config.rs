use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::engine::PricingPolicy;

const MAX_QUOTE_VALIDITY_HOURS: u32 = 720;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub rules: RulesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub quote_validity_hours: u32,
    pub default_currency: String,
}

impl PricingConfig {
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate: self.tax_rate,
            quote_validity: Duration::hours(i64::from(self.quote_validity_hours)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    /// Serve the built-in default rule set when no rule file is given.
    pub seed_defaults: bool,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Values taken from command-line flags. They win over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub rules_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig {
                tax_rate: Decimal::new(10, 2),
                quote_validity_hours: 24,
                default_currency: "USD".to_string(),
            },
            rules: RulesConfig { seed_defaults: true, path: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tourfare.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(tax_rate) = pricing.tax_rate {
                self.pricing.tax_rate = tax_rate;
            }
            if let Some(quote_validity_hours) = pricing.quote_validity_hours {
                self.pricing.quote_validity_hours = quote_validity_hours;
            }
            if let Some(default_currency) = pricing.default_currency {
                self.pricing.default_currency = default_currency;
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(seed_defaults) = rules.seed_defaults {
                self.rules.seed_defaults = seed_defaults;
            }
            if let Some(path) = rules.path {
                self.rules.path = Some(path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TOURFARE_PRICING_TAX_RATE") {
            self.pricing.tax_rate = parse_decimal("TOURFARE_PRICING_TAX_RATE", &value)?;
        }
        if let Some(value) = read_env("TOURFARE_PRICING_QUOTE_VALIDITY_HOURS") {
            self.pricing.quote_validity_hours =
                parse_u32("TOURFARE_PRICING_QUOTE_VALIDITY_HOURS", &value)?;
        }
        if let Some(value) = read_env("TOURFARE_PRICING_DEFAULT_CURRENCY") {
            self.pricing.default_currency = value;
        }

        if let Some(value) = read_env("TOURFARE_RULES_SEED_DEFAULTS") {
            self.rules.seed_defaults = parse_bool("TOURFARE_RULES_SEED_DEFAULTS", &value)?;
        }
        if let Some(value) = read_env("TOURFARE_RULES_PATH") {
            self.rules.path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("TOURFARE_LOGGING_LEVEL").or_else(|| read_env("TOURFARE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TOURFARE_LOGGING_FORMAT").or_else(|| read_env("TOURFARE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(rules_path) = overrides.rules_path {
            self.rules.path = Some(rules_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_rules(&self.rules)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The file `load` would read: the explicit path when it exists, otherwise
/// `tourfare.toml` then `config/tourfare.toml` in the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tourfare.toml"), PathBuf::from("config/tourfare.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.tax_rate < Decimal::ZERO || pricing.tax_rate > Decimal::ONE {
        return Err(ConfigError::Validation(
            "pricing.tax_rate must be a fraction in range 0..=1 (e.g. 0.10 for 10%)".to_string(),
        ));
    }

    if pricing.quote_validity_hours == 0
        || pricing.quote_validity_hours > MAX_QUOTE_VALIDITY_HOURS
    {
        return Err(ConfigError::Validation(format!(
            "pricing.quote_validity_hours must be in range 1..={MAX_QUOTE_VALIDITY_HOURS}"
        )));
    }

    let currency = pricing.default_currency.as_str();
    let iso_like = currency.len() == 3 && currency.chars().all(|ch| ch.is_ascii_uppercase());
    if !iso_like {
        return Err(ConfigError::Validation(format!(
            "pricing.default_currency must be a three-letter uppercase code, got `{currency}`"
        )));
    }

    Ok(())
}

fn validate_rules(rules: &RulesConfig) -> Result<(), ConfigError> {
    match &rules.path {
        Some(path) if path.as_os_str().is_empty() => Err(ConfigError::Validation(
            "rules.path must not be empty when set".to_string(),
        )),
        None if !rules.seed_defaults => Err(ConfigError::Validation(
            "rules.seed_defaults is false and no rules.path is configured; the engine would price \
             every service at base plus tax"
                .to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    rules: Option<RulesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    tax_rate: Option<Decimal>,
    quote_validity_hours: Option<u32>,
    default_currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    seed_defaults: Option<bool>,
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use chrono::Duration;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const TOURFARE_VARS: &[&str] = &[
        "TOURFARE_PRICING_TAX_RATE",
        "TOURFARE_PRICING_QUOTE_VALIDITY_HOURS",
        "TOURFARE_PRICING_DEFAULT_CURRENCY",
        "TOURFARE_RULES_SEED_DEFAULTS",
        "TOURFARE_RULES_PATH",
        "TOURFARE_LOGGING_LEVEL",
        "TOURFARE_LOG_LEVEL",
        "TOURFARE_LOGGING_FORMAT",
        "TOURFARE_LOG_FORMAT",
        "TEST_TOURFARE_TAX",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_flat_tax_policy() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(TOURFARE_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        let policy = config.pricing.policy();

        ensure(policy.tax_rate == Decimal::new(10, 2), "default tax rate should be 10%")?;
        ensure(policy.quote_validity == Duration::hours(24), "default validity should be 24h")?;
        ensure(config.rules.seed_defaults, "default rule seed should be enabled")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(TOURFARE_VARS);

        env::set_var("TEST_TOURFARE_TAX", "0.08");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tourfare.toml");
            fs::write(
                &path,
                r#"
[pricing]
tax_rate = "${TEST_TOURFARE_TAX}"
quote_validity_hours = 6
default_currency = "VND"

[rules]
path = "rules/hanoi.json"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.pricing.tax_rate == Decimal::new(8, 2),
                "tax rate should be interpolated from environment",
            )?;
            ensure(config.pricing.quote_validity_hours == 6, "validity hours should load")?;
            ensure(config.pricing.default_currency == "VND", "currency should load from file")?;
            ensure(
                config.rules.path == Some(PathBuf::from("rules/hanoi.json")),
                "rules path should load from file",
            )
        })();

        clear_vars(&["TEST_TOURFARE_TAX"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(TOURFARE_VARS);

        env::set_var("TOURFARE_PRICING_TAX_RATE", "0.05");
        env::set_var("TOURFARE_LOG_LEVEL", "warn");
        env::set_var("TOURFARE_RULES_PATH", "rules/from-env.json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tourfare.toml");
            fs::write(
                &path,
                r#"
[pricing]
tax_rate = 0.12
default_currency = "EUR"

[logging]
level = "error"
format = "json"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    rules_path: Some(PathBuf::from("rules/from-flag.json")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.pricing.tax_rate == Decimal::new(5, 2), "env tax rate should win")?;
            ensure(config.pricing.default_currency == "EUR", "file currency should win")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                config.rules.path == Some(PathBuf::from("rules/from-flag.json")),
                "override rules path should win over env",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "file log format should win over default",
            )
        })();

        clear_vars(TOURFARE_VARS);
        result
    }

    #[test]
    fn invalid_env_override_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(TOURFARE_VARS);

        env::set_var("TOURFARE_PRICING_QUOTE_VALIDITY_HOURS", "a day");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override to fail".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "TOURFARE_PRICING_QUOTE_VALIDITY_HOURS",
                "error should name the offending variable",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(TOURFARE_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(TOURFARE_VARS);

        let cases = [
            ("TOURFARE_PRICING_TAX_RATE", "10", "pricing.tax_rate"),
            ("TOURFARE_PRICING_DEFAULT_CURRENCY", "usd", "pricing.default_currency"),
            ("TOURFARE_LOGGING_LEVEL", "verbose", "logging.level"),
        ];

        for (var, value, expected) in cases {
            clear_vars(TOURFARE_VARS);
            env::set_var(var, value);
            let outcome = AppConfig::load(LoadOptions::default());
            clear_vars(TOURFARE_VARS);

            let error = match outcome {
                Ok(_) => return Err(format!("expected validation failure for {expected}")),
                Err(error) => error,
            };
            let mentions_field =
                matches!(error, ConfigError::Validation(ref message) if message.contains(expected));
            ensure(mentions_field, "validation failure should mention the offending field")?;
        }

        let flagged = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                log_level: Some("verbose".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });
        let rejected = matches!(
            flagged,
            Err(ConfigError::Validation(ref message)) if message.contains("logging.level")
        );
        ensure(rejected, "flag overrides are validated like every other source")?;

        Ok(())
    }

    #[test]
    fn disabling_seed_without_rule_file_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(TOURFARE_VARS);

        env::set_var("TOURFARE_RULES_SEED_DEFAULTS", "false");
        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected rules validation failure".to_string()),
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("rules.seed_defaults"), "error should mention the seed")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(TOURFARE_VARS);
        result
    }

    #[test]
    fn missing_required_file_is_reported() {
        let options = LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/tourfare.toml")),
            require_file: true,
            ..LoadOptions::default()
        };

        assert!(matches!(AppConfig::load(options), Err(ConfigError::MissingConfigFile(_))));
    }
}
