use std::env;
use std::fs;
use std::path::Path;

use tourfare_core::config::{resolve_config_path, AppConfig, ConfigOverrides, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    flag: Option<&'static str>,
    value: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let overrides = options.overrides.clone();

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("config", error),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: override > env > file > default):".to_string()];
    for field in fields(&config, &overrides) {
        let source = match field.flag {
            Some(flag) => format!("override ({flag})"),
            None => field_source(
                field.key,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        };
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig, overrides: &ConfigOverrides) -> Vec<Field> {
    vec![
        Field {
            key: "pricing.tax_rate",
            env_keys: &["TOURFARE_PRICING_TAX_RATE"],
            flag: None,
            value: config.pricing.tax_rate.to_string(),
        },
        Field {
            key: "pricing.quote_validity_hours",
            env_keys: &["TOURFARE_PRICING_QUOTE_VALIDITY_HOURS"],
            flag: None,
            value: config.pricing.quote_validity_hours.to_string(),
        },
        Field {
            key: "pricing.default_currency",
            env_keys: &["TOURFARE_PRICING_DEFAULT_CURRENCY"],
            flag: None,
            value: config.pricing.default_currency.clone(),
        },
        Field {
            key: "rules.seed_defaults",
            env_keys: &["TOURFARE_RULES_SEED_DEFAULTS"],
            flag: None,
            value: config.rules.seed_defaults.to_string(),
        },
        Field {
            key: "rules.path",
            env_keys: &["TOURFARE_RULES_PATH"],
            flag: overrides.rules_path.as_ref().map(|_| "--rules"),
            value: config
                .rules
                .path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |path| path.display().to_string()),
        },
        Field {
            key: "logging.level",
            env_keys: &["TOURFARE_LOGGING_LEVEL", "TOURFARE_LOG_LEVEL"],
            flag: overrides.log_level.as_ref().map(|_| "--log-level"),
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["TOURFARE_LOGGING_FORMAT", "TOURFARE_LOG_FORMAT"],
            flag: overrides.log_format.map(|_| "--log-format"),
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env = env_keys
        .iter()
        .find(|env_key| env::var(**env_key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
