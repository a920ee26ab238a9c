pub mod config;
pub mod doctor;
pub mod quote;
pub mod rules;
pub mod season;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tourfare_core::config::AppConfig;
use tourfare_store::{InMemoryRuleRepository, RuleFileError};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_outcome(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_outcome(payload) }
    }

    pub fn config_failure(command: &str, error: impl fmt::Display) -> Self {
        Self::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    }

    pub fn input_failure(command: &str, message: impl Into<String>) -> Self {
        Self::failure(command, "invalid_input", message, EXIT_INPUT)
    }

    /// Successful command whose output is a document rather than a message.
    pub fn document<T: Serialize>(command: &str, document: &T) -> Self {
        match serde_json::to_string_pretty(document) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_INPUT),
        }
    }
}

fn serialize_outcome(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Where a command's rules came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file ({})", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Serves `rules.path` when one is configured (a `--rules` flag lands there
/// as an override), otherwise the seeded defaults.
pub fn open_rule_repository(
    config: &AppConfig,
) -> Result<(InMemoryRuleRepository, RuleSource), RuleFileError> {
    match config.rules.path.as_deref() {
        Some(path) => {
            let repository = InMemoryRuleRepository::from_file(path)?;
            Ok((repository, RuleSource::File(path.to_path_buf())))
        }
        None => Ok((InMemoryRuleRepository::seeded(), RuleSource::Defaults)),
    }
}

pub(crate) fn current_thread_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}
