use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use tourfare_core::domain::rule::PricingRule;

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("could not read rule file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse rule file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Reads a JSON array of rules. Unknown condition or operator tags load as
/// `unknown` and odd condition values load as unsupported, rather than
/// failing the file. Such rules never match.
pub fn load_rules(path: &Path) -> Result<Vec<PricingRule>, RuleFileError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| RuleFileError::Read { path: path.to_path_buf(), source })?;
    let rules: Vec<PricingRule> = serde_json::from_str(&raw)
        .map_err(|source| RuleFileError::Parse { path: path.to_path_buf(), source })?;

    info!(
        event_name = "store.rules.loaded",
        path = %path.display(),
        rule_count = rules.len(),
        "pricing rules loaded from file"
    );
    Ok(rules)
}
