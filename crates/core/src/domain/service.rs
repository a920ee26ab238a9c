use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(pub String);

/// Catalog category a service is sold under. Rules are scoped to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Tour,
    Hotel,
    Transport,
    Activity,
    Restaurant,
    Flight,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        Self::Tour,
        Self::Hotel,
        Self::Transport,
        Self::Activity,
        Self::Restaurant,
        Self::Flight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tour => "tour",
            Self::Hotel => "hotel",
            Self::Transport => "transport",
            Self::Activity => "activity",
            Self::Restaurant => "restaurant",
            Self::Flight => "flight",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported service type `{0}` (expected tour|hotel|transport|activity|restaurant|flight)")]
pub struct UnknownServiceType(pub String);

impl FromStr for ServiceType {
    type Err = UnknownServiceType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|service_type| service_type.as_str() == normalized)
            .ok_or_else(|| UnknownServiceType(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceType;

    #[test]
    fn parses_service_type_case_insensitively() {
        assert_eq!(" Hotel ".parse::<ServiceType>(), Ok(ServiceType::Hotel));
        assert!("cruise".parse::<ServiceType>().is_err());
    }

    #[test]
    fn serializes_as_snake_case_tag() {
        let json = serde_json::to_string(&ServiceType::Restaurant).expect("serialize");
        assert_eq!(json, "\"restaurant\"");
    }
}
