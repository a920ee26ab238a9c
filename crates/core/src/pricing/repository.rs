use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::rule::PricingRule;
use crate::domain::service::ServiceType;
use crate::errors::RepositoryError;

/// Source of the rule set the engine evaluates. Storage, caching and rule
/// CRUD belong to implementations; the engine only reads.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Active rules for `service_type` whose validity window contains the
    /// calendar date of `as_of`.
    async fn get_active_rules(
        &self,
        service_type: ServiceType,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PricingRule>, RepositoryError>;
}

pub fn select_active_rules<'a, I>(
    rules: I,
    service_type: ServiceType,
    as_of: NaiveDate,
) -> Vec<PricingRule>
where
    I: IntoIterator<Item = &'a PricingRule>,
{
    rules.into_iter().filter(|rule| rule.applies_to(service_type, as_of)).cloned().collect()
}
