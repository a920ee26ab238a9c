use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tourfare_core::domain::rule::PricingRule;
use tourfare_core::domain::service::ServiceType;
use tourfare_core::errors::RepositoryError;
use tourfare_core::pricing::{select_active_rules, RuleRepository};

use crate::fixtures::default_rules;
use crate::rule_file::{load_rules, RuleFileError};

#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<Vec<PricingRule>>,
}

impl InMemoryRuleRepository {
    pub fn new(rules: Vec<PricingRule>) -> Self {
        Self { rules: RwLock::new(rules) }
    }

    pub fn seeded() -> Self {
        Self::new(default_rules())
    }

    pub fn from_file(path: &Path) -> Result<Self, RuleFileError> {
        Ok(Self::new(load_rules(path)?))
    }

    /// Inserts `rule`, replacing any stored rule with the same id.
    pub async fn upsert(&self, rule: PricingRule) {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }

    /// Every stored rule, active or not, in priority order.
    pub async fn list(&self) -> Vec<PricingRule> {
        let mut rules = self.rules.read().await.clone();
        rules.sort_by(|left, right| {
            left.priority.cmp(&right.priority).then_with(|| left.id.0.cmp(&right.id.0))
        });
        rules
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn get_active_rules(
        &self,
        service_type: ServiceType,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PricingRule>, RepositoryError> {
        let rules = self.rules.read().await;
        let mut active = select_active_rules(rules.iter(), service_type, as_of.date_naive());
        active.sort_by_key(|rule| rule.priority);
        Ok(active)
    }
}
