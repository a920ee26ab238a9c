use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::Duration;
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use crate::domain::context::PricingContext;
use crate::domain::result::{AppliedRule, PriceBreakdown, PricingResult};
use crate::domain::rule::PricingRule;
use crate::errors::{PricingError, RepositoryError};
use crate::pricing::adjustment::{
    round_half_up, AdjustmentApplier, DeterministicAdjustmentApplier,
};
use crate::pricing::clock::{Clock, SystemClock};
use crate::pricing::condition::{ConditionEvaluator, DeterministicConditionEvaluator};
use crate::pricing::repository::RuleRepository;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Flat rate applied to the adjusted price, e.g. `0.10` for 10%.
    pub tax_rate: Decimal,
    /// How long a computed price may be served from cache.
    pub quote_validity: Duration,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { tax_rate: Decimal::new(10, 2), quote_validity: Duration::hours(24) }
    }
}

pub trait PricingEngine: Send + Sync {
    /// Prices `context` against `rules`. Infallible: internal faults produce
    /// the fallback result.
    fn calculate(&self, context: &PricingContext, rules: &[PricingRule]) -> PricingResult;
}

pub struct RuleBasedPricingEngine<E, A, C> {
    evaluator: E,
    applier: A,
    clock: C,
    policy: PricingPolicy,
}

impl<E, A, C> RuleBasedPricingEngine<E, A, C> {
    pub fn new(evaluator: E, applier: A, clock: C) -> Self {
        Self { evaluator, applier, clock, policy: PricingPolicy::default() }
    }

    pub fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

impl Default
    for RuleBasedPricingEngine<
        DeterministicConditionEvaluator,
        DeterministicAdjustmentApplier,
        SystemClock,
    >
{
    fn default() -> Self {
        Self::new(
            DeterministicConditionEvaluator::default(),
            DeterministicAdjustmentApplier,
            SystemClock,
        )
    }
}

impl<E, A, C> RuleBasedPricingEngine<E, A, C>
where
    E: ConditionEvaluator,
    A: AdjustmentApplier,
    C: Clock,
{
    /// Fetches the active rules for the context and prices it. A failed fetch
    /// is not retried; it degrades to the fallback result.
    pub async fn quote<R>(&self, repository: &R, context: &PricingContext) -> PricingResult
    where
        R: RuleRepository + ?Sized,
    {
        let rules = repository.get_active_rules(context.service_type, context.booking_date).await;
        self.calculate_fetched(context, rules)
    }

    pub fn calculate_fetched(
        &self,
        context: &PricingContext,
        rules: Result<Vec<PricingRule>, RepositoryError>,
    ) -> PricingResult {
        match rules {
            Ok(rules) => self.calculate(context, &rules),
            Err(error) => {
                let error = PricingError::from(error);
                warn!(
                    event_name = "pricing.engine.rule_fetch_failed",
                    service_id = %context.service_id.0,
                    service_type = %context.service_type,
                    error_class = error.class(),
                    error = %error,
                    "rule fetch failed; pricing at base price"
                );
                PricingResult::fallback(context, self.clock.now())
            }
        }
    }

    fn try_calculate(
        &self,
        context: &PricingContext,
        rules: &[PricingRule],
    ) -> Result<PricingResult, PricingError> {
        let as_of = context.booking_date.date_naive();
        let mut applicable: Vec<&PricingRule> = rules
            .iter()
            .filter(|rule| rule.applies_to(context.service_type, as_of))
            .filter(|rule| priced_in_currency(rule, &context.currency))
            .collect();
        applicable.sort_by_key(|rule| rule.priority);

        let starting_price = context.base_price.max(Decimal::ZERO);
        if context.base_price < Decimal::ZERO {
            warn!(
                event_name = "pricing.engine.negative_base_price",
                service_id = %context.service_id.0,
                base_price = %context.base_price,
                "negative base price clamped to zero"
            );
        }

        let mut current = starting_price;
        let mut discounts = Decimal::ZERO;
        let mut surcharges = Decimal::ZERO;
        let mut applied_rules = Vec::new();

        for rule in applicable {
            if !self.evaluator.evaluate(&rule.condition, context)? {
                continue;
            }

            let next = self.applier.apply(current, &rule.adjustment)?.normalize();
            if next < Decimal::ZERO {
                return Err(PricingError::Applier(format!(
                    "rule {} produced negative price {next}",
                    rule.id.0
                )));
            }
            let delta = next
                .checked_sub(current)
                .ok_or(PricingError::Arithmetic { operation: "rule delta" })?;
            if delta.is_sign_negative() {
                discounts = discounts
                    .checked_add(delta.abs())
                    .ok_or(PricingError::Arithmetic { operation: "discount total" })?;
            } else {
                surcharges = surcharges
                    .checked_add(delta)
                    .ok_or(PricingError::Arithmetic { operation: "surcharge total" })?;
            }

            debug!(
                event_name = "pricing.engine.rule_applied",
                rule_id = %rule.id.0,
                priority = rule.priority,
                price_after_rule = %next,
                "pricing rule applied"
            );
            applied_rules.push(AppliedRule {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                adjustment: rule.adjustment.clone(),
                price_after_rule: next,
            });
            current = next;
        }

        let taxes = current
            .checked_mul(self.policy.tax_rate)
            .ok_or(PricingError::Arithmetic { operation: "tax" })?
            .normalize();
        let gross = current
            .checked_add(taxes)
            .ok_or(PricingError::Arithmetic { operation: "taxed total" })?;
        let final_price = round_half_up(gross).normalize();

        debug!(
            event_name = "pricing.engine.calculated",
            service_id = %context.service_id.0,
            applied_rules = applied_rules.len(),
            final_price = %final_price,
            "price calculated"
        );

        Ok(PricingResult {
            original_price: context.base_price,
            final_price,
            currency: context.currency.clone(),
            applied_rules,
            breakdown: PriceBreakdown {
                base_price: starting_price,
                discounts,
                surcharges,
                taxes,
                total: final_price,
            },
            valid_until: self.clock.now() + self.policy.quote_validity,
            is_fallback: false,
        })
    }

    fn fallback(&self, context: &PricingContext, error: &PricingError) -> PricingResult {
        error!(
            event_name = "pricing.engine.fallback",
            service_id = %context.service_id.0,
            service_type = %context.service_type,
            error_class = error.class(),
            error = %error,
            "pricing failed; returning base price"
        );
        PricingResult::fallback(context, self.clock.now())
    }
}

impl<E, A, C> PricingEngine for RuleBasedPricingEngine<E, A, C>
where
    E: ConditionEvaluator,
    A: AdjustmentApplier,
    C: Clock,
{
    fn calculate(&self, context: &PricingContext, rules: &[PricingRule]) -> PricingResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_calculate(context, rules)))
            .unwrap_or_else(|payload| Err(PricingError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(result) => result,
            Err(error) => self.fallback(context, &error),
        }
    }
}

/// Absolute adjustments written in another currency make the rule ineligible
/// for the context, like a rule for another service type. Such a rule is never
/// evaluated and never appears in `applied_rules`.
fn priced_in_currency(rule: &PricingRule, currency: &str) -> bool {
    if rule.adjustment.matches_currency(currency) {
        return true;
    }
    debug!(
        event_name = "pricing.engine.rule_ineligible",
        rule_id = %rule.id.0,
        reason = "currency_mismatch",
        "adjustment currency differs from context currency"
    );
    false
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}
