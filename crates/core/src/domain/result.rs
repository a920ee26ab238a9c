use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::context::PricingContext;
use crate::domain::rule::{PricingAdjustment, RuleId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub adjustment: PricingAdjustment,
    pub price_after_rule: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    pub discounts: Decimal,
    pub surcharges: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub original_price: Decimal,
    pub final_price: Decimal,
    pub currency: String,
    pub applied_rules: Vec<AppliedRule>,
    pub breakdown: PriceBreakdown,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl PricingResult {
    /// Degraded result: the base price untaxed and stale as of `now`. A
    /// negative base price is reported as zero.
    pub fn fallback(context: &PricingContext, now: DateTime<Utc>) -> Self {
        let price = context.base_price.max(Decimal::ZERO);
        Self {
            original_price: context.base_price,
            final_price: price,
            currency: context.currency.clone(),
            applied_rules: Vec::new(),
            breakdown: PriceBreakdown {
                base_price: price,
                discounts: Decimal::ZERO,
                surcharges: Decimal::ZERO,
                taxes: Decimal::ZERO,
                total: price,
            },
            valid_until: now,
            is_fallback: true,
        }
    }
}
