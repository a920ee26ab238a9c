use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::rule::{AdjustmentKind, PricingAdjustment, RoundingRule};
use crate::errors::PricingError;

pub trait AdjustmentApplier: Send + Sync {
    fn apply(&self, price: Decimal, adjustment: &PricingAdjustment)
        -> Result<Decimal, PricingError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicAdjustmentApplier;

impl AdjustmentApplier for DeterministicAdjustmentApplier {
    fn apply(
        &self,
        price: Decimal,
        adjustment: &PricingAdjustment,
    ) -> Result<Decimal, PricingError> {
        apply_adjustment(price, adjustment)
    }
}

/// Applies one adjustment to the running price. The result never drops below
/// zero, and the adjustment's own rounding rule is applied last.
pub fn apply_adjustment(
    price: Decimal,
    adjustment: &PricingAdjustment,
) -> Result<Decimal, PricingError> {
    let adjusted = match adjustment.kind {
        AdjustmentKind::Percentage => {
            let factor = Decimal::ONE
                .checked_add(adjustment.value / Decimal::ONE_HUNDRED)
                .ok_or(PricingError::Arithmetic { operation: "percentage factor" })?;
            price
                .checked_mul(factor)
                .ok_or(PricingError::Arithmetic { operation: "percentage adjustment" })?
        }
        AdjustmentKind::FixedAmount => price
            .checked_add(adjustment.value)
            .ok_or(PricingError::Arithmetic { operation: "fixed amount adjustment" })?,
        AdjustmentKind::Replace => adjustment.value,
    };

    Ok(apply_rounding(adjusted.max(Decimal::ZERO), adjustment.rounding_rule))
}

pub fn apply_rounding(price: Decimal, rule: RoundingRule) -> Decimal {
    match rule {
        RoundingRule::None => price,
        RoundingRule::Round => round_half_up(price),
        RoundingRule::Floor => price.floor(),
        RoundingRule::Ceil => price.ceil(),
    }
}

/// Nearest whole unit, ties toward positive infinity.
pub fn round_half_up(price: Decimal) -> Decimal {
    if price.is_sign_negative() {
        return (price + Decimal::new(5, 1)).floor();
    }
    price.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
