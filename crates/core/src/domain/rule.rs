use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Unexpected, Visitor};
use serde::{ser, Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::service::ServiceType;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: RuleId,
    pub name: String,
    pub service_type: ServiceType,
    pub condition: PricingCondition,
    pub adjustment: PricingAdjustment,
    pub priority: i32,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
}

impl PricingRule {
    /// Both bounds are inclusive; a missing bound leaves that side open.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from.map_or(true, |from| from <= date)
            && self.valid_to.map_or(true, |to| date <= to)
    }

    pub fn applies_to(&self, service_type: ServiceType, date: NaiveDate) -> bool {
        self.is_active && self.service_type == service_type && self.is_valid_on(date)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingCondition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub operator: ConditionOperator,
    pub value: ConditionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConditionMetadata>,
}

impl PricingCondition {
    pub fn new(kind: ConditionKind, operator: ConditionOperator, value: ConditionValue) -> Self {
        Self { kind, operator, value, metadata: None }
    }

    pub fn with_metric(mut self, metric: DemandMetric) -> Self {
        self.metadata = Some(ConditionMetadata { metric: Some(metric) });
        self
    }
}

/// Unrecognized tags deserialize to `Unknown` so a single bad rule cannot
/// reject a whole rule set; evaluation treats `Unknown` as a non-match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Seasonal,
    Demand,
    Duration,
    AdvanceBooking,
    GroupSize,
    DayOfWeek,
    Location,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    GreaterThan,
    LessThan,
    Between,
    In,
    NotIn,
    #[serde(other)]
    Unknown,
}

/// A JSON string is always `Text`, even when it looks numeric (postal codes,
/// province codes); only JSON numbers become `Number`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConditionScalar {
    Number(Decimal),
    Text(String),
}

impl Serialize for ConditionScalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let number = match self {
            Self::Text(text) => return serializer.serialize_str(text),
            Self::Number(number) => number,
        };
        if number.scale() == 0 {
            if let Some(whole) = number.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }
        match number.to_f64() {
            Some(float) => serializer.serialize_f64(float),
            None => Err(ser::Error::custom(format!("{number} is not representable as a number"))),
        }
    }
}

impl<'de> Deserialize<'de> for ConditionScalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = ConditionScalar;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON number or string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(ConditionScalar::Number(Decimal::from(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(ConditionScalar::Number(Decimal::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        // Through the shortest decimal rendering so 0.8 stays 0.8.
        Decimal::from_str(&value.to_string())
            .map(ConditionScalar::Number)
            .map_err(|_| E::invalid_value(Unexpected::Float(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(ConditionScalar::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(ConditionScalar::Text(value))
    }
}

impl ConditionScalar {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Number(_) => None,
        }
    }
}

/// Payload compared against the context. `between` expects a two-element
/// numeric list, `in`/`not_in` expect a list, the rest expect a scalar.
/// Anything else (booleans, nulls, objects, lists with such members) loads as
/// `Unsupported` and never matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Scalar(ConditionScalar),
    List(Vec<ConditionScalar>),
    Unsupported(serde_json::Value),
}

impl ConditionValue {
    pub fn number(value: impl Into<Decimal>) -> Self {
        Self::Scalar(ConditionScalar::Number(value.into()))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(ConditionScalar::Text(value.into()))
    }

    pub fn range(low: impl Into<Decimal>, high: impl Into<Decimal>) -> Self {
        Self::List(vec![ConditionScalar::Number(low.into()), ConditionScalar::Number(high.into())])
    }

    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|value| ConditionScalar::Text(value.into())).collect())
    }

    pub fn as_scalar(&self) -> Option<&ConditionScalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            Self::List(_) | Self::Unsupported(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConditionScalar]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            Self::Scalar(_) | Self::Unsupported(_) => None,
        }
    }

    /// Inclusive `[low, high]` bounds when the payload is exactly two numbers.
    pub fn as_range(&self) -> Option<(Decimal, Decimal)> {
        match self.as_list()? {
            [low, high] => Some((low.as_number()?, high.as_number()?)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<DemandMetric>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandMetric {
    #[default]
    OccupancyRate,
    PopularityScore,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingAdjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub rounding_rule: RoundingRule,
}

impl PricingAdjustment {
    pub fn percentage(value: impl Into<Decimal>) -> Self {
        Self::new(AdjustmentKind::Percentage, value.into())
    }

    pub fn fixed_amount(value: impl Into<Decimal>) -> Self {
        Self::new(AdjustmentKind::FixedAmount, value.into())
    }

    pub fn replace(value: impl Into<Decimal>) -> Self {
        Self::new(AdjustmentKind::Replace, value.into())
    }

    fn new(kind: AdjustmentKind, value: Decimal) -> Self {
        Self { kind, value, currency: None, rounding_rule: RoundingRule::None }
    }

    pub fn rounded(mut self, rounding_rule: RoundingRule) -> Self {
        self.rounding_rule = rounding_rule;
        self
    }

    pub fn in_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Percentages are currency-neutral; absolute amounts only make sense in
    /// the currency they were written in.
    pub fn is_currency_bound(&self) -> bool {
        matches!(self.kind, AdjustmentKind::FixedAmount | AdjustmentKind::Replace)
    }

    /// False only for a currency-bound adjustment written in another currency
    /// (ASCII case-insensitive). An adjustment without a currency matches any.
    pub fn matches_currency(&self, currency: &str) -> bool {
        if !self.is_currency_bound() {
            return true;
        }
        self.currency.as_deref().map_or(true, |own| own.eq_ignore_ascii_case(currency))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Percentage,
    FixedAmount,
    Replace,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    #[default]
    None,
    Round,
    Floor,
    Ceil,
}
