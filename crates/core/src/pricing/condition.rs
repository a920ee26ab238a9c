use chrono::{Datelike, Weekday};
use rust_decimal::Decimal;

use crate::domain::context::PricingContext;
use crate::domain::rule::{
    ConditionKind, ConditionOperator, ConditionValue, DemandMetric, PricingCondition,
};
use crate::errors::PricingError;
use crate::pricing::calendar::SeasonalCalendar;

/// Decides whether a rule's condition holds for a context.
///
/// Implementations must be fail-closed: anything they cannot interpret is a
/// non-match. An `Err` is reserved for genuine faults and makes the engine
/// fall back to the base price.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        condition: &PricingCondition,
        context: &PricingContext,
    ) -> Result<bool, PricingError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicConditionEvaluator {
    calendar: SeasonalCalendar,
}

impl DeterministicConditionEvaluator {
    pub fn new(calendar: SeasonalCalendar) -> Self {
        Self { calendar }
    }
}

impl ConditionEvaluator for DeterministicConditionEvaluator {
    fn evaluate(
        &self,
        condition: &PricingCondition,
        context: &PricingContext,
    ) -> Result<bool, PricingError> {
        Ok(evaluate_condition(&self.calendar, condition, context))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Subject<'a> {
    Number(Decimal),
    Text(&'a str),
}

pub fn evaluate_condition(
    calendar: &SeasonalCalendar,
    condition: &PricingCondition,
    context: &PricingContext,
) -> bool {
    match subject_of(calendar, condition, context) {
        Some(Subject::Number(subject)) => {
            compare_number(subject, condition.operator, &condition.value)
        }
        Some(Subject::Text(subject)) => compare_text(subject, condition.operator, &condition.value),
        None => false,
    }
}

fn subject_of<'a>(
    calendar: &SeasonalCalendar,
    condition: &PricingCondition,
    context: &'a PricingContext,
) -> Option<Subject<'a>> {
    match condition.kind {
        ConditionKind::Seasonal => {
            let season = calendar.season_of(context.service_date.date_naive());
            Some(Subject::Text(season.label()))
        }
        ConditionKind::AdvanceBooking => {
            Some(Subject::Number(Decimal::from(context.advance_days())))
        }
        ConditionKind::GroupSize => context.group_size.map(|size| Subject::Number(size.into())),
        ConditionKind::DayOfWeek => {
            Some(Subject::Text(weekday_name(context.service_date.weekday())))
        }
        ConditionKind::Demand => {
            let demand = context.demand_factors.as_ref()?;
            let metric = condition
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.metric)
                .unwrap_or_default();
            match metric {
                DemandMetric::OccupancyRate => Some(Subject::Number(demand.occupancy_rate())),
                DemandMetric::PopularityScore => Some(Subject::Number(demand.popularity_score)),
                DemandMetric::Unknown => None,
            }
        }
        ConditionKind::Duration => context.duration.map(|days| Subject::Number(days.into())),
        ConditionKind::Location => context.location.as_deref().map(Subject::Text),
        ConditionKind::Unknown => None,
    }
}

fn compare_number(subject: Decimal, operator: ConditionOperator, value: &ConditionValue) -> bool {
    let scalar = || value.as_scalar().and_then(|scalar| scalar.as_number());

    match operator {
        ConditionOperator::Equals => scalar() == Some(subject),
        ConditionOperator::GreaterThan => scalar().is_some_and(|threshold| subject > threshold),
        ConditionOperator::LessThan => scalar().is_some_and(|threshold| subject < threshold),
        ConditionOperator::Between => {
            value.as_range().is_some_and(|(low, high)| low <= subject && subject <= high)
        }
        ConditionOperator::In | ConditionOperator::NotIn | ConditionOperator::Unknown => false,
    }
}

fn compare_text(subject: &str, operator: ConditionOperator, value: &ConditionValue) -> bool {
    let contains = |values: &[crate::domain::rule::ConditionScalar]| {
        values.iter().any(|candidate| candidate.as_text() == Some(subject))
    };

    match operator {
        ConditionOperator::Equals => {
            value.as_scalar().and_then(|scalar| scalar.as_text()) == Some(subject)
        }
        ConditionOperator::In => value.as_list().is_some_and(contains),
        ConditionOperator::NotIn => value.as_list().is_some_and(|values| !contains(values)),
        ConditionOperator::GreaterThan
        | ConditionOperator::LessThan
        | ConditionOperator::Between
        | ConditionOperator::Unknown => false,
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
