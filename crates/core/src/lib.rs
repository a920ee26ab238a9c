pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use domain::context::{DemandFactors, PricingContext, SeasonalFactors};
pub use domain::result::{AppliedRule, PriceBreakdown, PricingResult};
pub use domain::rule::{
    AdjustmentKind, ConditionKind, ConditionMetadata, ConditionOperator, ConditionScalar,
    ConditionValue, DemandMetric, PricingAdjustment, PricingCondition, PricingRule, RoundingRule,
    RuleId,
};
pub use domain::service::{ServiceId, ServiceType};
pub use errors::{PricingError, RepositoryError};
pub use pricing::{
    lint_rules, lint_rules_for_currency, season_of, AdjustmentApplier, Clock, ConditionEvaluator,
    DeterministicAdjustmentApplier, DeterministicConditionEvaluator, FixedClock, PricingEngine,
    PricingPolicy, RuleBasedPricingEngine, RuleIssue, RuleLintReport, RuleRepository, Season,
    SeasonalCalendar, SystemClock,
};
