pub mod adjustment;
pub mod calendar;
pub mod clock;
pub mod condition;
pub mod engine;
pub mod lint;
pub mod repository;

pub use adjustment::{AdjustmentApplier, DeterministicAdjustmentApplier};
pub use calendar::{season_of, Season, SeasonalCalendar};
pub use clock::{Clock, FixedClock, SystemClock};
pub use condition::{ConditionEvaluator, DeterministicConditionEvaluator};
pub use engine::{PricingEngine, PricingPolicy, RuleBasedPricingEngine};
pub use lint::{lint_rules, lint_rules_for_currency, RuleIssue, RuleLintReport};
pub use repository::{select_active_rules, RuleRepository};
