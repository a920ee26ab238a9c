pub mod fixtures;
pub mod memory;
pub mod rule_file;

pub use fixtures::default_rules;
pub use memory::InMemoryRuleRepository;
pub use rule_file::{load_rules, RuleFileError};
