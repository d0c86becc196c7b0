pub mod rule_group;

pub use rule_group::{RemoteWriteConfig, Rule, RuleGroup, RuleNamespace, RuleSet};
