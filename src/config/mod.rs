//! Configuration context and fluent builders

pub mod configuration;
pub mod naming;
pub mod rule_builder;
pub mod target_builder;

pub use configuration::Configuration;
pub use naming::{ensure_unique_name, short_display_name};
pub use rule_builder::RuleBuilder;
pub use target_builder::{TargetBuilder, TargetChain};
