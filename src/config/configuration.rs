//! The configuration context: ordered rules plus the registry of named targets

use super::naming::ensure_unique_name;
use super::rule_builder::RuleBuilder;
use super::target_builder::TargetBuilder;
use crate::core::{
    error::{LoggerError, Result},
    internal_log,
    log_level::LogLevel,
    logging_rule::{LoggingRule, RuleId},
};
use crate::targets::{Target, TargetRef, YieldAll};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Rules and targets under construction.
///
/// Built on one thread, then handed to [`crate::LogFactory::set_configuration`],
/// which freezes it for dispatch.
#[derive(Debug, Default)]
pub struct Configuration {
    rules: Vec<LoggingRule>,
    targets: Vec<TargetRef>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a rule for loggers matching `pattern` (`*` wildcards), with every level enabled
    pub fn for_logger(&mut self, pattern: &str) -> RuleBuilder<'_> {
        RuleBuilder::new(self, LoggingRule::new(pattern))
    }

    /// Start a rule for loggers matching `pattern`, enabled from `min_level` upward
    pub fn for_logger_min(&mut self, min_level: LogLevel, pattern: &str) -> RuleBuilder<'_> {
        let mut rule = LoggingRule::new(pattern);
        rule.levels.set_range(min_level, LogLevel::MAX);
        RuleBuilder::new(self, rule)
    }

    /// Collect targets without a rule; `name` goes to the first unnamed target written
    pub fn for_target(&mut self, name: Option<&str>) -> TargetBuilder<'_> {
        TargetBuilder::new(self, name.map(str::to_string))
    }

    pub fn rules(&self) -> &[LoggingRule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&LoggingRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn rule_mut(&mut self, id: RuleId) -> Option<&mut LoggingRule> {
        self.rules.iter_mut().find(|r| r.id() == id)
    }

    pub fn position_of(&self, id: RuleId) -> Option<usize> {
        self.rules.iter().position(|r| r.id() == id)
    }

    pub fn contains_rule(&self, id: RuleId) -> bool {
        self.position_of(id).is_some()
    }

    pub fn add_rule(&mut self, rule: LoggingRule) -> RuleId {
        let id = rule.id();
        self.rules.push(rule);
        id
    }

    /// Insert at `index`, clamped to the end of the list
    pub fn insert_rule(&mut self, index: usize, rule: LoggingRule) -> RuleId {
        let id = rule.id();
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
        id
    }

    pub fn remove_rule(&mut self, id: RuleId) -> Option<LoggingRule> {
        let index = self.position_of(id)?;
        Some(self.rules.remove(index))
    }

    /// Targets registered by name, in registration order
    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }

    /// Registered targets, rule targets and everything reachable below them, each once
    pub fn all_targets(&self) -> Vec<TargetRef> {
        let roots = self
            .targets
            .iter()
            .chain(self.rules.iter().flat_map(|r| r.targets.iter()));

        let mut seen = HashSet::new();
        YieldAll::over(roots)
            .filter(|t| seen.insert(Arc::as_ptr(t)))
            .collect()
    }

    pub fn find_target_by_name(&self, name: &str) -> Option<TargetRef> {
        self.all_targets()
            .into_iter()
            .find(|t| t.name().as_deref() == Some(name))
    }

    /// Register an owned target, generating a unique name if it has none
    pub fn add_target(&mut self, target: Target) -> Result<TargetRef> {
        let target = Arc::new(target);
        self.register_target(&target)?;
        Ok(target)
    }

    /// Register a shared target. Registering the same target again is a no-op.
    pub fn register_target(&mut self, target: &TargetRef) -> Result<()> {
        if self.targets.iter().any(|t| Arc::ptr_eq(t, target)) {
            return Ok(());
        }

        let existing = self.all_targets();
        if target.has_name() {
            let name = target.display_name();
            let clash = existing
                .iter()
                .any(|t| !Arc::ptr_eq(t, target) && t.name().as_deref() == Some(name.as_str()));
            if clash {
                return Err(LoggerError::duplicate_target(name));
            }
        } else {
            target.set_name(ensure_unique_name(&existing, target, None));
        }

        internal_log::debug(format_args!(
            "Registered target '{}' ({})",
            target.display_name(),
            target.kind()
        ));
        self.targets.push(Arc::clone(target));
        Ok(())
    }

    /// Unregister by name and detach from every rule
    pub fn remove_target(&mut self, name: &str) -> Option<TargetRef> {
        let removed = self.find_target_by_name(name)?;
        self.targets.retain(|t| !Arc::ptr_eq(t, &removed));
        for rule in &mut self.rules {
            rule.targets.retain(|t| !Arc::ptr_eq(t, &removed));
        }
        Some(removed)
    }

    // Targets that are not the child of any other known target
    fn root_targets(&self) -> Vec<TargetRef> {
        let all = self.all_targets();
        let children: HashSet<*const Target> = all
            .iter()
            .flat_map(|t| t.children().iter().map(Arc::as_ptr))
            .collect();
        all.into_iter()
            .filter(|t| !children.contains(&Arc::as_ptr(t)))
            .collect()
    }

    /// Flush every target tree from its root; the first error is returned
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        let mut first_error = None;
        for target in self.root_targets() {
            if let Err(e) = target.flush(timeout) {
                internal_log::error(format_args!(
                    "Failed to flush target '{}': {}",
                    target.display_name(),
                    e
                ));
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Close every target tree from its root down
    pub fn close(&self, timeout: Duration) -> Result<()> {
        self.close_except(timeout, &HashSet::new())
    }

    /// Close every target except those in `keep`, which stay open along with their subtrees
    pub(crate) fn close_except(&self, timeout: Duration, keep: &HashSet<*const Target>) -> Result<()> {
        let mut first_error = None;
        for target in self.root_targets() {
            if let Err(e) = target.close_except(timeout, keep) {
                internal_log::error(format_args!(
                    "Failed to close target '{}': {}",
                    target.display_name(),
                    e
                ));
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, NullAppender};
    use crate::targets::RetryOptions;

    #[test]
    fn test_unnamed_targets_get_numbered_names() {
        let mut config = Configuration::new();
        let a = config.add_target(Target::terminal(NullAppender::new())).unwrap();
        let b = config.add_target(Target::terminal(NullAppender::new())).unwrap();

        assert_eq!(a.name().as_deref(), Some("Null"));
        assert_eq!(b.name().as_deref(), Some("Null_1"));
    }

    #[test]
    fn test_remove_then_add_never_collides() {
        let mut config = Configuration::new();
        config.add_target(Target::terminal(NullAppender::new())).unwrap();
        config.add_target(Target::terminal(NullAppender::new())).unwrap();

        assert!(config.remove_target("Null").is_some());
        let c = config.add_target(Target::terminal(NullAppender::new())).unwrap();

        let mut names: Vec<_> = config.targets().iter().filter_map(|t| t.name()).collect();
        names.sort();
        assert_eq!(names, vec!["Null", "Null_1"]);
        assert_eq!(c.name().as_deref(), Some("Null"));
    }

    #[test]
    fn test_duplicate_explicit_name_rejected() {
        let mut config = Configuration::new();
        config
            .add_target(Target::terminal(NullAppender::new()).with_name("sink"))
            .unwrap();
        let err = config
            .add_target(Target::terminal(NullAppender::new()).with_name("sink"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::DuplicateTargetName { .. }));
    }

    #[test]
    fn test_register_same_target_twice_is_noop() {
        let mut config = Configuration::new();
        let target = config.add_target(Target::terminal(NullAppender::new())).unwrap();
        config.register_target(&target).unwrap();
        assert_eq!(config.targets().len(), 1);
    }

    #[test]
    fn test_close_reaches_nested_targets() {
        let mut config = Configuration::new();
        let (memory, _handle) = MemoryAppender::new();
        let leaf = config.add_target(Target::terminal(memory)).unwrap();
        config
            .add_target(Target::retry(Arc::clone(&leaf), RetryOptions::default()))
            .unwrap();

        config.close(Duration::from_secs(1)).unwrap();
        assert!(config.all_targets().iter().all(|t| t.is_closed()));
    }

    #[test]
    fn test_rule_ordering_helpers() {
        let mut config = Configuration::new();
        let first = config.add_rule(LoggingRule::new("a"));
        let second = config.insert_rule(0, LoggingRule::new("b"));

        assert_eq!(config.position_of(second), Some(0));
        assert_eq!(config.position_of(first), Some(1));
        assert!(config.remove_rule(second).is_some());
        assert!(!config.contains_rule(second));
    }
}
