//! Fluent logging rule construction

use super::configuration::Configuration;
use super::target_builder::TargetChain;
use crate::appenders::NullAppender;
use crate::core::{
    error::Result,
    filter::{Filter, FilterResult},
    log_event::LogEvent,
    log_level::{LevelSet, LogLevel},
    logging_rule::{LoggingRule, RuleId},
};
use crate::targets::{Target, TargetRef};

/// Builder for one [`LoggingRule`], created by [`Configuration::for_logger`].
///
/// The rule joins the configuration when its first target is written, or
/// earlier through [`RuleBuilder::top_rule`] and [`RuleBuilder::write_to_nil`].
pub struct RuleBuilder<'a> {
    config: &'a mut Configuration,
    rule_id: RuleId,
    pending: Option<LoggingRule>,
}

impl<'a> RuleBuilder<'a> {
    pub(crate) fn new(config: &'a mut Configuration, rule: LoggingRule) -> Self {
        Self {
            config,
            rule_id: rule.id(),
            pending: Some(rule),
        }
    }

    pub fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    /// The rule being built, wherever it currently lives
    pub fn rule(&self) -> Option<&LoggingRule> {
        match &self.pending {
            Some(rule) => Some(rule),
            None => self.config.rule(self.rule_id),
        }
    }

    /// Whether the rule has been added to the configuration
    pub fn is_registered(&self) -> bool {
        self.pending.is_none() && self.config.contains_rule(self.rule_id)
    }

    fn with_rule<R>(&mut self, f: impl FnOnce(&mut LoggingRule) -> R) -> Option<R> {
        match self.pending.as_mut() {
            Some(rule) => Some(f(rule)),
            None => self.config.rule_mut(self.rule_id).map(f),
        }
    }

    // Move a pending rule into the configuration, or take it out again so it
    // can be repositioned
    fn take_rule(&mut self) -> Option<LoggingRule> {
        self.pending
            .take()
            .or_else(|| self.config.remove_rule(self.rule_id))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_rule(|rule| rule.name = Some(name));
        self
    }

    /// Enable `min_level` and everything above it, replacing the current levels
    pub fn filter_min_level(mut self, min_level: LogLevel) -> Self {
        self.with_rule(|rule| rule.levels.set_range(min_level, LogLevel::MAX));
        self
    }

    /// Enable `max_level` and everything below it, replacing the current levels
    pub fn filter_max_level(mut self, max_level: LogLevel) -> Self {
        self.with_rule(|rule| rule.levels.set_range(LogLevel::MIN, max_level));
        self
    }

    /// Enable exactly one level
    pub fn filter_level(mut self, level: LogLevel) -> Self {
        self.with_rule(|rule| rule.levels = LevelSet::only(level));
        self
    }

    /// Enable `min..=max`; a missing bound is open
    pub fn filter_levels(self, min_level: Option<LogLevel>, max_level: Option<LogLevel>) -> Self {
        let min = min_level.unwrap_or(LogLevel::MIN);
        let max = max_level.unwrap_or(LogLevel::MAX);
        self.filter_level_set(LevelSet::range(min, max))
    }

    pub fn filter_level_set(mut self, levels: LevelSet) -> Self {
        self.with_rule(|rule| rule.levels = levels);
        self
    }

    /// Append a filter. `default`, when given, is the rule's result once every filter is neutral.
    pub fn filter_dynamic(mut self, filter: Filter, default: Option<FilterResult>) -> Self {
        self.with_rule(|rule| {
            rule.filters.push(filter);
            if let Some(default) = default {
                rule.filter_default = default;
            }
        });
        self
    }

    /// Append a method filter that decides the result itself
    pub fn filter_dynamic_fn<M>(self, method: M) -> Self
    where
        M: Fn(&LogEvent) -> FilterResult + Send + Sync + 'static,
    {
        self.filter_dynamic(Filter::method(method), Some(FilterResult::Neutral))
    }

    /// Drop events matching `predicate`; with `final_match` later rules are skipped too
    pub fn filter_dynamic_ignore<P>(self, predicate: P, final_match: bool) -> Self
    where
        P: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        let action = if final_match {
            FilterResult::IgnoreFinal
        } else {
            FilterResult::Ignore
        };
        self.filter_dynamic(Filter::when(predicate, action), Some(FilterResult::Neutral))
    }

    /// Log only events matching `predicate`; with `final_match` a match also stops later rules
    pub fn filter_dynamic_log<P>(self, predicate: P, final_match: bool) -> Self
    where
        P: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        let (action, default) = if final_match {
            (FilterResult::LogFinal, FilterResult::IgnoreFinal)
        } else {
            (FilterResult::Log, FilterResult::Ignore)
        };
        self.filter_dynamic(Filter::when(predicate, action), Some(default))
    }

    /// Stop evaluating later rules once this rule matches
    pub fn final_rule(mut self, final_rule: bool) -> Self {
        self.with_rule(|rule| rule.final_rule = final_rule);
        self
    }

    /// Insert the rule first, moving it if already present.
    ///
    /// With `insert_first == false` the rule is appended, unless already present.
    pub fn top_rule(mut self, insert_first: bool) -> Self {
        if !insert_first && self.is_registered() {
            return self;
        }
        if let Some(rule) = self.take_rule() {
            if insert_first {
                self.config.insert_rule(0, rule);
            } else {
                self.config.add_rule(rule);
            }
        }
        self
    }

    /// Discard matching events and stop them reaching later rules.
    ///
    /// `Some(level)` only discards levels below `level`; events at or above it
    /// keep flowing to later rules. `None` covers every level. A rule with
    /// filters keeps them, with `Ignore` promoted to `IgnoreFinal`, and gains
    /// a null target so permitted events have somewhere to go.
    pub fn write_to_nil(mut self, final_min_level: Option<LogLevel>) -> Result<Self> {
        let has_targets = self.rule().is_some_and(|r| !r.targets.is_empty());
        let has_filters = self.rule().is_some_and(|r| r.has_filters());

        if !has_targets {
            self = match final_min_level {
                Some(level) => {
                    let mut builder = self.filter_min_level(level);
                    builder.with_rule(|rule| rule.final_min_level = Some(level));
                    builder
                }
                None => {
                    let mut builder = self.filter_max_level(LogLevel::MAX);
                    if !has_filters {
                        builder.with_rule(|rule| rule.final_rule = true);
                    }
                    builder
                }
            };
        }

        if has_filters {
            self.with_rule(|rule| {
                for filter in &mut rule.filters {
                    filter.make_ignore_final();
                }
                if rule.filter_default == FilterResult::Ignore {
                    rule.filter_default = FilterResult::IgnoreFinal;
                }
            });
            if !has_targets {
                self = self.write_to(Target::terminal(NullAppender::new()))?;
            }
        }

        if !self.is_registered() {
            self = self.top_rule(false);
        }
        Ok(self)
    }
}

impl TargetChain for RuleBuilder<'_> {
    fn configuration(&mut self) -> &mut Configuration {
        self.config
    }

    fn heads(&self) -> Vec<TargetRef> {
        self.rule().map(|r| r.targets.clone()).unwrap_or_default()
    }

    fn replace_heads(&mut self, heads: Vec<TargetRef>) {
        self.with_rule(|rule| rule.targets = heads);
        if let Some(rule) = self.pending.take() {
            self.config.add_rule(rule);
        }
    }
}

impl std::fmt::Debug for RuleBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("rule", &self.rule())
            .field("registered", &self.is_registered())
            .finish()
    }
}
