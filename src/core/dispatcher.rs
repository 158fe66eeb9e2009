//! Per-logger routing tables and event fan-out
//!
//! Routes are computed once per logger whenever the active configuration
//! changes. Dispatch then only walks the precomputed list for the event's
//! level, so the hot path never re-matches name patterns.

use super::{
    filter::{evaluate_chain, Filter, FilterResult},
    internal_log::{self, panic_message},
    log_event::SharedEvent,
    log_level::LogLevel,
    logging_rule::LoggingRule,
    metrics::DeliveryMetrics,
};
use crate::targets::{Target, TargetRef};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Targets contributed by one rule for one level
#[derive(Debug, Clone)]
struct RouteEntry {
    rule_name: Option<String>,
    filters: Vec<Filter>,
    filter_default: FilterResult,
    targets: Vec<TargetRef>,
}

impl RouteEntry {
    fn decide(&self, event: &SharedEvent) -> FilterResult {
        evaluate_chain(&self.filters, event, self.filter_default)
    }
}

/// Frozen routing table of one logger: for each level, the rule entries to run in order
#[derive(Debug, Clone, Default)]
pub struct LoggerRoutes {
    by_level: [Vec<RouteEntry>; LogLevel::COUNT],
    call_site: [bool; LogLevel::COUNT],
}

impl LoggerRoutes {
    /// Routes for a logger that sends nothing anywhere
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute the routes of `logger_name` over `rules`.
    ///
    /// Levels below `threshold` get no route. A final rule suppresses its
    /// enabled levels for every later rule; a rule with a final minimum level
    /// instead resets suppression: levels below it become suppressed and
    /// levels at or above it are released.
    pub fn build(logger_name: &str, rules: &[LoggingRule], threshold: LogLevel) -> Self {
        let mut routes = Self::empty();
        let mut suppressed = [false; LogLevel::COUNT];
        // Targets already reached per level by rules without filters
        let mut reached: [HashSet<*const Target>; LogLevel::COUNT] = Default::default();
        let mut warned_duplicate = false;

        for rule in rules.iter().filter(|r| r.matches_logger(logger_name)) {
            for level in LogLevel::all() {
                let Some(idx) = level.index() else { continue };

                if level < threshold {
                    continue;
                }
                match rule.final_min_level {
                    Some(final_min) => suppressed[idx] = level < final_min,
                    None if suppressed[idx] => continue,
                    None => {}
                }
                if !rule.is_enabled_for(level) {
                    continue;
                }
                if rule.final_rule {
                    suppressed[idx] = true;
                }

                let mut targets = Vec::with_capacity(rule.targets.len());
                for target in &rule.targets {
                    if !rule.has_filters() {
                        let first_time = reached[idx].insert(Arc::as_ptr(target));
                        if !first_time {
                            if !warned_duplicate {
                                internal_log::warn(format_args!(
                                    "Logger '{}' reaches target '{}' through more than one rule; \
                                     later duplicates are skipped",
                                    logger_name,
                                    target.display_name()
                                ));
                                warned_duplicate = true;
                            }
                            continue;
                        }
                    }
                    routes.call_site[idx] |= target.wants_call_site();
                    targets.push(Arc::clone(target));
                }

                if targets.is_empty() && !rule.has_filters() {
                    continue;
                }
                routes.by_level[idx].push(RouteEntry {
                    rule_name: rule.name.clone(),
                    filters: rule.filters.clone(),
                    filter_default: rule.filter_default,
                    targets,
                });
            }
        }

        routes
    }

    /// Whether an event at `level` reaches any target
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level
            .index()
            .is_some_and(|idx| self.by_level[idx].iter().any(|e| !e.targets.is_empty()))
    }

    /// Whether any target routed for `level` reads call-site information
    #[inline]
    pub fn wants_call_site(&self, level: LogLevel) -> bool {
        level.index().is_some_and(|idx| self.call_site[idx])
    }

    /// Number of distinct targets routed for `level`
    pub fn target_count(&self, level: LogLevel) -> usize {
        level.index().map_or(0, |idx| {
            self.by_level[idx]
                .iter()
                .flat_map(|e| e.targets.iter().map(Arc::as_ptr))
                .collect::<HashSet<_>>()
                .len()
        })
    }

    /// Deliver `event` to every target its level routes to.
    ///
    /// Each target is written independently; a failing or panicking target is
    /// counted and reported internally, and delivery continues with its
    /// siblings. A final filter result stops after the current rule's targets.
    /// Returns the number of successful target writes.
    pub fn dispatch(&self, event: &SharedEvent, metrics: &DeliveryMetrics) -> usize {
        let Some(idx) = event.level.index() else {
            return 0;
        };

        let mut delivered = 0;
        for entry in &self.by_level[idx] {
            let decision = entry.decide(event);
            if decision.permits() {
                for target in &entry.targets {
                    if deliver(target, event, metrics) {
                        delivered += 1;
                    }
                }
            } else {
                internal_log::trace(format_args!(
                    "Rule '{}' filtered event from '{}' ({:?})",
                    entry.rule_name.as_deref().unwrap_or("<unnamed>"),
                    event.logger_name,
                    decision
                ));
            }
            if decision.is_final() {
                break;
            }
        }
        delivered
    }
}

fn deliver(target: &TargetRef, event: &SharedEvent, metrics: &DeliveryMetrics) -> bool {
    match catch_unwind(AssertUnwindSafe(|| target.write(event))) {
        Ok(Ok(())) => {
            metrics.record_delivered();
            true
        }
        Ok(Err(e)) => {
            metrics.record_failed();
            internal_log::error(format_args!(
                "Target '{}' failed for logger '{}': {}",
                target.display_name(),
                event.logger_name,
                e
            ));
            false
        }
        Err(payload) => {
            metrics.record_failed();
            internal_log::error(format_args!(
                "Target '{}' panicked for logger '{}': {}. Other targets continue to function.",
                target.display_name(),
                event.logger_name,
                panic_message(payload.as_ref())
            ));
            false
        }
    }
}
