//! Dynamic filters attached to logging rules

use super::internal_log::{self, panic_message};
use super::log_event::LogEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of evaluating a filter against an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterResult {
    /// No opinion; the next filter decides
    #[default]
    Neutral,
    Log,
    Ignore,
    /// Log, then stop evaluating later rules
    LogFinal,
    /// Ignore, and stop evaluating later rules
    IgnoreFinal,
}

impl FilterResult {
    #[inline]
    pub fn is_final(self) -> bool {
        matches!(self, FilterResult::LogFinal | FilterResult::IgnoreFinal)
    }

    /// Whether the event should be written. `Neutral` permits.
    #[inline]
    pub fn permits(self) -> bool {
        matches!(
            self,
            FilterResult::Neutral | FilterResult::Log | FilterResult::LogFinal
        )
    }
}

pub type FilterPredicate = Arc<dyn Fn(&LogEvent) -> bool + Send + Sync>;
pub type FilterMethod = Arc<dyn Fn(&LogEvent) -> FilterResult + Send + Sync>;

#[derive(Clone)]
pub enum Filter {
    /// Yields `action` when `condition` holds, `Neutral` otherwise
    When {
        condition: FilterPredicate,
        action: FilterResult,
    },
    /// Arbitrary decision function
    Method(FilterMethod),
}

impl Filter {
    pub fn when<P>(condition: P, action: FilterResult) -> Self
    where
        P: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        Filter::When {
            condition: Arc::new(condition),
            action,
        }
    }

    pub fn method<M>(method: M) -> Self
    where
        M: Fn(&LogEvent) -> FilterResult + Send + Sync + 'static,
    {
        Filter::Method(Arc::new(method))
    }

    pub fn evaluate(&self, event: &LogEvent) -> FilterResult {
        match self {
            Filter::When { condition, action } => {
                if condition(event) {
                    *action
                } else {
                    FilterResult::Neutral
                }
            }
            Filter::Method(method) => method(event),
        }
    }

    /// Promote a condition filter's `Ignore` action to `IgnoreFinal`
    pub(crate) fn make_ignore_final(&mut self) {
        if let Filter::When { action, .. } = self {
            if *action == FilterResult::Ignore {
                *action = FilterResult::IgnoreFinal;
            }
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::When { action, .. } => f.debug_struct("When").field("action", action).finish(),
            Filter::Method(_) => f.write_str("Method"),
        }
    }
}

/// Run `filters` in order; the first non-neutral result wins, else `default`.
///
/// An empty list yields `Neutral`. A filter that panics yields `Ignore`.
pub fn evaluate_chain(filters: &[Filter], event: &LogEvent, default: FilterResult) -> FilterResult {
    if filters.is_empty() {
        return FilterResult::Neutral;
    }

    for (idx, filter) in filters.iter().enumerate() {
        match catch_unwind(AssertUnwindSafe(|| filter.evaluate(event))) {
            Ok(FilterResult::Neutral) => continue,
            Ok(result) => return result,
            Err(payload) => {
                internal_log::warn(format_args!(
                    "Filter #{} panicked for logger '{}': {}. Event ignored.",
                    idx,
                    event.logger_name,
                    panic_message(payload.as_ref())
                ));
                return FilterResult::Ignore;
            }
        }
    }
    default
}
