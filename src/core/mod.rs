//! Core router types: levels, events, rules, the dispatcher and the logger surface

pub mod appender;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod internal_log;
pub mod log_context;
pub mod log_event;
pub mod log_factory;
pub mod log_level;
pub mod logger;
pub mod logging_rule;
pub mod metrics;
pub mod overflow_policy;

pub use appender::{Appender, AsAny};
pub use dispatcher::LoggerRoutes;
pub use error::{LoggerError, Result};
pub use filter::{Filter, FilterMethod, FilterPredicate, FilterResult};
pub use log_context::{FieldValue, LogContext};
pub use log_event::{CallSite, LogEvent, SharedEvent};
pub use log_factory::{FactoryOptions, LogFactory, SuspendGuard, DEFAULT_SHUTDOWN_TIMEOUT};
pub use log_level::{LevelSet, LogLevel};
pub use logger::Logger;
pub use logging_rule::{LoggingRule, NamePattern, RuleId};
pub use metrics::DeliveryMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
