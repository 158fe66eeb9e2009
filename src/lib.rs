//! # Rust Log Router
//!
//! The routing-and-delivery core of a structured logging façade.
//!
//! ## Features
//!
//! - **Level Gate**: cached per-logger, per-level checks so disabled calls never build an event
//! - **Logging Rules**: ordered name-pattern rules with level sets, filters and final semantics
//! - **Target Wrappers**: async, buffering, auto-flush, retry, filtering and fallback decorators
//! - **Isolated Delivery**: one failing target never blocks its siblings
//!
//! ## Example
//!
//! ```
//! use rust_log_router::prelude::*;
//!
//! let (memory, handle) = MemoryAppender::new();
//!
//! let factory = LogFactory::new();
//! factory
//!     .load_configuration(|config| {
//!         config
//!             .for_logger("app.*")
//!             .filter_min_level(LogLevel::Info)
//!             .write_to(Target::terminal(memory))?
//!             .with_retry(RetryOptions::default())?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let logger = factory.get_logger("app.http");
//! logger.debug("not delivered");
//! logger.info("delivered");
//! assert_eq!(handle.messages(), vec!["delivered".to_string()]);
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;
pub mod targets;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::appenders::{ConsoleAppender, ConsoleFormat};
    pub use crate::appenders::{MemoryAppender, MemoryHandle, MethodCallAppender, NullAppender};
    pub use crate::config::{Configuration, RuleBuilder, TargetBuilder, TargetChain};
    pub use crate::core::{
        Appender, CallSite, DeliveryMetrics, FieldValue, Filter, FilterResult, FactoryOptions,
        LevelSet, LogContext, LogEvent, LogFactory, LogLevel, Logger, LoggerError, LoggingRule,
        NamePattern, OverflowCallback, OverflowPolicy, Result, SharedEvent, SuspendGuard,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::targets::{
        AsyncOptions, AutoFlushOptions, BufferingOptions, BufferingOverflowAction, Group,
        RetryOptions, Target, TargetKind, TargetRef, TargetShape, Wrapper,
    };
}

#[cfg(feature = "console")]
pub use appenders::{ConsoleAppender, ConsoleFormat};
pub use appenders::{MemoryAppender, MemoryHandle, MethodCallAppender, NullAppender};
pub use config::{Configuration, RuleBuilder, TargetBuilder, TargetChain};
pub use core::{
    Appender, CallSite, DeliveryMetrics, FieldValue, Filter, FilterResult, FactoryOptions,
    LevelSet, LogContext, LogEvent, LogFactory, LogLevel, Logger, LoggerError, LoggingRule,
    NamePattern, OverflowCallback, OverflowPolicy, Result, SharedEvent, SuspendGuard,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use targets::{
    AsyncOptions, AutoFlushOptions, BufferingOptions, BufferingOverflowAction, Group,
    RetryOptions, Target, TargetKind, TargetRef, TargetShape, Wrapper,
};
