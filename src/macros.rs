//! Logging macros with `format!`-style arguments.
//!
//! The level gate is checked before the arguments are formatted, so a
//! disabled call never evaluates them.
//!
//! # Examples
//!
//! ```
//! use rust_log_router::prelude::*;
//! use rust_log_router::info;
//!
//! let factory = LogFactory::new();
//! let (memory, handle) = MemoryAppender::new();
//! factory
//!     .load_configuration(|config| {
//!         config.for_logger("*").write_to(Target::terminal(memory))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let logger = factory.get_logger("server");
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! assert_eq!(handle.messages(), vec!["Server listening on port 8080".to_string()]);
//! ```

/// Log a formatted message at the given level.
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let factory = LogFactory::new();
/// # let logger = factory.get_logger("app");
/// use rust_log_router::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(level, format!($($arg)+));
        }
    }};
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let factory = LogFactory::new();
/// # let logger = factory.get_logger("db");
/// use rust_log_router::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
