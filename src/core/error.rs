//! Error types for the log router

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A required argument was not supplied
    #[error("Missing required argument: {argument}")]
    MissingArgument { argument: String },

    /// A wrapper was applied before any target was written to the builder
    #[error("Must call write_to(...) before applying a target wrapper")]
    NoTargetsToWrap,

    /// Another registered target already uses this name
    #[error("Target name '{name}' is already registered")]
    DuplicateTargetName { name: String },

    /// Typed lookup found nothing reachable of the requested kind
    #[error("No target of kind '{requested}' is reachable from the builder")]
    TargetNotFound { requested: String },

    /// A sink failed to write an event
    #[error("Target '{target}' failed to write: {message}")]
    TargetWrite { target: String, message: String },

    /// Retry budget used up without a successful write
    #[error("Target '{target}' still failing after {attempts} attempts")]
    RetryExhausted {
        target: String,
        attempts: u32,
        #[source]
        source: Box<LoggerError>,
    },

    /// Every member of a fallback group failed for the same event
    #[error("All {attempted} targets of the fallback group failed")]
    AllTargetsFailed {
        attempted: usize,
        #[source]
        last: Box<LoggerError>,
    },

    /// Target already closed
    #[error("Target '{target}' is closed")]
    TargetClosed { target: String },

    /// Flush did not complete in time
    #[error("Flush of target '{target}' did not complete within {timeout:?}")]
    FlushTimeout { target: String, timeout: Duration },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn missing_argument(argument: impl Into<String>) -> Self {
        LoggerError::MissingArgument {
            argument: argument.into(),
        }
    }

    pub fn duplicate_target(name: impl Into<String>) -> Self {
        LoggerError::DuplicateTargetName { name: name.into() }
    }

    pub fn target_not_found(requested: impl Into<String>) -> Self {
        LoggerError::TargetNotFound {
            requested: requested.into(),
        }
    }

    /// Create a write failure for a named target
    pub fn target_write(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TargetWrite {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn retry_exhausted(target: impl Into<String>, attempts: u32, source: LoggerError) -> Self {
        LoggerError::RetryExhausted {
            target: target.into(),
            attempts,
            source: Box::new(source),
        }
    }

    pub fn all_targets_failed(attempted: usize, last: LoggerError) -> Self {
        LoggerError::AllTargetsFailed {
            attempted,
            last: Box::new(last),
        }
    }

    pub fn target_closed(target: impl Into<String>) -> Self {
        LoggerError::TargetClosed {
            target: target.into(),
        }
    }

    pub fn flush_timeout(target: impl Into<String>, timeout: Duration) -> Self {
        LoggerError::FlushTimeout {
            target: target.into(),
            timeout,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("RuleBuilder", "empty pattern");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::duplicate_target("file");
        assert!(matches!(err, LoggerError::DuplicateTargetName { .. }));

        let err = LoggerError::target_not_found("Async");
        assert!(matches!(err, LoggerError::TargetNotFound { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::target_not_found("Buffering");
        assert_eq!(
            err.to_string(),
            "No target of kind 'Buffering' is reachable from the builder"
        );

        let err = LoggerError::target_write("db", "connection refused");
        assert_eq!(
            err.to_string(),
            "Target 'db' failed to write: connection refused"
        );

        assert_eq!(
            LoggerError::NoTargetsToWrap.to_string(),
            "Must call write_to(...) before applying a target wrapper"
        );
    }

    #[test]
    fn test_retry_exhausted_keeps_source() {
        use std::error::Error;

        let inner = LoggerError::target_write("db", "timeout");
        let err = LoggerError::retry_exhausted("db", 4, inner);

        assert!(err.to_string().contains("after 4 attempts"));
        let source = err.source().expect("source attached");
        assert!(source.to_string().contains("timeout"));
    }
}
