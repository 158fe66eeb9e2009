//! Flush the wrapped target after selected writes

use super::TargetRef;
use crate::core::{error::Result, filter::FilterPredicate, log_event::SharedEvent};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct AutoFlushOptions {
    /// Flush after writes matching this; `None` flushes after every write
    pub condition: Option<FilterPredicate>,
    /// Explicit flushes (reconfiguration, shutdown) are not forwarded
    pub flush_on_condition_only: bool,
}

pub struct AutoFlushWrapper {
    child: TargetRef,
    options: AutoFlushOptions,
}

impl AutoFlushWrapper {
    pub fn new(child: TargetRef, options: AutoFlushOptions) -> Self {
        Self { child, options }
    }

    pub fn child(&self) -> &TargetRef {
        &self.child
    }

    pub fn flush_on_condition_only(&self) -> bool {
        self.options.flush_on_condition_only
    }

    pub(crate) fn write(&self, event: &SharedEvent) -> Result<()> {
        self.child.write(event)?;

        let should_flush = match &self.options.condition {
            Some(condition) => condition(event),
            None => true,
        };
        if should_flush {
            self.child.flush(crate::core::DEFAULT_SHUTDOWN_TIMEOUT)?;
        }
        Ok(())
    }

    pub(crate) fn flush(&self, timeout: Duration) -> Result<()> {
        if self.options.flush_on_condition_only {
            return Ok(());
        }
        self.child.flush(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::{log_event::LogEvent, log_level::LogLevel};
    use crate::targets::Target;
    use std::sync::Arc;

    #[test]
    fn test_flushes_on_condition() {
        let (memory, handle) = MemoryAppender::new();
        let wrapper = AutoFlushWrapper::new(
            Arc::new(Target::terminal(memory)),
            AutoFlushOptions {
                condition: Some(Arc::new(|e| e.level >= LogLevel::Error)),
                flush_on_condition_only: false,
            },
        );

        wrapper
            .write(&Arc::new(LogEvent::new(LogLevel::Info, "a", "x")))
            .unwrap();
        assert_eq!(handle.flush_count(), 0);

        wrapper
            .write(&Arc::new(LogEvent::new(LogLevel::Error, "a", "y")))
            .unwrap();
        assert_eq!(handle.flush_count(), 1);
    }

    #[test]
    fn test_condition_only_ignores_explicit_flush() {
        let (memory, handle) = MemoryAppender::new();
        let wrapper = AutoFlushWrapper::new(
            Arc::new(Target::terminal(memory)),
            AutoFlushOptions {
                condition: Some(Arc::new(|_| false)),
                flush_on_condition_only: true,
            },
        );

        wrapper.flush(Duration::from_secs(1)).unwrap();
        assert_eq!(handle.flush_count(), 0);
    }
}
