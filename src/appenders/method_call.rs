//! Appender that hands each event to a closure

use crate::core::{Appender, LogEvent, Result};

type EventCallback = Box<dyn FnMut(&LogEvent) -> Result<()> + Send>;

/// Invokes a callback per event. A returned error is a write failure of the target.
///
/// # Example
///
/// ```
/// use rust_log_router::appenders::MethodCallAppender;
///
/// let appender = MethodCallAppender::new(|event| {
///     println!("{}: {}", event.level, event.formatted_message());
///     Ok(())
/// });
/// ```
pub struct MethodCallAppender {
    callback: EventCallback,
    wants_call_site: bool,
}

impl MethodCallAppender {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&LogEvent) -> Result<()> + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
            wants_call_site: false,
        }
    }

    /// Ask loggers to capture call-site information for events reaching this sink
    #[must_use]
    pub fn with_call_site(mut self) -> Self {
        self.wants_call_site = true;
        self
    }
}

impl Appender for MethodCallAppender {
    fn append(&mut self, event: &LogEvent) -> Result<()> {
        (self.callback)(event)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn kind_name(&self) -> &'static str {
        "MethodCall"
    }

    fn wants_call_site(&self) -> bool {
        self.wants_call_site
    }
}
