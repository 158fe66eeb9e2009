//! Appender trait for terminal log sinks

use super::{
    error::Result,
    log_event::{LogEvent, SharedEvent},
};
use std::any::Any;

/// Downcasting support so typed lookups can find a concrete sink inside a target tree
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A terminal sink. The router owns it behind a lock, so `&mut self` is exclusive.
pub trait Appender: AsAny + Send {
    fn append(&mut self, event: &LogEvent) -> Result<()>;

    /// Write every event in order; all events are attempted and the first error is returned
    fn append_batch(&mut self, events: &[SharedEvent]) -> Result<()> {
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.append(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn flush(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    /// Short display name used when generating target names, e.g. "Console"
    fn kind_name(&self) -> &'static str;

    /// Whether this sink reads `LogEvent::call_site`
    fn wants_call_site(&self) -> bool {
        false
    }
}
