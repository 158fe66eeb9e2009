//! Appender that discards everything

use crate::core::{Appender, LogEvent, Result};

#[derive(Debug, Default)]
pub struct NullAppender {
    discarded: u64,
}

impl NullAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl Appender for NullAppender {
    fn append(&mut self, _event: &LogEvent) -> Result<()> {
        self.discarded += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn kind_name(&self) -> &'static str {
        "Null"
    }
}
