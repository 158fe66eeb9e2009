//! Retry failed writes a fixed number of times

use super::TargetRef;
use crate::core::{
    error::{LoggerError, Result},
    internal_log,
    log_event::SharedEvent,
};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Retries after the first failed attempt
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay: Duration::from_millis(100),
        }
    }
}

pub struct RetryWrapper {
    child: TargetRef,
    options: RetryOptions,
}

impl RetryWrapper {
    pub fn new(child: TargetRef, options: RetryOptions) -> Self {
        Self { child, options }
    }

    pub fn child(&self) -> &TargetRef {
        &self.child
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// At most `1 + retry_count` attempts, sleeping `retry_delay` between them
    pub(crate) fn write<N>(&self, owner: N, event: &SharedEvent) -> Result<()>
    where
        N: Fn() -> String,
    {
        let attempts = self.options.retry_count.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.child.write(event) {
                Ok(()) => return Ok(()),
                Err(e @ LoggerError::TargetClosed { .. }) => return Err(e),
                Err(e) if attempt >= attempts => {
                    return Err(LoggerError::retry_exhausted(owner(), attempts, e));
                }
                Err(e) => {
                    internal_log::warn(format_args!(
                        "Write to '{}' failed (attempt {}/{}): {}. Retrying in {:?}.",
                        self.child.display_name(),
                        attempt,
                        attempts,
                        e,
                        self.options.retry_delay
                    ));
                    if !self.options.retry_delay.is_zero() {
                        thread::sleep(self.options.retry_delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
