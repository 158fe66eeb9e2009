//! Overflow policies for async target queues
//!
//! When an async wrapper's queue is at its limit, the policy decides what
//! happens to the next event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Policy for a full async queue
///
/// # Example
///
/// ```
/// use rust_log_router::OverflowPolicy;
///
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::Discard);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Drop the new event; counted in metrics and reported periodically
    #[default]
    Discard,

    /// Ignore the queue limit and keep growing
    Grow,

    /// Suspend the caller until the worker frees space
    ///
    /// Warning: this puts backpressure on the application.
    Block,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Discard => write!(f, "Discard"),
            OverflowPolicy::Grow => write!(f, "Grow"),
            OverflowPolicy::Block => write!(f, "Block"),
        }
    }
}

/// Called when events are dropped by a full queue.
/// The parameter is the total count of dropped events so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
