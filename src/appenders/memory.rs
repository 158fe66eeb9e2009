//! In-memory appender for tests and diagnostics

use crate::core::{Appender, LogEvent, LoggerError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<LogEvent>>,
    flushes: AtomicU64,
}

/// Keeps every event it receives. Read them back through the paired [`MemoryHandle`].
pub struct MemoryAppender {
    shared: Arc<Shared>,
    max_events: Option<usize>,
}

/// Read side of a [`MemoryAppender`]; stays valid after the appender moves into a target
#[derive(Clone)]
pub struct MemoryHandle {
    shared: Arc<Shared>,
}

impl MemoryAppender {
    pub fn new() -> (Self, MemoryHandle) {
        let shared = Arc::new(Shared::default());
        let handle = MemoryHandle {
            shared: Arc::clone(&shared),
        };
        (
            Self {
                shared,
                max_events: None,
            },
            handle,
        )
    }

    /// Keep at most `max_events`, dropping the oldest
    #[must_use]
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = Some(max_events);
        self
    }

    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, event: &LogEvent) -> Result<()> {
        let mut events = self.shared.events.lock();
        if let Some(max) = self.max_events {
            if max == 0 {
                return Err(LoggerError::target_write("Memory", "capacity is zero"));
            }
            if events.len() >= max {
                events.remove(0);
            }
        }
        events.push(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.shared.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn kind_name(&self) -> &'static str {
        "Memory"
    }
}

impl MemoryHandle {
    pub fn events(&self) -> Vec<LogEvent> {
        self.shared.events.lock().clone()
    }

    /// Formatted messages in arrival order
    pub fn messages(&self) -> Vec<String> {
        self.shared
            .events
            .lock()
            .iter()
            .map(LogEvent::formatted_message)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shared.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.shared.events.lock().clear();
    }

    pub fn flush_count(&self) -> u64 {
        self.shared.flushes.load(Ordering::Relaxed)
    }
}
