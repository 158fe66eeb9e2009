//! Buffer events and hand them to the wrapped target in batches
//!
//! A full buffer is flushed on the writing thread. An optional flush timeout
//! is served by a timer thread that waits on a crossbeam channel.

use super::TargetRef;
use crate::core::{
    error::Result,
    internal_log,
    log_event::SharedEvent,
};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// What a write does when the buffer is already at `buffer_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferingOverflowAction {
    /// Hand the whole buffer to the wrapped target
    #[default]
    Flush,
    /// Drop the oldest buffered event
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferingOptions {
    pub buffer_size: usize,
    /// Flush this long after the timer was armed; `None` disables the timer
    pub flush_timeout: Option<Duration>,
    /// Re-arm the timer on every write instead of only on the first write into an empty buffer
    pub sliding_timeout: bool,
    pub overflow_action: BufferingOverflowAction,
}

impl Default for BufferingOptions {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            flush_timeout: None,
            sliding_timeout: true,
            overflow_action: BufferingOverflowAction::Flush,
        }
    }
}

enum TimerSignal {
    Arm,
    Stop,
}

struct BufferState {
    child: TargetRef,
    buffer: Mutex<VecDeque<SharedEvent>>,
    /// Held from taking a batch until the child has it, so batches arrive in the order taken
    flush_lock: Mutex<()>,
    options: BufferingOptions,
}

impl BufferState {
    fn take_all(&self) -> Vec<SharedEvent> {
        self.buffer.lock().drain(..).collect()
    }

    fn flush_buffer(&self) -> Result<()> {
        let _flushing = self.flush_lock.lock();
        let events = self.take_all();
        if events.is_empty() {
            return Ok(());
        }
        self.child.write_batch(&events)
    }
}

pub struct BufferingWrapper {
    state: Arc<BufferState>,
    timer: Mutex<Option<(Sender<TimerSignal>, thread::JoinHandle<()>)>>,
}

impl BufferingWrapper {
    pub fn new(child: TargetRef, options: BufferingOptions) -> Result<Self> {
        let state = Arc::new(BufferState {
            child,
            buffer: Mutex::new(VecDeque::with_capacity(options.buffer_size.min(1024))),
            flush_lock: Mutex::new(()),
            options,
        });

        let timer = match state.options.flush_timeout {
            Some(timeout) => {
                let (tx, rx) = unbounded();
                let timer_state = Arc::clone(&state);
                let handle = thread::Builder::new()
                    .name("log-router-buffering".to_string())
                    .spawn(move || Self::run_timer(rx, timer_state, timeout))?;
                Some((tx, handle))
            }
            None => None,
        };

        Ok(Self {
            state,
            timer: Mutex::new(timer),
        })
    }

    pub fn child(&self) -> &TargetRef {
        &self.state.child
    }

    pub fn options(&self) -> &BufferingOptions {
        &self.state.options
    }

    /// Events currently waiting in the buffer
    pub fn buffered(&self) -> usize {
        self.state.buffer.lock().len()
    }

    fn run_timer(signals: Receiver<TimerSignal>, state: Arc<BufferState>, timeout: Duration) {
        let sliding = state.options.sliding_timeout;
        let mut deadline: Option<Instant> = None;

        loop {
            let signal = match deadline {
                None => signals.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(at) => signals.recv_timeout(at.saturating_duration_since(Instant::now())),
            };

            match signal {
                Ok(TimerSignal::Arm) => {
                    if sliding || deadline.is_none() {
                        deadline = Some(Instant::now() + timeout);
                    }
                }
                Ok(TimerSignal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    deadline = None;
                    if let Err(e) = state.flush_buffer() {
                        internal_log::error(format_args!(
                            "Timed flush of buffer for '{}' failed: {}",
                            state.child.display_name(),
                            e
                        ));
                    }
                }
            }
        }
    }

    pub(crate) fn write(&self, event: &SharedEvent) -> Result<()> {
        let size = self.state.options.buffer_size.max(1);
        let (was_empty, full) = {
            let mut buffer = self.state.buffer.lock();
            if self.state.options.overflow_action == BufferingOverflowAction::Discard
                && buffer.len() >= size
            {
                buffer.pop_front();
            }
            let was_empty = buffer.is_empty();
            buffer.push_back(Arc::clone(event));
            (was_empty, buffer.len() >= size)
        };

        if full && self.state.options.overflow_action == BufferingOverflowAction::Flush {
            return self.state.flush_buffer();
        }

        if was_empty || self.state.options.sliding_timeout {
            if let Some((tx, _)) = self.timer.lock().as_ref() {
                let _ = tx.send(TimerSignal::Arm);
            }
        }
        Ok(())
    }

    /// Hand buffered events to the wrapped target, then flush it
    pub(crate) fn flush(&self, timeout: Duration) -> Result<()> {
        let written = self.state.flush_buffer();
        let flushed = self.state.child.flush(timeout);
        written.and(flushed)
    }

    /// Flush the buffer and stop the timer thread
    pub(crate) fn shutdown(&self) -> Result<()> {
        let result = self.state.flush_buffer();
        if let Some((tx, handle)) = self.timer.lock().take() {
            let _ = tx.send(TimerSignal::Stop);
            if handle.join().is_err() {
                internal_log::error(format_args!(
                    "Buffering timer of '{}' panicked",
                    self.state.child.display_name()
                ));
            }
        }
        result
    }
}

impl Drop for BufferingWrapper {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            internal_log::error(format_args!("Failed to flush buffer on drop: {}", e));
        }
    }
}
