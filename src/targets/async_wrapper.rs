//! Background-thread hand-off in front of a target
//!
//! Events go through a crossbeam channel to a worker thread that writes them
//! to the wrapped target in batches. A full queue is handled by
//! [`OverflowPolicy`].

use super::TargetRef;
use crate::core::{
    error::{LoggerError, Result},
    internal_log::{self, panic_message},
    log_event::SharedEvent,
    metrics::DeliveryMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncOptions {
    pub overflow: OverflowPolicy,
    /// Queue capacity; ignored by [`OverflowPolicy::Grow`]
    pub queue_limit: usize,
    /// Most events handed to the wrapped target in one batch
    pub batch_size: usize,
}

impl Default for AsyncOptions {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::Discard,
            queue_limit: 10_000,
            batch_size: 200,
        }
    }
}

enum Request {
    Write(SharedEvent),
    Flush(Sender<Result<()>>),
}

pub struct AsyncWrapper {
    child: TargetRef,
    options: AsyncOptions,
    sender: RwLock<Option<Sender<Request>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    metrics: Arc<DeliveryMetrics>,
    on_overflow: Option<OverflowCallback>,
}

impl AsyncWrapper {
    pub fn new(child: TargetRef, options: AsyncOptions) -> Result<Self> {
        let (sender, receiver) = match options.overflow {
            OverflowPolicy::Grow => unbounded(),
            OverflowPolicy::Discard | OverflowPolicy::Block => bounded(options.queue_limit.max(1)),
        };
        let metrics = Arc::new(DeliveryMetrics::new());

        let worker_child = Arc::clone(&child);
        let worker_metrics = Arc::clone(&metrics);
        let batch_size = options.batch_size.max(1);
        let handle = thread::Builder::new()
            .name("log-router-async".to_string())
            .spawn(move || Self::run_worker(receiver, worker_child, worker_metrics, batch_size))?;

        Ok(Self {
            child,
            options,
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            metrics,
            on_overflow: None,
        })
    }

    /// Called with the running drop count on the first drop and every 1000th after
    pub fn with_overflow_callback(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    pub fn child(&self) -> &TargetRef {
        &self.child
    }

    pub fn options(&self) -> &AsyncOptions {
        &self.options
    }

    /// Queue statistics: delivered, failed, dropped, queue-full and block counts
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    fn run_worker(
        receiver: Receiver<Request>,
        child: TargetRef,
        metrics: Arc<DeliveryMetrics>,
        batch_size: usize,
    ) {
        let mut batch: Vec<SharedEvent> = Vec::with_capacity(batch_size);

        loop {
            // Block for the first request
            let first = match receiver.recv() {
                Ok(request) => request,
                Err(_) => {
                    // Channel closed, drain what is left and exit
                    Self::write_batch(&child, &mut batch, &metrics);
                    break;
                }
            };

            let mut pending_flush = Self::take_request(first, &mut batch);

            // Collect more without blocking, stopping at a flush request
            while pending_flush.is_none() && batch.len() < batch_size {
                match receiver.try_recv() {
                    Ok(request) => pending_flush = Self::take_request(request, &mut batch),
                    Err(_) => break,
                }
            }

            Self::write_batch(&child, &mut batch, &metrics);

            if let Some(reply) = pending_flush {
                let result = child.flush(crate::core::DEFAULT_SHUTDOWN_TIMEOUT);
                // The requester may have timed out and gone away
                let _ = reply.send(result);
            }
        }
    }

    fn take_request(request: Request, batch: &mut Vec<SharedEvent>) -> Option<Sender<Result<()>>> {
        match request {
            Request::Write(event) => {
                batch.push(event);
                None
            }
            Request::Flush(reply) => Some(reply),
        }
    }

    fn write_batch(child: &TargetRef, batch: &mut Vec<SharedEvent>, metrics: &DeliveryMetrics) {
        if batch.is_empty() {
            return;
        }

        // Counted per event: a failed batch counts every event in it as failed
        let count = batch.len() as u64;
        let result = catch_unwind(AssertUnwindSafe(|| child.write_batch(batch)));
        match result {
            Ok(Ok(())) => {
                metrics.record_delivered_n(count);
            }
            Ok(Err(e)) => {
                metrics.record_failed_n(count);
                internal_log::error(format_args!(
                    "Async worker failed writing {} events to '{}': {}",
                    count,
                    child.display_name(),
                    e
                ));
            }
            Err(panic_info) => {
                metrics.record_failed_n(count);
                internal_log::error(format_args!(
                    "Async worker: target '{}' panicked: {}. Worker continues.",
                    child.display_name(),
                    panic_message(panic_info.as_ref())
                ));
            }
        }
        batch.clear();
    }

    /// `owner` names the wrapping target; it is only called on the error and warning paths
    pub(crate) fn write<N>(&self, owner: N, event: &SharedEvent) -> Result<()>
    where
        N: Fn() -> String,
    {
        let guard = self.sender.read();
        let sender = guard
            .as_ref()
            .ok_or_else(|| LoggerError::target_closed(owner()))?;

        match sender.try_send(Request::Write(Arc::clone(event))) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(request)) => self.handle_overflow(&owner, sender, request),
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::target_closed(owner())),
        }
    }

    fn handle_overflow<N>(&self, owner: &N, sender: &Sender<Request>, request: Request) -> Result<()>
    where
        N: Fn() -> String,
    {
        self.metrics.record_queue_full();

        match self.options.overflow {
            OverflowPolicy::Block => {
                self.metrics.record_block();
                sender
                    .send(request)
                    .map_err(|_| LoggerError::target_closed(owner()))
            }
            // An unbounded channel never reports full
            OverflowPolicy::Grow => sender
                .send(request)
                .map_err(|_| LoggerError::target_closed(owner())),
            OverflowPolicy::Discard => {
                let dropped_count = self.metrics.record_dropped();

                // Alert on first drop and periodically thereafter
                if dropped_count == 0 || (dropped_count + 1) % 1000 == 0 {
                    internal_log::warn(format_args!(
                        "Async queue of '{}' full, {} events dropped. \
                         Consider raising queue_limit or using a different overflow policy.",
                        owner(),
                        dropped_count + 1
                    ));
                    if let Some(ref callback) = self.on_overflow {
                        callback(dropped_count + 1);
                    }
                }
                Ok(())
            }
        }
    }

    /// Wait until every event queued before this call reached the wrapped target
    pub(crate) fn flush(&self, owner: &str, timeout: Duration) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        {
            let guard = self.sender.read();
            let Some(sender) = guard.as_ref() else {
                // Closed: the worker already drained everything
                return Ok(());
            };
            sender
                .send_timeout(Request::Flush(reply_tx), timeout)
                .map_err(|_| LoggerError::flush_timeout(owner, timeout))?;
        }

        reply_rx
            .recv_timeout(timeout)
            .map_err(|_| LoggerError::flush_timeout(owner, timeout))?
    }

    /// Stop accepting events and wait for the worker to drain the queue
    ///
    /// Returns `false` if the worker did not finish within `timeout`.
    pub(crate) fn shutdown(&self, owner: &str, timeout: Duration) -> bool {
        // Closing the channel lets the worker drain and exit
        drop(self.sender.write().take());

        let Some(handle) = self.worker.lock().take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    internal_log::error(format_args!(
                        "Async worker of '{}' panicked during shutdown: {:?}",
                        owner, e
                    ));
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                internal_log::warn(format_args!(
                    "Async worker of '{}' did not finish within {:?}. Some events may be lost.",
                    owner, timeout
                ));
                return false;
            }

            // Small sleep to avoid busy-waiting
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for AsyncWrapper {
    fn drop(&mut self) {
        self.shutdown("async", crate::core::DEFAULT_SHUTDOWN_TIMEOUT);

        let dropped = self.metrics.dropped();
        if dropped > 0 {
            internal_log::warn(format_args!(
                "Async wrapper shutting down with {} dropped events (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            ));
        }
    }
}
