//! Async delivery pipeline example
//!
//! Builds a wrapper chain of async, retry, and fallback in front of an
//! in-memory sink whose primary path fails every third write.
//!
//! Run with: cargo run --example async_pipeline

use rust_log_router::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    println!("=== Rust Log Router - Async Pipeline Example ===\n");

    let attempts = Arc::new(AtomicUsize::new(0));
    let primary_attempts = Arc::clone(&attempts);
    let flaky = MethodCallAppender::new(move |_event| {
        if primary_attempts.fetch_add(1, Ordering::SeqCst) % 3 == 2 {
            return Err(LoggerError::target_write("flaky", "connection reset"));
        }
        Ok(())
    });
    let (backup, backup_handle) = MemoryAppender::new();

    let factory = LogFactory::new();
    factory.load_configuration(|config| {
        config
            .for_logger("*")
            .write_to(Target::terminal(flaky).with_name("flaky"))?
            .with_retry(RetryOptions {
                retry_count: 1,
                retry_delay: Duration::from_millis(1),
            })?
            .with_fallback(Target::terminal(backup), true)?
            .with_async(AsyncOptions {
                overflow: OverflowPolicy::Block,
                queue_limit: 1_000,
                batch_size: 100,
            })?;
        Ok(())
    })?;

    if let Some(config) = factory.configuration() {
        println!("Registered targets:");
        for target in config.all_targets() {
            println!("  {} ({})", target.display_name(), target.kind().display_name());
        }
    }

    let start = Instant::now();
    let workers: Vec<_> = (0..4)
        .map(|id| {
            let logger = factory.get_logger(&format!("worker.{}", id));
            thread::spawn(move || {
                for i in 0..2_500 {
                    logger.info(format!("job {} finished", i));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread panicked");
    }
    let enqueue_time = start.elapsed();

    factory.flush(Duration::from_secs(10))?;
    let total = start.elapsed();

    println!("\nEnqueued 10000 events in {:?}, drained in {:?}", enqueue_time, total);
    println!("Primary attempts: {}", attempts.load(Ordering::SeqCst));
    println!("Events caught by the fallback: {}", backup_handle.len());
    println!(
        "Dispatch metrics: delivered={} failed={}",
        factory.metrics().delivered(),
        factory.metrics().failed()
    );

    factory.shutdown(Duration::from_secs(5))?;
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
