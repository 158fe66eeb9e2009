//! Basic routing example
//!
//! Routes loggers to the console by name pattern and level, with a final
//! minimum level that keeps a noisy subsystem quiet.
//!
//! Run with: cargo run --example basic_routing

use rust_log_router::prelude::*;
use rust_log_router::info;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Log Router - Basic Routing Example ===\n");

    let factory = LogFactory::new();
    factory.load_configuration(|config| {
        // Below Warn the poller stops here; later rules never see it
        config.for_logger("app.poller").write_to_nil(Some(LogLevel::Warn))?;

        config
            .for_logger("app.*")
            .filter_min_level(LogLevel::Info)
            .write_to(Target::terminal(ConsoleAppender::new()).with_name("console"))?;
        Ok(())
    })?;

    let http = factory.get_logger("app.http");
    let poller = factory.get_logger("app.poller");

    println!("1. Level filtering on app.http (Info and above):");
    http.debug("Debug message (hidden)");
    http.info("Request processed");
    info!(http, "Served {} bytes in {} ms", 5120, 12);

    println!("\n2. Final minimum level on app.poller (Warn and above):");
    poller.info("Polling tick (hidden)");
    poller.warn("Poll took longer than expected");

    println!("\n3. Templates and context:");
    http.log_template(LogLevel::Info, "user {0} logged in from {1}", ["alice", "10.0.0.7"]);
    http.log_with_context(
        LogLevel::Warn,
        "Slow response",
        LogContext::new().with_field("route", "/search").with_field("ms", 870i64),
    );

    println!("\n4. Suspended logging:");
    {
        let _guard = factory.suspend_logging();
        http.error("Error while suspended (hidden)");
    }
    http.error("Error after resume");

    factory.shutdown(Duration::from_secs(1))?;
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
