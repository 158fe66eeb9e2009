//! Self-diagnostics for the router
//!
//! Failures inside the router (a sink returning an error, a filter panicking,
//! a queue overflowing) never reach the caller. They are reported here as
//! prefixed lines on stderr, gated by a process-wide threshold.

use super::log_level::LogLevel;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Once;

/// Environment variable read once to seed the threshold
pub const INTERNAL_LEVEL_ENV: &str = "LOG_ROUTER_INTERNAL_LEVEL";

const DEFAULT_LEVEL: LogLevel = LogLevel::Warn;

static THRESHOLD: AtomicU8 = AtomicU8::new(DEFAULT_LEVEL as u8);
static INIT_FROM_ENV: Once = Once::new();

fn init_from_env() {
    INIT_FROM_ENV.call_once(|| {
        if let Ok(value) = std::env::var(INTERNAL_LEVEL_ENV) {
            match value.parse::<LogLevel>() {
                Ok(level) => THRESHOLD.store(level.ordinal(), Ordering::Relaxed),
                Err(e) => eprintln!("[LOG ROUTER WARN] Ignoring {}: {}", INTERNAL_LEVEL_ENV, e),
            }
        }
    });
}

pub fn level() -> LogLevel {
    init_from_env();
    LogLevel::from_ordinal(THRESHOLD.load(Ordering::Relaxed)).unwrap_or(DEFAULT_LEVEL)
}

/// Override the threshold; wins over the environment variable
pub fn set_level(level: LogLevel) {
    init_from_env();
    THRESHOLD.store(level.ordinal(), Ordering::Relaxed);
}

#[inline]
pub fn is_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level >= self::level()
}

pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    if is_enabled(level) {
        eprintln!("[LOG ROUTER {}] {}", level, args);
    }
}

pub fn trace(args: fmt::Arguments<'_>) {
    log(LogLevel::Trace, args);
}

pub fn debug(args: fmt::Arguments<'_>) {
    log(LogLevel::Debug, args);
}

pub fn warn(args: fmt::Arguments<'_>) {
    log(LogLevel::Warn, args);
}

pub fn error(args: fmt::Arguments<'_>) {
    log(LogLevel::Error, args);
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
