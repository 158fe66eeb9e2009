//! Log factory: owns the active configuration and the named logger cache

use super::{
    dispatcher::LoggerRoutes,
    error::Result,
    internal_log,
    log_level::LogLevel,
    logger::Logger,
    metrics::DeliveryMetrics,
};
use crate::config::Configuration;
use crate::targets::Target;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for flushing and closing targets on shutdown (5 seconds)
///
/// Used when the factory is dropped without an explicit [`LogFactory::shutdown`],
/// and when an old configuration is closed after being replaced.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryOptions {
    /// Levels below this are disabled for every logger
    pub global_threshold: LogLevel,
    pub shutdown_timeout: Duration,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            global_threshold: LogLevel::Trace,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Entry point for hosts: install a [`Configuration`], hand out [`Logger`]s.
///
/// # Example
///
/// ```
/// use rust_log_router::prelude::*;
///
/// let factory = LogFactory::new();
/// let (memory, handle) = MemoryAppender::new();
/// factory
///     .load_configuration(|config| {
///         config
///             .for_logger("*")
///             .filter_min_level(LogLevel::Warn)
///             .write_to(Target::terminal(memory))?;
///         Ok(())
///     })
///     .unwrap();
///
/// let logger = factory.get_logger("db");
/// logger.info("skipped");
/// logger.error("kept");
/// assert_eq!(handle.messages(), vec!["kept".to_string()]);
/// ```
pub struct LogFactory {
    options: FactoryOptions,
    configuration: RwLock<Option<Arc<Configuration>>>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
    global_threshold: RwLock<LogLevel>,
    suspend_count: AtomicUsize,
    metrics: Arc<DeliveryMetrics>,
    shut_down: AtomicBool,
}

impl LogFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(FactoryOptions::default())
    }

    #[must_use]
    pub fn with_options(options: FactoryOptions) -> Self {
        Self {
            global_threshold: RwLock::new(options.global_threshold),
            options,
            configuration: RwLock::new(None),
            loggers: Mutex::new(HashMap::new()),
            suspend_count: AtomicUsize::new(0),
            metrics: Arc::new(DeliveryMetrics::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// The logger named `name`; repeated calls return the same instance
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let mut loggers = self.loggers.lock();
        if let Some(logger) = loggers.get(name) {
            return Arc::clone(logger);
        }

        let routes = self.build_routes(name);
        let logger = Arc::new(Logger::new(name, routes, Arc::clone(&self.metrics)));
        loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    /// Number of loggers handed out so far
    pub fn logger_count(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn configuration(&self) -> Option<Arc<Configuration>> {
        self.configuration.read().clone()
    }

    /// Install `configuration` and reconfigure every existing logger.
    ///
    /// Targets of the previous configuration that the new one does not reuse
    /// are flushed and closed.
    pub fn set_configuration(&self, configuration: Configuration) -> Result<()> {
        let configuration = Arc::new(configuration);
        let previous = self.configuration.write().replace(Arc::clone(&configuration));
        self.shut_down.store(false, Ordering::Release);

        internal_log::debug(format_args!(
            "Installed configuration with {} rules and {} targets",
            configuration.rules().len(),
            configuration.targets().len()
        ));
        self.reconfig_existing_loggers();

        if let Some(previous) = previous {
            if !Arc::ptr_eq(&previous, &configuration) {
                let keep: HashSet<*const Target> = configuration
                    .all_targets()
                    .iter()
                    .map(Arc::as_ptr)
                    .collect();
                if let Err(e) = previous.close_except(self.options.shutdown_timeout, &keep) {
                    internal_log::warn(format_args!(
                        "Closing targets of the replaced configuration failed: {}",
                        e
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build a fresh configuration with `build` and install it.
    ///
    /// Nothing is installed when `build` fails.
    pub fn load_configuration<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(&mut Configuration) -> Result<()>,
    {
        let mut configuration = Configuration::new();
        build(&mut configuration)?;
        self.set_configuration(configuration)
    }

    /// Recompute routes and level gates of every cached logger
    pub fn reconfig_existing_loggers(&self) {
        let loggers = self.loggers.lock();
        for (name, logger) in loggers.iter() {
            logger.apply_routes(self.build_routes(name));
        }
    }

    pub fn global_threshold(&self) -> LogLevel {
        *self.global_threshold.read()
    }

    /// Disable every level below `threshold` for all loggers
    pub fn set_global_threshold(&self, threshold: LogLevel) {
        *self.global_threshold.write() = threshold;
        self.reconfig_existing_loggers();
    }

    /// Disable all logging until every returned guard is dropped
    #[must_use = "logging resumes as soon as the guard is dropped"]
    pub fn suspend_logging(&self) -> SuspendGuard<'_> {
        if self.suspend_count.fetch_add(1, Ordering::AcqRel) == 0 {
            self.reconfig_existing_loggers();
        }
        SuspendGuard { factory: self }
    }

    fn resume_logging(&self) {
        if self.suspend_count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.reconfig_existing_loggers();
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.suspend_count.load(Ordering::Acquire) == 0
    }

    /// Delivery counters across all loggers of this factory
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Flush every target of the active configuration
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        match self.configuration() {
            Some(configuration) => configuration.flush(timeout),
            None => Ok(()),
        }
    }

    /// Disable all loggers, then flush and close every target.
    ///
    /// Further calls are no-ops until a new configuration is installed.
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let configuration = self.configuration.write().take();
        for logger in self.loggers.lock().values() {
            logger.apply_routes(LoggerRoutes::empty());
        }

        let Some(configuration) = configuration else {
            return Ok(());
        };
        let flushed = configuration.flush(timeout);
        let closed = configuration.close(timeout);
        internal_log::debug(format_args!("Log factory shut down"));
        flushed.and(closed)
    }

    fn effective_threshold(&self) -> LogLevel {
        if self.is_logging_enabled() {
            self.global_threshold()
        } else {
            LogLevel::Off
        }
    }

    fn build_routes(&self, logger_name: &str) -> LoggerRoutes {
        match self.configuration.read().as_deref() {
            Some(configuration) => {
                LoggerRoutes::build(logger_name, configuration.rules(), self.effective_threshold())
            }
            None => LoggerRoutes::empty(),
        }
    }
}

impl Default for LogFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogFactory {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown(self.options.shutdown_timeout) {
            internal_log::warn(format_args!("Log factory shutdown on drop failed: {}", e));
        }
    }
}

impl std::fmt::Debug for LogFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFactory")
            .field("options", &self.options)
            .field("loggers", &self.logger_count())
            .field("suspended", &!self.is_logging_enabled())
            .finish()
    }
}

/// Keeps logging suspended while alive, see [`LogFactory::suspend_logging`]
pub struct SuspendGuard<'a> {
    factory: &'a LogFactory,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.factory.resume_logging();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, MemoryHandle};
    use crate::config::TargetChain;

    fn factory_with_memory(pattern: &str, min: LogLevel) -> (LogFactory, MemoryHandle) {
        let factory = LogFactory::new();
        let (memory, handle) = MemoryAppender::new();
        factory
            .load_configuration(|config| {
                config
                    .for_logger(pattern)
                    .filter_min_level(min)
                    .write_to(Target::terminal(memory))?;
                Ok(())
            })
            .unwrap();
        (factory, handle)
    }

    #[test]
    fn test_logger_cache_returns_same_instance() {
        let factory = LogFactory::new();
        let a = factory.get_logger("app");
        let b = factory.get_logger("app");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.logger_count(), 1);
    }

    #[test]
    fn test_existing_loggers_follow_new_configuration() {
        let factory = LogFactory::new();
        let logger = factory.get_logger("app");
        assert!(!logger.is_enabled(LogLevel::Fatal));

        let (memory, handle) = MemoryAppender::new();
        factory
            .load_configuration(|config| {
                config.for_logger("*").write_to(Target::terminal(memory))?;
                Ok(())
            })
            .unwrap();

        assert!(logger.is_enabled(LogLevel::Trace));
        logger.info("after reload");
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_failed_load_keeps_previous_configuration() {
        let (factory, _handle) = factory_with_memory("*", LogLevel::Info);
        let result = factory.load_configuration(|config| {
            config.for_logger("*").with_async(Default::default())?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(factory.get_logger("app").is_enabled(LogLevel::Info));
    }

    #[test]
    fn test_global_threshold() {
        let (factory, _handle) = factory_with_memory("*", LogLevel::Trace);
        let logger = factory.get_logger("app");
        factory.set_global_threshold(LogLevel::Error);

        assert!(!logger.is_enabled(LogLevel::Warn));
        assert!(logger.is_enabled(LogLevel::Error));
    }

    #[test]
    fn test_suspend_guards_nest() {
        let (factory, handle) = factory_with_memory("*", LogLevel::Trace);
        let logger = factory.get_logger("app");

        let outer = factory.suspend_logging();
        let inner = factory.suspend_logging();
        logger.error("suppressed");
        drop(inner);
        assert!(!factory.is_logging_enabled());
        assert!(!logger.is_enabled(LogLevel::Fatal));
        drop(outer);

        assert!(factory.is_logging_enabled());
        logger.error("resumed");
        assert_eq!(handle.messages(), vec!["resumed".to_string()]);
    }

    #[test]
    fn test_replacing_configuration_closes_old_targets() {
        let (factory, _handle) = factory_with_memory("*", LogLevel::Trace);
        let old = factory.configuration().unwrap();
        let old_target = Arc::clone(&old.targets()[0]);

        factory.load_configuration(|_| Ok(())).unwrap();
        assert!(old_target.is_closed());
    }

    #[test]
    fn test_reused_target_survives_replacement() {
        let (factory, handle) = factory_with_memory("*", LogLevel::Trace);
        let shared = Arc::clone(&factory.configuration().unwrap().targets()[0]);

        let reused = Arc::clone(&shared);
        factory
            .load_configuration(move |config| {
                config.for_logger("*").write_to_ref(reused)?;
                Ok(())
            })
            .unwrap();

        assert!(!shared.is_closed());
        factory.get_logger("app").info("still open");
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_shutdown_disables_and_closes() {
        let (factory, _handle) = factory_with_memory("*", LogLevel::Trace);
        let logger = factory.get_logger("app");
        let target = Arc::clone(&factory.configuration().unwrap().targets()[0]);

        factory.shutdown(Duration::from_secs(1)).unwrap();
        assert!(!logger.is_enabled(LogLevel::Fatal));
        assert!(target.is_closed());
        assert!(factory.shutdown(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: FactoryOptions =
            serde_json::from_str(r#"{"global_threshold":"Warn"}"#).unwrap();
        assert_eq!(options.global_threshold, LogLevel::Warn);
        assert_eq!(options.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
    }
}
