//! Named logger: the level gate in front of the dispatcher

use super::{
    dispatcher::LoggerRoutes,
    error::{LoggerError, Result},
    log_context::{FieldValue, LogContext},
    log_event::{CallSite, LogEvent, SharedEvent},
    log_level::LogLevel,
    metrics::DeliveryMetrics,
};
use parking_lot::RwLock;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A named source of log events.
///
/// Obtained from [`crate::LogFactory::get_logger`]; one instance exists per
/// name and follows every configuration change of its factory. Each level
/// has a cached gate, so a disabled call costs one atomic load and never
/// builds an event or evaluates a message closure.
pub struct Logger {
    name: String,
    routes: RwLock<Arc<LoggerRoutes>>,
    enabled: [AtomicBool; LogLevel::COUNT],
    /// Per-level gate for capturing the caller's location
    call_site: [AtomicBool; LogLevel::COUNT],
    metrics: Arc<DeliveryMetrics>,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, routes: LoggerRoutes, metrics: Arc<DeliveryMetrics>) -> Self {
        let logger = Self {
            name: name.into(),
            routes: RwLock::new(Arc::new(LoggerRoutes::empty())),
            enabled: Default::default(),
            call_site: Default::default(),
            metrics,
        };
        logger.apply_routes(routes);
        logger
    }

    /// Swap in freshly built routes and refresh the cached gates
    pub(crate) fn apply_routes(&self, routes: LoggerRoutes) {
        let routes = Arc::new(routes);
        let mut guard = self.routes.write();
        for level in LogLevel::all() {
            if let Some(idx) = level.index() {
                self.enabled[idx].store(routes.is_enabled(level), Ordering::Release);
                self.call_site[idx].store(routes.wants_call_site(level), Ordering::Release);
            }
        }
        *guard = routes;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an event at `level` would reach at least one target
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level
            .index()
            .is_some_and(|idx| self.enabled[idx].load(Ordering::Acquire))
    }

    #[inline]
    fn wants_call_site(&self, level: LogLevel) -> bool {
        level
            .index()
            .is_some_and(|idx| self.call_site[idx].load(Ordering::Acquire))
    }

    /// Routes currently in effect for this logger
    pub fn routes(&self) -> Arc<LoggerRoutes> {
        Arc::clone(&self.routes.read())
    }

    /// Delivery counters shared with the owning factory
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        let event = LogEvent::new(level, self.name.as_str(), message);
        self.dispatch(event, Location::caller());
    }

    /// Log the message produced by `producer`, which only runs when `level` is enabled.
    ///
    /// A disabled call returns `Ok(())` without looking at `producer`. An
    /// enabled call without a producer fails with [`LoggerError::MissingArgument`].
    #[track_caller]
    pub fn log_with<F, S>(&self, level: LogLevel, producer: Option<F>) -> Result<()>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        if !self.is_enabled(level) {
            return Ok(());
        }
        let producer = producer.ok_or_else(|| LoggerError::missing_argument("message producer"))?;
        let event = LogEvent::new(level, self.name.as_str(), producer());
        self.dispatch(event, Location::caller());
        Ok(())
    }

    /// Log a `{0}`-style template; parameters are only converted when enabled
    #[track_caller]
    pub fn log_template<I, V>(&self, level: LogLevel, template: &str, parameters: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        if !self.is_enabled(level) {
            return;
        }
        let event = LogEvent::new(level, self.name.as_str(), template).with_parameters(parameters);
        self.dispatch(event, Location::caller());
    }

    /// Log with structured properties attached
    #[track_caller]
    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        if !self.is_enabled(level) {
            return;
        }
        let event = LogEvent::new(level, self.name.as_str(), message).with_properties(context);
        self.dispatch(event, Location::caller());
    }

    /// Log an error value alongside a message
    #[track_caller]
    pub fn log_error<E>(&self, level: LogLevel, error: E, message: impl Into<String>)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        if !self.is_enabled(level) {
            return;
        }
        let event = LogEvent::new(level, self.name.as_str(), message).with_exception(error);
        self.dispatch(event, Location::caller());
    }

    /// Log a fully built event. An empty logger name is replaced with this logger's.
    #[track_caller]
    pub fn log_event(&self, mut event: LogEvent) {
        if !self.is_enabled(event.level) {
            return;
        }
        if event.logger_name.is_empty() {
            event.logger_name = self.name.clone();
        }
        self.dispatch(event, Location::caller());
    }

    fn dispatch(&self, mut event: LogEvent, location: &'static Location<'static>) {
        if event.call_site.is_none() && self.wants_call_site(event.level) {
            event.call_site = Some(CallSite::from_location(location));
        }
        let event: SharedEvent = Arc::new(event);
        let routes = self.routes();
        routes.dispatch(&event, &self.metrics);
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let enabled: Vec<LogLevel> = LogLevel::all().filter(|l| self.is_enabled(*l)).collect();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("enabled", &enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, MemoryHandle, MethodCallAppender};
    use crate::core::logging_rule::LoggingRule;
    use crate::targets::Target;
    use std::sync::atomic::AtomicUsize;

    fn logger_with_memory(min: LogLevel) -> (Logger, MemoryHandle) {
        let (memory, handle) = MemoryAppender::new();
        let mut rule = LoggingRule::new("*");
        rule.levels.set_range(min, LogLevel::MAX);
        rule.targets.push(Arc::new(Target::terminal(memory)));
        let routes = LoggerRoutes::build("app", &[rule], LogLevel::Trace);
        (
            Logger::new("app", routes, Arc::new(DeliveryMetrics::new())),
            handle,
        )
    }

    #[test]
    fn test_gate_follows_routes() {
        let (logger, handle) = logger_with_memory(LogLevel::Info);
        assert!(!logger.is_enabled(LogLevel::Debug));
        assert!(logger.is_enabled(LogLevel::Info));
        assert!(!logger.is_enabled(LogLevel::Off));

        logger.debug("hidden");
        logger.info("shown");
        assert_eq!(handle.messages(), vec!["shown".to_string()]);

        logger.apply_routes(LoggerRoutes::empty());
        assert!(!logger.is_enabled(LogLevel::Fatal));
    }

    #[test]
    fn test_disabled_producer_never_runs() {
        let (logger, handle) = logger_with_memory(LogLevel::Warn);
        let calls = AtomicUsize::new(0);

        logger
            .log_with(
                LogLevel::Debug,
                Some(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "expensive"
                }),
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        logger
            .log_with(
                LogLevel::Error,
                Some(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "expensive"
                }),
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_missing_producer_only_fails_when_enabled() {
        let (logger, _handle) = logger_with_memory(LogLevel::Warn);
        let none: Option<fn() -> String> = None;

        assert!(logger.log_with(LogLevel::Info, none).is_ok());
        let err = logger.log_with(LogLevel::Error, none).unwrap_err();
        assert!(matches!(err, LoggerError::MissingArgument { .. }));
    }

    #[test]
    fn test_template_parameters() {
        let (logger, handle) = logger_with_memory(LogLevel::Trace);
        logger.log_template(LogLevel::Info, "user {0} took {1} ms", vec![
            FieldValue::from("alice"),
            FieldValue::from(42i64),
        ]);
        assert_eq!(handle.messages(), vec!["user alice took 42 ms".to_string()]);
    }

    #[test]
    fn test_call_site_only_when_requested() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let appender = MethodCallAppender::new(move |e: &LogEvent| {
            sink.lock().push(e.call_site.clone());
            Ok(())
        })
        .with_call_site();

        let mut rule = LoggingRule::new("*");
        rule.targets.push(Arc::new(Target::terminal(appender)));
        let routes = LoggerRoutes::build("app", &[rule], LogLevel::Trace);
        let logger = Logger::new("app", routes, Arc::new(DeliveryMetrics::new()));

        logger.info("where am I");
        let captured = seen.lock()[0].clone().expect("call site captured");
        assert!(captured.file.as_deref().is_some_and(|f| f.ends_with("logger.rs")));

        let (plain, handle) = logger_with_memory(LogLevel::Trace);
        plain.info("no location");
        assert!(handle.events()[0].call_site.is_none());
    }

    #[test]
    fn test_log_event_fills_logger_name() {
        let (logger, handle) = logger_with_memory(LogLevel::Trace);
        logger.log_event(LogEvent::new(LogLevel::Warn, "", "anonymous"));
        assert_eq!(handle.events()[0].logger_name, "app");
    }
}
