//! Target tree: terminal sinks, single-child wrappers and multi-child groups
//!
//! A [`Target`] is one of three shapes. Wrappers and groups hold their
//! children as [`TargetRef`]s that already exist when the wrapper is built,
//! so a target tree can never contain a cycle.

pub mod async_wrapper;
pub mod auto_flush;
pub mod buffering;
pub mod fallback;
pub mod filtering;
pub mod retry;
pub mod split;
pub mod traversal;

pub use async_wrapper::{AsyncOptions, AsyncWrapper};
pub use auto_flush::{AutoFlushOptions, AutoFlushWrapper};
pub use buffering::{BufferingOptions, BufferingOverflowAction, BufferingWrapper};
pub use fallback::FallbackGroup;
pub use filtering::FilteringWrapper;
pub use retry::{RetryOptions, RetryWrapper};
pub use split::SplitGroup;
pub use traversal::YieldAll;

use crate::config::naming::short_display_name;
use crate::core::{
    appender::Appender,
    error::{LoggerError, Result},
    filter::FilterPredicate,
    internal_log::panic_message,
    log_event::SharedEvent,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type TargetRef = Arc<Target>;

/// Closed set of target kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Terminal sink, tagged with its appender's kind name
    Terminal(&'static str),
    Async,
    Buffering,
    AutoFlush,
    Retry,
    Filtering,
    Fallback,
    Split,
}

impl TargetKind {
    /// Registered type name of the kind, e.g. "AsyncWrapper"
    pub fn type_name(&self) -> &'static str {
        match self {
            TargetKind::Terminal(name) => *name,
            TargetKind::Async => "AsyncWrapper",
            TargetKind::Buffering => "BufferingWrapper",
            TargetKind::AutoFlush => "AutoFlushWrapper",
            TargetKind::Retry => "RetryingWrapper",
            TargetKind::Filtering => "FilteringWrapper",
            TargetKind::Fallback => "FallbackGroup",
            TargetKind::Split => "SplitGroup",
        }
    }

    /// Short name used as the base of generated target names, e.g. "Async"
    pub fn display_name(&self) -> String {
        short_display_name(self.type_name())
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(
            self,
            TargetKind::Async
                | TargetKind::Buffering
                | TargetKind::AutoFlush
                | TargetKind::Retry
                | TargetKind::Filtering
        )
    }

    pub fn is_group(&self) -> bool {
        matches!(self, TargetKind::Fallback | TargetKind::Split)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

pub struct Terminal {
    appender: Mutex<Box<dyn Appender>>,
    kind_name: &'static str,
    wants_call_site: bool,
}

impl Terminal {
    fn new(appender: Box<dyn Appender>) -> Self {
        Self {
            kind_name: appender.kind_name(),
            wants_call_site: appender.wants_call_site(),
            appender: Mutex::new(appender),
        }
    }
}

pub enum Wrapper {
    Async(AsyncWrapper),
    Buffering(BufferingWrapper),
    AutoFlush(AutoFlushWrapper),
    Retry(RetryWrapper),
    Filtering(FilteringWrapper),
}

impl Wrapper {
    pub fn child(&self) -> &TargetRef {
        match self {
            Wrapper::Async(w) => w.child(),
            Wrapper::Buffering(w) => w.child(),
            Wrapper::AutoFlush(w) => w.child(),
            Wrapper::Retry(w) => w.child(),
            Wrapper::Filtering(w) => w.child(),
        }
    }
}

pub enum Group {
    Fallback(FallbackGroup),
    Split(SplitGroup),
}

impl Group {
    pub fn members(&self) -> &[TargetRef] {
        match self {
            Group::Fallback(g) => g.targets(),
            Group::Split(g) => g.targets(),
        }
    }
}

pub enum TargetShape {
    Terminal(Terminal),
    Wrapper(Wrapper),
    Group(Group),
}

/// A named node of the target tree
pub struct Target {
    name: RwLock<Option<String>>,
    shape: TargetShape,
    closed: AtomicBool,
}

impl Target {
    fn from_shape(shape: TargetShape) -> Self {
        Self {
            name: RwLock::new(None),
            shape,
            closed: AtomicBool::new(false),
        }
    }

    pub fn terminal<A: Appender>(appender: A) -> Self {
        Self::from_shape(TargetShape::Terminal(Terminal::new(Box::new(appender))))
    }

    pub fn terminal_boxed(appender: Box<dyn Appender>) -> Self {
        Self::from_shape(TargetShape::Terminal(Terminal::new(appender)))
    }

    /// Spawns the worker thread
    pub fn async_wrapper(child: TargetRef, options: AsyncOptions) -> Result<Self> {
        let wrapper = AsyncWrapper::new(child, options)?;
        Ok(Self::from_shape(TargetShape::Wrapper(Wrapper::Async(wrapper))))
    }

    /// Spawns a timer thread when `options.flush_timeout` is set
    pub fn buffering(child: TargetRef, options: BufferingOptions) -> Result<Self> {
        let wrapper = BufferingWrapper::new(child, options)?;
        Ok(Self::from_shape(TargetShape::Wrapper(Wrapper::Buffering(
            wrapper,
        ))))
    }

    pub fn auto_flush(child: TargetRef, options: AutoFlushOptions) -> Self {
        Self::from_shape(TargetShape::Wrapper(Wrapper::AutoFlush(
            AutoFlushWrapper::new(child, options),
        )))
    }

    pub fn retry(child: TargetRef, options: RetryOptions) -> Self {
        Self::from_shape(TargetShape::Wrapper(Wrapper::Retry(RetryWrapper::new(
            child, options,
        ))))
    }

    pub fn filtering<P>(child: TargetRef, condition: P) -> Self
    where
        P: Fn(&crate::core::LogEvent) -> bool + Send + Sync + 'static,
    {
        let condition: FilterPredicate = Arc::new(condition);
        Self::from_shape(TargetShape::Wrapper(Wrapper::Filtering(
            FilteringWrapper::new(child, condition),
        )))
    }

    pub fn fallback(targets: Vec<TargetRef>, return_to_first: bool) -> Result<Self> {
        let group = FallbackGroup::new(targets, return_to_first)?;
        Ok(Self::from_shape(TargetShape::Group(Group::Fallback(group))))
    }

    pub fn split(targets: Vec<TargetRef>) -> Self {
        Self::from_shape(TargetShape::Group(Group::Split(SplitGroup::new(targets))))
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        *self.name.write() = Some(name.into());
        self
    }

    /// Names are assigned once, by the configuration that registers the target
    pub(crate) fn set_name(&self, name: String) {
        *self.name.write() = Some(name);
    }

    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    pub fn has_name(&self) -> bool {
        self.name.read().as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Name if set, short kind name otherwise
    pub fn display_name(&self) -> String {
        match self.name.read().as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.kind().display_name(),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match &self.shape {
            TargetShape::Terminal(t) => TargetKind::Terminal(t.kind_name),
            TargetShape::Wrapper(Wrapper::Async(_)) => TargetKind::Async,
            TargetShape::Wrapper(Wrapper::Buffering(_)) => TargetKind::Buffering,
            TargetShape::Wrapper(Wrapper::AutoFlush(_)) => TargetKind::AutoFlush,
            TargetShape::Wrapper(Wrapper::Retry(_)) => TargetKind::Retry,
            TargetShape::Wrapper(Wrapper::Filtering(_)) => TargetKind::Filtering,
            TargetShape::Group(Group::Fallback(_)) => TargetKind::Fallback,
            TargetShape::Group(Group::Split(_)) => TargetKind::Split,
        }
    }

    pub fn shape(&self) -> &TargetShape {
        &self.shape
    }

    /// Wrapper child or group members, in order; empty for a terminal
    pub fn children(&self) -> &[TargetRef] {
        match &self.shape {
            TargetShape::Terminal(_) => &[],
            TargetShape::Wrapper(w) => std::slice::from_ref(w.child()),
            TargetShape::Group(g) => g.members(),
        }
    }

    pub fn as_async(&self) -> Option<&AsyncWrapper> {
        match &self.shape {
            TargetShape::Wrapper(Wrapper::Async(w)) => Some(w),
            _ => None,
        }
    }

    pub fn as_buffering(&self) -> Option<&BufferingWrapper> {
        match &self.shape {
            TargetShape::Wrapper(Wrapper::Buffering(w)) => Some(w),
            _ => None,
        }
    }

    pub fn as_retry(&self) -> Option<&RetryWrapper> {
        match &self.shape {
            TargetShape::Wrapper(Wrapper::Retry(w)) => Some(w),
            _ => None,
        }
    }

    pub fn as_fallback(&self) -> Option<&FallbackGroup> {
        match &self.shape {
            TargetShape::Group(Group::Fallback(g)) => Some(g),
            _ => None,
        }
    }

    /// Whether this is a terminal whose appender is an `A`
    pub fn is_appender<A: Appender>(&self) -> bool {
        self.with_appender::<A, _>(|_| ()).is_some()
    }

    /// Run `f` against the terminal's appender if it is an `A`
    pub fn with_appender<A: Appender, R>(&self, f: impl FnOnce(&mut A) -> R) -> Option<R> {
        let TargetShape::Terminal(terminal) = &self.shape else {
            return None;
        };
        let mut guard = terminal.appender.lock();
        let appender: &mut dyn Appender = &mut **guard;
        appender.as_any_mut().downcast_mut::<A>().map(f)
    }

    /// Whether any sink reachable from here reads call-site information
    pub fn wants_call_site(&self) -> bool {
        match &self.shape {
            TargetShape::Terminal(t) => t.wants_call_site,
            _ => self.children().iter().any(|c| c.wants_call_site()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn write(&self, event: &SharedEvent) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::target_closed(self.display_name()));
        }

        match &self.shape {
            TargetShape::Terminal(terminal) => {
                let mut appender = terminal.appender.lock();
                self.guard_terminal(|| appender.append(event))
            }
            TargetShape::Wrapper(Wrapper::Async(w)) => w.write(|| self.display_name(), event),
            TargetShape::Wrapper(Wrapper::Buffering(w)) => w.write(event),
            TargetShape::Wrapper(Wrapper::AutoFlush(w)) => w.write(event),
            TargetShape::Wrapper(Wrapper::Retry(w)) => w.write(|| self.display_name(), event),
            TargetShape::Wrapper(Wrapper::Filtering(w)) => w.write(event),
            TargetShape::Group(Group::Fallback(g)) => g.write(event),
            TargetShape::Group(Group::Split(g)) => g.write(event),
        }
    }

    /// Write events in order. A terminal takes the whole slice under one lock.
    pub fn write_batch(&self, events: &[SharedEvent]) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::target_closed(self.display_name()));
        }

        if let TargetShape::Terminal(terminal) = &self.shape {
            let mut appender = terminal.appender.lock();
            return self.guard_terminal(|| appender.append_batch(events));
        }

        let mut first_error = None;
        for event in events {
            if let Err(e) = self.write(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // A panicking sink is reported as a write failure of this target
    fn guard_terminal(&self, op: impl FnOnce() -> Result<()>) -> Result<()> {
        match catch_unwind(AssertUnwindSafe(op)) {
            Ok(result) => result,
            Err(panic_info) => Err(LoggerError::target_write(
                self.display_name(),
                format!("panicked: {}", panic_message(panic_info.as_ref())),
            )),
        }
    }

    /// Push pending events down to the sinks. Flushing a closed target is a no-op.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        match &self.shape {
            TargetShape::Terminal(terminal) => {
                let mut appender = terminal.appender.lock();
                self.guard_terminal(|| appender.flush())
            }
            TargetShape::Wrapper(Wrapper::Async(w)) => w.flush(&self.display_name(), timeout),
            TargetShape::Wrapper(Wrapper::Buffering(w)) => w.flush(timeout),
            TargetShape::Wrapper(Wrapper::AutoFlush(w)) => w.flush(timeout),
            TargetShape::Wrapper(_) | TargetShape::Group(_) => {
                let mut first_error = None;
                for child in self.children() {
                    if let Err(e) = child.flush(timeout) {
                        first_error.get_or_insert(e);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
        }
    }

    /// Drain and close this target, then its children. Closing twice is a no-op.
    pub fn close(&self, timeout: Duration) -> Result<()> {
        self.close_except(timeout, &HashSet::new())
    }

    /// Like [`Target::close`], skipping any target in `keep` together with its subtree
    pub(crate) fn close_except(&self, timeout: Duration, keep: &HashSet<*const Target>) -> Result<()> {
        if keep.contains(&(self as *const Target)) || self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut first_error = match &self.shape {
            TargetShape::Terminal(terminal) => {
                let mut appender = terminal.appender.lock();
                self.guard_terminal(|| appender.close()).err()
            }
            TargetShape::Wrapper(Wrapper::Async(w)) => {
                let name = self.display_name();
                if w.shutdown(&name, timeout) {
                    None
                } else {
                    Some(LoggerError::flush_timeout(name, timeout))
                }
            }
            TargetShape::Wrapper(Wrapper::Buffering(w)) => w.shutdown().err(),
            TargetShape::Wrapper(_) | TargetShape::Group(_) => None,
        };

        for child in self.children() {
            if let Err(e) = child.close_except(timeout, keep) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("children", &self.children())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, NullAppender};
    use crate::core::{log_event::LogEvent, log_level::LogLevel};

    fn event(message: &str) -> SharedEvent {
        Arc::new(LogEvent::new(LogLevel::Info, "targets", message))
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(TargetKind::Async.display_name(), "Async");
        assert_eq!(TargetKind::Retry.display_name(), "Retrying");
        assert_eq!(TargetKind::Fallback.display_name(), "Fallback");
        assert_eq!(TargetKind::Terminal("Memory").display_name(), "Memory");
    }

    #[test]
    fn test_typed_appender_access() {
        let (memory, _handle) = MemoryAppender::new();
        let target = Target::terminal(memory);

        assert!(target.is_appender::<MemoryAppender>());
        assert!(!target.is_appender::<NullAppender>());
        assert_eq!(target.with_appender(|m: &mut MemoryAppender| m.len()), Some(0));
    }

    #[test]
    fn test_closed_target_rejects_writes() {
        let (memory, handle) = MemoryAppender::new();
        let target = Target::terminal(memory).with_name("mem");

        target.write(&event("before")).unwrap();
        target.close(Duration::from_secs(1)).unwrap();
        target.close(Duration::from_secs(1)).unwrap();

        let err = target.write(&event("after")).unwrap_err();
        assert_eq!(err.to_string(), "Target 'mem' is closed");
        assert_eq!(handle.messages(), vec!["before"]);
    }

    #[test]
    fn test_close_propagates_to_children() {
        let (memory, _handle) = MemoryAppender::new();
        let leaf = Arc::new(Target::terminal(memory));
        let retry = Target::retry(Arc::clone(&leaf), RetryOptions::default());

        retry.close(Duration::from_secs(1)).unwrap();
        assert!(leaf.is_closed());
    }

    #[test]
    fn test_panicking_sink_becomes_write_error() {
        use crate::appenders::MethodCallAppender;

        let target = Target::terminal(MethodCallAppender::new(|_| panic!("sink exploded")))
            .with_name("boom");
        let err = target.write(&event("x")).unwrap_err();
        assert!(err.to_string().contains("sink exploded"));
    }
}
