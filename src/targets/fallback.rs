//! Write to the first member that accepts the event

use super::TargetRef;
use crate::core::{
    error::{LoggerError, Result},
    internal_log,
    log_event::SharedEvent,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fallback group.
///
/// Writes go to the current member. A failure moves to the next member
/// (wrapping around) and retries there until every member was tried once.
/// With `return_to_first`, a success on any member but the first resets the
/// group back to the first.
pub struct FallbackGroup {
    targets: Vec<TargetRef>,
    current: AtomicUsize,
    return_to_first: bool,
}

impl FallbackGroup {
    pub fn new(targets: Vec<TargetRef>, return_to_first: bool) -> Result<Self> {
        if targets.is_empty() {
            return Err(LoggerError::config(
                "FallbackGroup",
                "at least one member target is required",
            ));
        }
        Ok(Self {
            targets,
            current: AtomicUsize::new(0),
            return_to_first,
        })
    }

    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }

    /// Index of the member the next write starts at
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn return_to_first(&self) -> bool {
        self.return_to_first
    }

    pub(crate) fn write(&self, event: &SharedEvent) -> Result<()> {
        let count = self.targets.len();
        let start = self.current.load(Ordering::Acquire) % count;
        let mut last_error = None;

        for offset in 0..count {
            let index = (start + offset) % count;
            match self.targets[index].write(event) {
                Ok(()) => {
                    if index > 0 && self.return_to_first {
                        self.current.store(0, Ordering::Release);
                    } else {
                        self.current.store(index, Ordering::Release);
                    }
                    return Ok(());
                }
                Err(e) => {
                    let next = (index + 1) % count;
                    internal_log::warn(format_args!(
                        "Fallback member '{}' failed: {}. Switching to '{}'.",
                        self.targets[index].display_name(),
                        e,
                        self.targets[next].display_name()
                    ));
                    self.current.store(next, Ordering::Release);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(LoggerError::all_targets_failed(count, last)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, MethodCallAppender};
    use crate::core::{log_event::LogEvent, log_level::LogLevel};
    use crate::targets::Target;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn event(message: &str) -> SharedEvent {
        Arc::new(LogEvent::new(LogLevel::Error, "fallback", message))
    }

    fn switchable(healthy: Arc<AtomicBool>) -> TargetRef {
        Arc::new(Target::terminal(MethodCallAppender::new(move |_| {
            if healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(LoggerError::target_write("primary", "down"))
            }
        })))
    }

    #[test]
    fn test_returns_to_first_after_success() {
        let healthy = Arc::new(AtomicBool::new(false));
        let (memory, handle) = MemoryAppender::new();
        let group = FallbackGroup::new(
            vec![
                switchable(Arc::clone(&healthy)),
                Arc::new(Target::terminal(memory)),
            ],
            true,
        )
        .unwrap();

        group.write(&event("one")).unwrap();
        assert_eq!(handle.messages(), vec!["one"]);
        assert_eq!(group.current_index(), 0);

        healthy.store(true, Ordering::SeqCst);
        group.write(&event("two")).unwrap();
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_sticks_to_fallback_without_return() {
        let healthy = Arc::new(AtomicBool::new(false));
        let (memory, handle) = MemoryAppender::new();
        let group = FallbackGroup::new(
            vec![
                switchable(Arc::clone(&healthy)),
                Arc::new(Target::terminal(memory)),
            ],
            false,
        )
        .unwrap();

        group.write(&event("one")).unwrap();
        assert_eq!(group.current_index(), 1);

        healthy.store(true, Ordering::SeqCst);
        group.write(&event("two")).unwrap();
        assert_eq!(handle.messages(), vec!["one", "two"]);
    }

    #[test]
    fn test_all_members_failing() {
        let down = Arc::new(AtomicBool::new(false));
        let group = FallbackGroup::new(
            vec![switchable(Arc::clone(&down)), switchable(Arc::clone(&down))],
            true,
        )
        .unwrap();

        let err = group.write(&event("lost")).unwrap_err();
        assert!(matches!(err, LoggerError::AllTargetsFailed { attempted: 2, .. }));
    }

    #[test]
    fn test_empty_group_is_rejected() {
        assert!(FallbackGroup::new(Vec::new(), true).is_err());
    }
}
