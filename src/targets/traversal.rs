//! Lazy pre-order walk over a target tree

use super::{Target, TargetKind, TargetRef};
use crate::core::appender::Appender;
use std::iter::FusedIterator;
use std::sync::Arc;

/// Yields a target, then each wrapper child or group member in order, depth first.
///
/// Children are only looked at when their parent is yielded, so stopping
/// early never touches the rest of the tree.
pub struct YieldAll {
    stack: Vec<TargetRef>,
}

impl YieldAll {
    pub fn new(root: &TargetRef) -> Self {
        Self {
            stack: vec![Arc::clone(root)],
        }
    }

    /// Walk several roots one after the other
    pub fn over<'a>(roots: impl IntoIterator<Item = &'a TargetRef>) -> Self {
        let mut stack: Vec<TargetRef> = roots.into_iter().map(Arc::clone).collect();
        stack.reverse();
        Self { stack }
    }
}

impl Iterator for YieldAll {
    type Item = TargetRef;

    fn next(&mut self) -> Option<TargetRef> {
        let target = self.stack.pop()?;
        self.stack.extend(target.children().iter().rev().map(Arc::clone));
        Some(target)
    }
}

impl FusedIterator for YieldAll {}

impl Target {
    /// Walk this target and everything reachable below it
    pub fn yield_all(self: &Arc<Self>) -> YieldAll {
        YieldAll::new(self)
    }
}

pub fn find_first_of_kind<'a>(
    roots: impl IntoIterator<Item = &'a TargetRef>,
    kind: TargetKind,
) -> Option<TargetRef> {
    YieldAll::over(roots).find(|t| t.kind() == kind)
}

pub fn find_first_appender<'a, A: Appender>(
    roots: impl IntoIterator<Item = &'a TargetRef>,
) -> Option<TargetRef> {
    YieldAll::over(roots).find(|t| t.is_appender::<A>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{MemoryAppender, NullAppender};
    use crate::targets::{AsyncOptions, BufferingOptions, RetryOptions};

    #[test]
    fn test_yield_all_head_first() {
        let (memory, _handle) = MemoryAppender::new();
        let leaf = Arc::new(Target::terminal(memory));
        let retry = Arc::new(Target::retry(leaf, RetryOptions::default()));
        let buffering = Arc::new(Target::buffering(retry, BufferingOptions::default()).unwrap());
        let head = Arc::new(Target::async_wrapper(buffering, AsyncOptions::default()).unwrap());

        let kinds: Vec<_> = head.yield_all().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TargetKind::Async,
                TargetKind::Buffering,
                TargetKind::Retry,
                TargetKind::Terminal("Memory"),
            ]
        );
    }

    #[test]
    fn test_group_members_in_order() {
        let a = Arc::new(Target::terminal(NullAppender::new()).with_name("a"));
        let b = Arc::new(Target::terminal(NullAppender::new()).with_name("b"));
        let group = Arc::new(Target::fallback(vec![a, b], true).unwrap().with_name("g"));
        let head = Arc::new(Target::retry(group, RetryOptions::default()).with_name("r"));

        let names: Vec<_> = head.yield_all().map(|t| t.display_name()).collect();
        assert_eq!(names, vec!["r", "g", "a", "b"]);
    }

    #[test]
    fn test_find_first() {
        let (memory, _handle) = MemoryAppender::new();
        let leaf = Arc::new(Target::terminal(memory));
        let head = Arc::new(Target::retry(leaf, RetryOptions::default()));

        let roots = [head];
        assert!(find_first_appender::<MemoryAppender>(&roots).is_some());
        assert!(find_first_appender::<NullAppender>(&roots).is_none());
        assert!(find_first_of_kind(&roots, TargetKind::Retry).is_some());
        assert!(find_first_of_kind(&roots, TargetKind::Async).is_none());
    }
}
