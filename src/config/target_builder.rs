//! Target chains: write to targets, then decorate every head with wrappers

use super::configuration::Configuration;
use super::naming::ensure_unique_name;
use crate::core::{
    appender::Appender,
    error::{LoggerError, Result},
    log_event::LogEvent,
};
use crate::targets::{
    traversal::{find_first_appender, find_first_of_kind},
    AsyncOptions, AutoFlushOptions, BufferingOptions, RetryOptions, Target, TargetKind, TargetRef,
};
use std::sync::Arc;

/// Fluent target composition shared by [`TargetBuilder`] and [`super::RuleBuilder`].
///
/// The chain keeps a list of *heads*. Writing adds a head; applying a wrapper
/// replaces each head with a wrapper around it.
pub trait TargetChain: Sized {
    fn configuration(&mut self) -> &mut Configuration;

    /// Current heads, in write order
    fn heads(&self) -> Vec<TargetRef>;

    fn replace_heads(&mut self, heads: Vec<TargetRef>);

    /// Hook run on an owned target before it is registered
    fn prepare_target(&mut self, _target: &Target) {}

    /// Register `target` and add it as a head
    fn write_to(mut self, target: Target) -> Result<Self> {
        self.prepare_target(&target);
        let target = self.configuration().add_target(target)?;
        let mut heads = self.heads();
        heads.push(target);
        self.replace_heads(heads);
        Ok(self)
    }

    /// Add an already shared target as a head, registering it if needed
    fn write_to_ref(mut self, target: TargetRef) -> Result<Self> {
        self.prepare_target(&target);
        self.configuration().register_target(&target)?;
        let mut heads = self.heads();
        heads.push(target);
        self.replace_heads(heads);
        Ok(self)
    }

    fn write_to_all<I>(self, targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = Target>,
    {
        targets.into_iter().try_fold(self, |chain, t| chain.write_to(t))
    }

    /// Add the heads collected by another chain, e.g. [`TargetBuilder::into_targets`]
    fn write_to_targets<I>(self, targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = TargetRef>,
    {
        targets.into_iter().try_fold(self, |chain, t| chain.write_to_ref(t))
    }

    /// Replace every head with `factory(head)`.
    ///
    /// `None`, or the head itself, leaves that head alone. A new unnamed
    /// wrapper is named after its kind with the wrapped head's name as suffix
    /// (e.g. `Async_file`) and registered.
    fn with_wrapper<F>(mut self, mut factory: F) -> Result<Self>
    where
        F: FnMut(&TargetRef) -> Result<Option<TargetRef>>,
    {
        let heads = self.heads();
        if heads.is_empty() {
            return Err(LoggerError::NoTargetsToWrap);
        }

        let mut wrapped = Vec::with_capacity(heads.len());
        for head in heads {
            match factory(&head)? {
                Some(wrapper) if !Arc::ptr_eq(&wrapper, &head) => {
                    let config = self.configuration();
                    if !wrapper.has_name() {
                        let suffix = head.name();
                        let name =
                            ensure_unique_name(&config.all_targets(), &wrapper, suffix.as_deref());
                        wrapper.set_name(name);
                    }
                    config.register_target(&wrapper)?;
                    wrapped.push(wrapper);
                }
                _ => wrapped.push(head),
            }
        }
        self.replace_heads(wrapped);
        Ok(self)
    }

    /// Background writing. Heads that already are async wrappers are left alone.
    fn with_async(self, options: AsyncOptions) -> Result<Self> {
        self.with_wrapper(|head| {
            if head.kind() == TargetKind::Async {
                return Ok(None);
            }
            let wrapper = Target::async_wrapper(Arc::clone(head), options.clone())?;
            Ok(Some(Arc::new(wrapper)))
        })
    }

    fn with_buffering(self, options: BufferingOptions) -> Result<Self> {
        self.with_wrapper(|head| {
            let wrapper = Target::buffering(Arc::clone(head), options.clone())?;
            Ok(Some(Arc::new(wrapper)))
        })
    }

    fn with_auto_flush(self, options: AutoFlushOptions) -> Result<Self> {
        self.with_wrapper(|head| {
            Ok(Some(Arc::new(Target::auto_flush(
                Arc::clone(head),
                options.clone(),
            ))))
        })
    }

    /// Flush each head after writes matching `condition`
    fn with_auto_flush_when<P>(self, condition: P) -> Result<Self>
    where
        P: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        self.with_auto_flush(AutoFlushOptions {
            condition: Some(Arc::new(condition)),
            flush_on_condition_only: false,
        })
    }

    fn with_retry(self, options: RetryOptions) -> Result<Self> {
        self.with_wrapper(|head| {
            Ok(Some(Arc::new(Target::retry(
                Arc::clone(head),
                options.clone(),
            ))))
        })
    }

    fn with_filtering<P>(self, condition: P) -> Result<Self>
    where
        P: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        let condition = Arc::new(condition);
        self.with_wrapper(|head| {
            let condition = Arc::clone(&condition);
            Ok(Some(Arc::new(Target::filtering(
                Arc::clone(head),
                move |e: &LogEvent| condition(e),
            ))))
        })
    }

    /// Pair every head with `fallback` in a fallback group.
    ///
    /// An unnamed `fallback` is named with a `Fallback` suffix and registered once,
    /// shared by all groups.
    fn with_fallback(mut self, fallback: Target, return_to_first: bool) -> Result<Self> {
        if self.heads().is_empty() {
            return Err(LoggerError::NoTargetsToWrap);
        }

        let config = self.configuration();
        if !fallback.has_name() {
            let name = ensure_unique_name(&config.all_targets(), &fallback, Some("Fallback"));
            fallback.set_name(name);
        }
        let fallback = config.add_target(fallback)?;

        self.with_wrapper(|head| {
            let group = Target::fallback(vec![Arc::clone(head), Arc::clone(&fallback)], return_to_first)?;
            Ok(Some(Arc::new(group)))
        })
    }

    fn first_target(&self) -> Result<TargetRef> {
        self.heads()
            .into_iter()
            .next()
            .ok_or_else(|| LoggerError::target_not_found("Target"))
    }

    /// First target of `kind` reachable from any head, heads in order, each walked depth first
    fn first_target_of_kind(&self, kind: TargetKind) -> Result<TargetRef> {
        find_first_of_kind(&self.heads(), kind)
            .ok_or_else(|| LoggerError::target_not_found(kind.display_name()))
    }

    /// First terminal target whose appender is an `A`
    fn first_target_as<A: Appender>(&self) -> Result<TargetRef> {
        find_first_appender::<A>(&self.heads()).ok_or_else(|| {
            let type_name = std::any::type_name::<A>();
            let short = type_name.rsplit("::").next().unwrap_or(type_name);
            LoggerError::target_not_found(short)
        })
    }
}

/// Targets written outside of any rule, see [`Configuration::for_target`]
pub struct TargetBuilder<'a> {
    config: &'a mut Configuration,
    pending_name: Option<String>,
    targets: Vec<TargetRef>,
}

impl<'a> TargetBuilder<'a> {
    pub(crate) fn new(config: &'a mut Configuration, name: Option<String>) -> Self {
        Self {
            config,
            pending_name: name,
            targets: Vec::new(),
        }
    }

    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }

    pub fn into_targets(self) -> Vec<TargetRef> {
        self.targets
    }
}

impl TargetChain for TargetBuilder<'_> {
    fn configuration(&mut self) -> &mut Configuration {
        self.config
    }

    fn heads(&self) -> Vec<TargetRef> {
        self.targets.clone()
    }

    fn replace_heads(&mut self, heads: Vec<TargetRef>) {
        self.targets = heads;
    }

    fn prepare_target(&mut self, target: &Target) {
        if !target.has_name() {
            if let Some(name) = self.pending_name.take() {
                target.set_name(name);
            }
        }
    }
}
