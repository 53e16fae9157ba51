//! Flush hooks
//!
//! A cell holds at most one hook per [`HookKind`]. Binding a new hook drops
//! the previous one first. Hooks are observers: a panicking hook is caught,
//! logged and counted, and the flush goes on.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use streamstate_core::{HookError, HookKind, StateKey};
use tracing::{error, trace};

/// Zero-argument callback fired around a commit
pub type FlushHook<'a> = Box<dyn FnMut() + 'a>;

struct HookSlot<'a> {
    kind: HookKind,
    hook: Option<FlushHook<'a>>,
}

impl<'a> HookSlot<'a> {
    fn new(kind: HookKind) -> Self {
        Self { kind, hook: None }
    }

    fn replace(&mut self, hook: Option<FlushHook<'a>>, key: &StateKey) {
        if self.hook.take().is_some() {
            trace!(key = %key, hook = %self.kind, "unbound previous hook");
        }
        if hook.is_some() {
            trace!(key = %key, hook = %self.kind, "bound hook");
        }
        self.hook = hook;
    }

    fn fire(&mut self, key: &StateKey) -> Option<HookError> {
        let hook = self.hook.as_mut()?;
        match catch_unwind(AssertUnwindSafe(|| hook())) {
            Ok(()) => None,
            Err(payload) => Some(HookError {
                hook: self.kind,
                key: key.clone(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

/// The pair of caller hooks bound to one cell
pub(crate) struct FlushHooks<'a> {
    flushing: HookSlot<'a>,
    flushed: HookSlot<'a>,
    failures: u64,
}

impl<'a> FlushHooks<'a> {
    pub(crate) fn new() -> Self {
        Self {
            flushing: HookSlot::new(HookKind::Flushing),
            flushed: HookSlot::new(HookKind::Flushed),
            failures: 0,
        }
    }

    fn slot(&mut self, kind: HookKind) -> &mut HookSlot<'a> {
        match kind {
            HookKind::Flushing => &mut self.flushing,
            HookKind::Flushed => &mut self.flushed,
        }
    }

    pub(crate) fn replace(&mut self, kind: HookKind, hook: Option<FlushHook<'a>>, key: &StateKey) {
        self.slot(kind).replace(hook, key);
    }

    pub(crate) fn is_bound(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::Flushing => self.flushing.hook.is_some(),
            HookKind::Flushed => self.flushed.hook.is_some(),
        }
    }

    /// Fire one hook, isolating a panic
    pub(crate) fn fire(&mut self, kind: HookKind, key: &StateKey) {
        if let Some(err) = self.slot(kind).fire(key) {
            self.failures += 1;
            error!(
                key = %err.key,
                hook = %err.hook,
                error = %err,
                "flush hook failed; continuing flush"
            );
        }
    }

    pub(crate) fn failures(&self) -> u64 {
        self.failures
    }

    /// Unbind both hooks
    pub(crate) fn clear(&mut self, key: &StateKey) {
        self.flushing.replace(None, key);
        self.flushed.replace(None, key);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
