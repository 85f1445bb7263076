//! Internal disposal bag for a record's cleanup callbacks.

use std::future::Future;
use std::pin::Pin;

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Identifier of a registered hook, used to retract it before disposal.
pub(crate) type HookId = u64;

enum Hook {
    Sync(Box<dyn FnOnce() + Send>),
    Async(Box<dyn FnOnce() -> BoxFutureUnit + Send>),
}

/// Container for cleanup hooks with FIFO execution order.
///
/// Sync and async hooks share one sequence; async hooks are awaited in place
/// so every hook observes all earlier ones as finished.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<(HookId, Hook)>,
    next_id: HookId,
}

impl DisposeBag {
    /// Add a synchronous cleanup hook.
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) -> HookId {
        self.push(Hook::Sync(f))
    }

    /// Add an asynchronous cleanup hook.
    pub(crate) fn push_async<Fut, F>(&mut self, f: F) -> HookId
    where
        Fut: Future<Output = ()> + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
    {
        self.push(Hook::Async(Box::new(move || Box::pin(f()))))
    }

    fn push(&mut self, hook: Hook) -> HookId {
        let id = self.next_id;
        self.next_id += 1;
        self.hooks.push((id, hook));
        id
    }

    /// Retract a hook that has not run yet.
    pub(crate) fn remove(&mut self, id: HookId) -> bool {
        match self.hooks.iter().position(|(hook_id, _)| *hook_id == id) {
            Some(pos) => {
                self.hooks.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Execute every hook in registration order, awaiting async ones one at a time.
    pub(crate) async fn run_all_in_order(self) {
        for (_, hook) in self.hooks {
            match hook {
                Hook::Sync(f) => (f)(),
                Hook::Async(f) => (f)().await,
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Detach every hook registered at or after position `at`, keeping their ids.
    pub(crate) fn split_off(&mut self, at: usize) -> DisposeBag {
        DisposeBag {
            hooks: self.hooks.split_off(at.min(self.hooks.len())),
            next_id: self.next_id,
        }
    }

    /// Move all hooks of `other` to the end of this bag.
    pub(crate) fn append(&mut self, other: DisposeBag) {
        self.hooks.extend(other.hooks);
        self.next_id = self.next_id.max(other.next_id);
    }
}
