//! Per-provider bookkeeping held inside an injector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::creator::{AnyCreator, AnyStore};
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, HookId};
use crate::provider::Provider;

/// Record lifecycle: `Pending -> Ready -> Disposed`.
pub(crate) enum RecordState {
    Pending,
    Ready(AnyStore),
    Disposed,
}

pub(crate) struct ProviderRecord {
    pub(crate) creator: AnyCreator,
    dispose_on_unmounted: AtomicBool,
    state: Mutex<RecordState>,
    // Held while the factory runs so a concurrent resolver waits instead of building twice
    init: Mutex<()>,
    disposes: Mutex<DisposeBag>,
    // Cleanups registered by factory runs that later failed
    orphaned: Mutex<DisposeBag>,
}

impl ProviderRecord {
    pub(crate) fn new(provider: &Provider) -> Self {
        let state = match &provider.use_value {
            Some(store) => RecordState::Ready(store.clone()),
            None => RecordState::Pending,
        };
        Self {
            creator: provider.creator.clone(),
            dispose_on_unmounted: AtomicBool::new(provider.dispose_on_unmounted),
            state: Mutex::new(state),
            init: Mutex::new(()),
            disposes: Mutex::new(DisposeBag::default()),
            orphaned: Mutex::new(DisposeBag::default()),
        }
    }

    pub(crate) fn addr(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as usize
    }

    /// The memoized store, `None` while pending. Fails once disposed.
    pub(crate) fn ready_value(&self) -> DiResult<Option<AnyStore>> {
        match &*self.state.lock() {
            RecordState::Ready(store) => Ok(Some(store.clone())),
            RecordState::Pending => Ok(None),
            RecordState::Disposed => Err(DiError::Disposed(self.creator.label().to_string())),
        }
    }

    pub(crate) fn is_materialized(&self) -> bool {
        matches!(&*self.state.lock(), RecordState::Ready(_))
    }

    pub(crate) fn is_disposed(&self) -> bool {
        matches!(&*self.state.lock(), RecordState::Disposed)
    }

    /// Runs `materialize` at most once; a concurrent caller waits and reuses the result.
    pub(crate) fn get_or_materialize<F>(&self, materialize: F) -> DiResult<AnyStore>
    where
        F: FnOnce() -> DiResult<AnyStore>,
    {
        let _init = self.init.lock();
        if let Some(store) = self.ready_value()? {
            return Ok(store);
        }

        let mark = self.disposes.lock().len();
        // Factory errors leave the record pending
        let store = match materialize() {
            Ok(store) => store,
            Err(err) => {
                let stray = self.disposes.lock().split_off(mark);
                if !stray.is_empty() {
                    tracing::debug!(
                        creator = %self.creator.label(),
                        hooks = stray.len(),
                        "keeping cleanups of failed factory run"
                    );
                    self.orphaned.lock().append(stray);
                }
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        if let RecordState::Disposed = *state {
            return Err(DiError::Disposed(self.creator.label().to_string()));
        }
        *state = RecordState::Ready(store.clone());
        Ok(store)
    }

    pub(crate) fn set_dispose_on_unmounted(&self, dispose: bool) {
        self.dispose_on_unmounted.store(dispose, Ordering::SeqCst);
    }

    pub(crate) fn push_sync_hook(&self, f: Box<dyn FnOnce() + Send>) -> HookId {
        self.disposes.lock().push_sync(f)
    }

    pub(crate) fn push_async_hook<Fut, F>(&self, f: F) -> HookId
    where
        Fut: std::future::Future<Output = ()> + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
    {
        self.disposes.lock().push_async(f)
    }

    pub(crate) fn remove_hook(&self, id: HookId) -> bool {
        self.disposes.lock().remove(id) || self.orphaned.lock().remove(id)
    }

    /// Moves the record to `Disposed`, then runs cleanups left by failed
    /// factory runs, the live cleanups in registration order and finally the
    /// store teardown. Returns whether anything was materialized; a record
    /// that never materialized runs only its leftover cleanups.
    pub(crate) async fn dispose(&self) -> bool {
        let store = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, RecordState::Disposed) {
                RecordState::Ready(store) => Some(store),
                RecordState::Pending | RecordState::Disposed => None,
            }
        };

        let mut bag = std::mem::take(&mut *self.orphaned.lock());
        let Some(store) = store else {
            bag.run_all_in_order().await;
            return false;
        };

        bag.append(std::mem::take(&mut *self.disposes.lock()));
        tracing::trace!(
            creator = %self.creator.label(),
            hooks = bag.len(),
            teardown = self.creator.has_teardown(),
            "disposing record"
        );
        bag.run_all_in_order().await;

        if self.dispose_on_unmounted.load(Ordering::SeqCst) {
            if let Some(teardown) = self.creator.teardown(store) {
                teardown.await;
            }
        }
        true
    }
}
