//! Context handed to store factories during materialization.

use std::future::Future;
use std::sync::{Arc, Weak};

use crate::creator::StoreCreator;
use crate::error::DiResult;
use crate::internal::HookId;

use super::record::ProviderRecord;
use super::{GetOptions, Injector, InjectorId};

/// Context passed to a store factory the first time its record is resolved.
///
/// Through it a factory can resolve sibling and ancestor stores, register
/// cleanups that run when the owning scope is disposed, and derive store
/// identifiers unique to the owning injector.
///
/// Resolution goes through the injector that owns the record being built, so
/// a store registered on a parent scope sees the parent's view of the chain,
/// not the child's that happened to request it.
///
/// # Examples
///
/// ```
/// use store_injector::{Injector, StoreCreator};
///
/// let theme = StoreCreator::labeled("theme", |_| "dark".to_string());
/// let theme_dep = theme.clone();
/// let layout = StoreCreator::try_labeled("layout", move |ctx| {
///     let theme = ctx.get_store(&theme_dep)?;
///     let _cleanup = ctx.on_unmounted(|| println!("layout released"));
///     Ok(format!("{} @ {}", ctx.use_store_id("layout"), theme))
/// });
///
/// let injector = Injector::builder(vec![theme.clone(), layout.clone()])
///     .name("shell")
///     .build()
///     .unwrap();
///
/// let layout = injector.get(&layout).unwrap();
/// assert_eq!(*layout, format!("layout~[shell]~<{}> @ dark", injector.id()));
/// ```
pub struct InjectionContext<'a> {
    injector: &'a Injector,
    record: &'a Arc<ProviderRecord>,
}

impl<'a> InjectionContext<'a> {
    pub(crate) fn new(injector: &'a Injector, record: &'a Arc<ProviderRecord>) -> Self {
        Self { injector, record }
    }

    /// Resolves a required store through the owning injector.
    pub fn get_store<T: Send + Sync + 'static>(&self, creator: &StoreCreator<T>) -> DiResult<Arc<T>> {
        self.injector.get(creator)
    }

    /// Resolves a store through the owning injector, `None` when nothing provides it.
    pub fn get_store_optional<T: Send + Sync + 'static>(
        &self,
        creator: &StoreCreator<T>,
    ) -> DiResult<Option<Arc<T>>> {
        self.injector.get_optional(creator)
    }

    /// Resolves a store with explicit options.
    pub fn get_store_with<T: Send + Sync + 'static>(
        &self,
        creator: &StoreCreator<T>,
        options: GetOptions,
    ) -> DiResult<Option<Arc<T>>> {
        self.injector.get_with(creator, options)
    }

    /// Registers a cleanup that runs when the owning scope disposes this record.
    ///
    /// Cleanups run in registration order. The returned handle retracts the
    /// cleanup if removed before disposal.
    pub fn on_unmounted<F>(&self, f: F) -> CleanupHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.record.push_sync_hook(Box::new(f));
        CleanupHandle::new(self.record, id)
    }

    /// Registers an asynchronous cleanup, awaited before the next cleanup starts.
    pub fn on_unmounted_async<F, Fut>(&self, f: F) -> CleanupHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.record.push_async_hook(f);
        CleanupHandle::new(self.record, id)
    }

    /// Composes a store identifier unique to the owning injector.
    ///
    /// `"<id>~[<name>]~<<injector id>>"` for a named injector, `"<id>~<<injector id>>"` otherwise.
    pub fn use_store_id(&self, id: &str) -> String {
        self.injector.store_id(id)
    }

    /// Id of the injector that owns the record being materialized.
    pub fn injector_id(&self) -> InjectorId {
        self.injector.id()
    }

    /// Name of the owning injector.
    pub fn injector_name(&self) -> Option<&str> {
        self.injector.name()
    }
}

/// Handle to a cleanup registered through [`InjectionContext::on_unmounted`].
///
/// Dropping the handle keeps the cleanup registered.
pub struct CleanupHandle {
    record: Weak<ProviderRecord>,
    id: HookId,
}

impl CleanupHandle {
    fn new(record: &Arc<ProviderRecord>, id: HookId) -> Self {
        Self {
            record: Arc::downgrade(record),
            id,
        }
    }

    /// Retracts the cleanup. Returns `false` if it already ran or was removed.
    pub fn remove(self) -> bool {
        self.record
            .upgrade()
            .map(|record| record.remove_hook(self.id))
            .unwrap_or(false)
    }
}
