//! The scope-chained store injector.
//!
//! An [`Injector`] maps creator identities to lazily materialized records,
//! falls back to its parent for creators it does not register, can be
//! superseded by a new generation that keeps unchanged live stores, and tears
//! every materialized store down in registration order when its scope exits.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use crate::creator::{AnyCreator, AnyStore, StoreCreator};
use crate::error::{DiError, DiResult};
use crate::internal::MaterializeGuard;
use crate::key::CreatorKey;
use crate::observer::{InjectorObserver, Observers};
use crate::provider::{Provider, ProviderEntry};

mod context;
mod reconcile;
mod record;

pub use context::{CleanupHandle, InjectionContext};
pub use reconcile::ProviderDiff;
use record::ProviderRecord;

static NEXT_INJECTOR_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique, monotonically increasing injector identifier.
///
/// Never reused, so sibling scopes built from the same providers still get
/// distinct store identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InjectorId(u64);

impl InjectorId {
    fn next() -> Self {
        InjectorId(NEXT_INJECTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InjectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for a single resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Return `None` instead of failing when nothing in the chain provides the store
    pub optional: bool,
}

impl GetOptions {
    pub fn required() -> Self {
        Self { optional: false }
    }

    pub fn optional() -> Self {
        Self { optional: true }
    }
}

/// Scope-chained store injector.
///
/// `Injector` is a cheap handle; clones share the same scope. A child holds
/// only a weak reference to its parent: whoever built the chain owns each
/// scope's lifetime and calls [`dispose`](Injector::dispose) exactly once when
/// that scope ends.
///
/// # Examples
///
/// ```
/// use store_injector::{Injector, StoreCreator};
/// use std::sync::Arc;
///
/// let session = StoreCreator::labeled("session", |_| String::from("guest"));
/// let cart = StoreCreator::labeled("cart", |_| Vec::<u32>::new());
///
/// let root = Injector::builder(vec![session.clone()]).name("app").build().unwrap();
/// let page = Injector::builder(vec![cart.clone()]).parent(&root).build().unwrap();
///
/// // Falls back to the parent for `session`
/// assert!(Arc::ptr_eq(&page.get(&session).unwrap(), &root.get(&session).unwrap()));
/// // Registered nowhere above `page`
/// assert!(root.get_optional(&cart).unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

struct InjectorInner {
    id: InjectorId,
    name: Option<String>,
    parent: Option<Weak<InjectorInner>>,
    // Kept as the "old" side of the next reconciliation
    providers: Vec<Provider>,
    records: HashMap<CreatorKey, Arc<ProviderRecord>>,
    // Insertion order drives disposal order
    order: Vec<CreatorKey>,
    observers: Observers,
    superseded: AtomicBool,
}

impl Injector {
    /// Starts building an injector from a provider list.
    pub fn builder<I>(providers: I) -> InjectorBuilder
    where
        I: IntoIterator,
        I::Item: Into<ProviderEntry>,
    {
        InjectorBuilder {
            entries: providers.into_iter().map(Into::into).collect(),
            parent: None,
            name: None,
            observers: Observers::default(),
        }
    }

    pub fn id(&self) -> InjectorId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The enclosing injector, if one was given and is still alive.
    pub fn parent(&self) -> Option<Injector> {
        let weak = self.inner.parent.as_ref()?;
        match weak.upgrade() {
            Some(inner) => Some(Injector { inner }),
            None => {
                tracing::warn!(injector = %self.inner.id, "parent injector dropped while child still resolves through it");
                None
            }
        }
    }

    /// Whether a newer generation has been reconciled against this one.
    pub fn is_superseded(&self) -> bool {
        self.inner.superseded.load(Ordering::SeqCst)
    }

    /// Creator keys registered on this scope, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &CreatorKey> {
        self.inner.order.iter()
    }

    /// Composes a store identifier unique to this injector.
    ///
    /// ```
    /// use store_injector::Injector;
    ///
    /// let named = Injector::builder(Vec::<store_injector::ProviderEntry>::new())
    ///     .name("scopeA")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(named.store_id("x"), format!("x~[scopeA]~<{}>", named.id()));
    /// ```
    pub fn store_id(&self, id: &str) -> String {
        match &self.inner.name {
            Some(name) => format!("{id}~[{name}]~<{}>", self.inner.id),
            None => format!("{id}~<{}>", self.inner.id),
        }
    }

    /// Resolves a required store, walking up the parent chain.
    pub fn get<T: Send + Sync + 'static>(&self, creator: &StoreCreator<T>) -> DiResult<Arc<T>> {
        self.get_with(creator, GetOptions::required())?
            .ok_or_else(|| DiError::NotFound(creator.label().to_string()))
    }

    /// Resolves a store, `None` when nothing in the chain provides it.
    pub fn get_optional<T: Send + Sync + 'static>(
        &self,
        creator: &StoreCreator<T>,
    ) -> DiResult<Option<Arc<T>>> {
        self.get_with(creator, GetOptions::optional())
    }

    /// Resolves a store with explicit options.
    ///
    /// The first scope in the chain that registers `creator` owns the
    /// resolution: its record is materialized on first use and memoized.
    pub fn get_with<T: Send + Sync + 'static>(
        &self,
        creator: &StoreCreator<T>,
        options: GetOptions,
    ) -> DiResult<Option<Arc<T>>> {
        match self.resolve_any(creator.as_any())? {
            Some(store) => store
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>())),
            None if options.optional => Ok(None),
            None => Err(DiError::NotFound(creator.label().to_string())),
        }
    }

    /// Resolves an untyped creator.
    pub fn get_any(&self, creator: &AnyCreator, options: GetOptions) -> DiResult<Option<AnyStore>> {
        match self.resolve_any(creator)? {
            Some(store) => Ok(Some(store)),
            None if options.optional => Ok(None),
            None => Err(DiError::NotFound(creator.label().to_string())),
        }
    }

    /// Whether `creator` is registered on this scope or any ancestor.
    pub fn is_provided<T: Send + Sync + 'static>(&self, creator: &StoreCreator<T>) -> bool {
        let key = creator.as_any().key();
        self.owner_of(&key).is_some()
    }

    /// Whether the record for `creator` on this very scope holds a live store.
    pub fn is_materialized<T: Send + Sync + 'static>(&self, creator: &StoreCreator<T>) -> bool {
        self.inner
            .records
            .get(&creator.as_any().key())
            .is_some_and(|record| record.is_materialized())
    }

    fn owner_of(&self, key: &CreatorKey) -> Option<(Injector, Arc<ProviderRecord>)> {
        let mut current = Some(self.clone());
        while let Some(injector) = current {
            if let Some(record) = injector.inner.records.get(key) {
                let record = record.clone();
                return Some((injector, record));
            }
            current = injector.parent();
        }
        None
    }

    fn resolve_any(&self, creator: &AnyCreator) -> DiResult<Option<AnyStore>> {
        match self.owner_of(&creator.key()) {
            Some((owner, record)) => owner.materialize(&record).map(Some),
            None => Ok(None),
        }
    }

    fn materialize(&self, record: &Arc<ProviderRecord>) -> DiResult<AnyStore> {
        if let Some(store) = record.ready_value()? {
            return Ok(store);
        }

        let _guard = MaterializeGuard::enter(record.addr(), record.creator.shared_label())?;
        record.get_or_materialize(|| {
            let key = record.creator.key();
            self.inner.observers.materializing(&key, self.inner.id);

            let start = Instant::now();
            let ctx = InjectionContext::new(self, record);
            let store = record.creator.create(&ctx)?;
            let elapsed = start.elapsed();

            tracing::debug!(injector = %self.inner.id, creator = %key, ?elapsed, "store materialized");
            self.inner.observers.materialized(&key, self.inner.id, elapsed);
            Ok(store)
        })
    }

    /// Tears down every materialized record in registration order.
    ///
    /// For each record its `on_unmounted` cleanups run in registration order,
    /// each asynchronous one awaited before the next starts, then the store's
    /// own teardown runs if its provider allows it and the store reports
    /// itself active. Records that never materialized are only marked
    /// disposed.
    ///
    /// This is meant to be called exactly once, when the scope ends. A second
    /// call finds nothing left to do; calling it concurrently from two tasks is
    /// not supported. On a superseded generation it does nothing, since its
    /// surviving records now belong to the newer generation.
    pub async fn dispose(&self) {
        if self.is_superseded() {
            tracing::warn!(injector = %self.inner.id, "dispose called on a superseded injector; ignoring");
            return;
        }

        let mut disposed = 0usize;
        for key in &self.inner.order {
            let record = &self.inner.records[key];
            if record.dispose().await {
                disposed += 1;
                self.inner.observers.record_disposed(key, self.inner.id);
            }
        }
        tracing::debug!(injector = %self.inner.id, disposed, "injector disposed");
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("records", &self.inner.order)
            .field("superseded", &self.is_superseded())
            .finish()
    }
}

impl Drop for InjectorInner {
    fn drop(&mut self) {
        if self.superseded.load(Ordering::SeqCst) {
            return;
        }
        let live = self
            .records
            .values()
            .filter(|record| record.is_materialized())
            .count();
        if live > 0 {
            tracing::warn!(injector = %self.id, live, "injector dropped with undisposed stores; call dispose().await before dropping");
        }
    }
}

/// Builder for [`Injector`].
///
/// Provider entries are validated when the injector is built; a malformed
/// entry fails the build and nothing is constructed.
pub struct InjectorBuilder {
    entries: Vec<ProviderEntry>,
    parent: Option<Injector>,
    name: Option<String>,
    observers: Observers,
}

impl InjectorBuilder {
    /// Sets the enclosing scope. The new injector keeps only a weak reference to it.
    pub fn parent(mut self, parent: &Injector) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Sets or clears the enclosing scope.
    pub fn maybe_parent(mut self, parent: Option<&Injector>) -> Self {
        self.parent = parent.cloned();
        self
    }

    /// Human label folded into store identifiers. An empty name counts as none.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    /// Attaches an observer. Without any, the parent's observers are inherited.
    pub fn observer(mut self, observer: Arc<dyn InjectorObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Builds a fresh generation.
    pub fn build(self) -> DiResult<Injector> {
        let providers = normalize(self.entries)?;
        let injector = assemble(providers, self.parent.as_ref(), self.name, self.observers, |_| None);
        tracing::debug!(
            injector = %injector.id(),
            name = injector.name().unwrap_or(""),
            records = injector.inner.order.len(),
            "injector built"
        );
        Ok(injector)
    }

    /// Builds the generation that supersedes `old`.
    ///
    /// Records whose creator and pre-resolved instance are unchanged carry
    /// over live, with their memoized store and pending cleanups. Every other
    /// record of `old` is disposed before this returns. `old` is then marked
    /// superseded and must not be disposed by its owner.
    ///
    /// # Examples
    ///
    /// ```
    /// use store_injector::{Injector, ProviderEntry, StoreCreator};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let filters = StoreCreator::labeled("filters", |_| vec!["open"]);
    /// let results = StoreCreator::labeled("results", |_| 0usize);
    ///
    /// let first = Injector::builder(vec![filters.clone()]).build().unwrap();
    /// let live = first.get(&filters).unwrap();
    ///
    /// let second = Injector::builder([ProviderEntry::from(filters.clone()), results.clone().into()])
    ///     .build_from(&first)
    ///     .await
    ///     .unwrap();
    /// assert!(Arc::ptr_eq(&live, &second.get(&filters).unwrap()));
    /// assert!(first.is_superseded());
    /// # second.dispose().await;
    /// # }
    /// ```
    pub async fn build_from(self, old: &Injector) -> DiResult<Injector> {
        let providers = normalize(self.entries)?;
        let diff = reconcile::diff(&old.inner.providers, &providers, |key| {
            old.inner
                .records
                .get(key)
                .is_some_and(|record| !record.is_disposed())
        });
        let reused: HashSet<&CreatorKey> = diff.reused.iter().collect();

        let injector = assemble(providers, self.parent.as_ref(), self.name, self.observers, |provider| {
            let key = provider.key();
            if !reused.contains(&key) {
                return None;
            }
            old.inner.records.get(&key).cloned()
        });

        old.inner.superseded.store(true, Ordering::SeqCst);

        let discarded: HashSet<&CreatorKey> = diff.discarded().collect();
        for key in old.inner.order.iter().filter(|key| discarded.contains(key)) {
            let record = &old.inner.records[key];
            if record.dispose().await {
                old.inner.observers.record_disposed(key, old.inner.id);
            }
        }

        tracing::debug!(
            injector = %injector.id(),
            previous = %old.id(),
            reused = diff.reused.len(),
            replaced = diff.replaced.len(),
            added = diff.added.len(),
            removed = diff.removed.len(),
            "injector reconciled"
        );
        injector.inner.observers.reconciled(injector.id(), &diff);
        Ok(injector)
    }
}

fn normalize(entries: Vec<ProviderEntry>) -> DiResult<Vec<Provider>> {
    entries.into_iter().map(ProviderEntry::normalize).collect()
}

fn assemble<F>(
    providers: Vec<Provider>,
    parent: Option<&Injector>,
    name: Option<String>,
    mut observers: Observers,
    reuse: F,
) -> Injector
where
    F: Fn(&Provider) -> Option<Arc<ProviderRecord>>,
{
    let mut records = HashMap::with_capacity(providers.len());
    let mut order = Vec::with_capacity(providers.len());

    for provider in &providers {
        let record = match reuse(provider) {
            Some(record) => {
                record.set_dispose_on_unmounted(provider.dispose_on_unmounted);
                record
            }
            None => Arc::new(ProviderRecord::new(provider)),
        };
        // Last entry wins for a repeated creator; position stays at the first
        let key = provider.key();
        if records.insert(key.clone(), record).is_none() {
            order.push(key);
        }
    }

    if observers.is_empty() {
        if let Some(parent) = parent {
            observers = parent.inner.observers.clone();
        }
    }

    Injector {
        inner: Arc::new(InjectorInner {
            id: InjectorId::next(),
            name,
            parent: parent.map(|parent| Arc::downgrade(&parent.inner)),
            providers,
            records,
            order,
            observers,
            superseded: AtomicBool::new(false),
        }),
    }
}
