//! Store creators: the identity-keyed factories an injector registers.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::DiResult;
use crate::injector::InjectionContext;
use crate::internal::BoxFutureUnit;
use crate::key::CreatorKey;
use crate::traits::{AsyncDispose, Dispose};

/// Type-erased store instance as held by a record.
pub type AnyStore = Arc<dyn Any + Send + Sync>;

type ErasedFactory = dyn for<'a> Fn(&InjectionContext<'a>) -> DiResult<AnyStore> + Send + Sync;

// Returns a future only when the teardown itself is asynchronous
type ErasedTeardown = dyn Fn(AnyStore) -> Option<BoxFutureUnit> + Send + Sync;

struct CreatorInner {
    label: Arc<str>,
    output: TypeId,
    output_name: &'static str,
    factory: Box<ErasedFactory>,
    teardown: Option<Box<ErasedTeardown>>,
}

/// Untyped store creator.
///
/// Carries the same identity as the [`StoreCreator`] it was erased from. Used
/// by dynamic provider lists and the configuration catalog, where the store
/// type is not known statically.
#[derive(Clone)]
pub struct AnyCreator {
    inner: Arc<CreatorInner>,
}

impl AnyCreator {
    /// Identity of this creator.
    pub fn key(&self) -> CreatorKey {
        CreatorKey::new(self.addr(), self.inner.label.clone())
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Type name of the store this creator produces.
    pub fn output_type_name(&self) -> &'static str {
        self.inner.output_name
    }

    pub(crate) fn shared_label(&self) -> Arc<str> {
        self.inner.label.clone()
    }

    pub(crate) fn output_type(&self) -> TypeId {
        self.inner.output
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn create(&self, ctx: &InjectionContext<'_>) -> DiResult<AnyStore> {
        (self.inner.factory)(ctx)
    }

    pub(crate) fn has_teardown(&self) -> bool {
        self.inner.teardown.is_some()
    }

    /// Runs the store teardown hook, if any. Returns a future to await for async teardown.
    pub(crate) fn teardown(&self, store: AnyStore) -> Option<BoxFutureUnit> {
        self.inner.teardown.as_ref().and_then(|hook| hook(store))
    }
}

impl fmt::Debug for AnyCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.inner.label, self.addr())
    }
}

/// Typed store creator.
///
/// A `StoreCreator<T>` is both the factory for a store of type `T` and the key
/// under which that store is registered and later resolved. Lookup is by
/// identity: clone the creator to share it, and never rebuild it from the same
/// closure expecting the same registration.
///
/// # Examples
///
/// ```
/// use store_injector::{Injector, ProviderEntry, StoreCreator};
/// use std::sync::Arc;
///
/// struct Settings { theme: &'static str }
/// struct Profile { theme: &'static str }
///
/// let settings = StoreCreator::new(|_| Settings { theme: "dark" });
/// let settings_dep = settings.clone();
/// let profile = StoreCreator::try_new(move |ctx| {
///     let settings = ctx.get_store(&settings_dep)?;
///     Ok(Profile { theme: settings.theme })
/// });
///
/// let injector = Injector::builder([ProviderEntry::from(settings.clone()), profile.clone().into()])
///     .build()
///     .unwrap();
///
/// assert_eq!(injector.get(&profile).unwrap().theme, "dark");
/// assert!(Arc::ptr_eq(&injector.get(&settings).unwrap(), &injector.get(&settings).unwrap()));
/// ```
pub struct StoreCreator<T> {
    erased: AnyCreator,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for StoreCreator<T> {
    fn clone(&self) -> Self {
        Self {
            erased: self.erased.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StoreCreator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreCreator").field(&self.erased).finish()
    }
}

impl<T: Send + Sync + 'static> StoreCreator<T> {
    /// Creates a creator from an infallible factory, labeled with the store's type name.
    pub fn new<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        Self::try_labeled(std::any::type_name::<T>(), move |ctx| Ok(factory(ctx)))
    }

    /// Creates a creator from an infallible factory with an explicit label.
    pub fn labeled<F>(label: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        Self::try_labeled(label, move |ctx| Ok(factory(ctx)))
    }

    /// Creates a creator from a fallible factory.
    ///
    /// Any error the factory returns reaches the caller of `get` unchanged.
    pub fn try_new<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::try_labeled(std::any::type_name::<T>(), factory)
    }

    /// Creates a creator from a fallible factory with an explicit label.
    pub fn try_labeled<F>(label: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::from_parts(label.into(), factory, None)
    }

    fn from_parts<F>(label: Arc<str>, factory: F, teardown: Option<Box<ErasedTeardown>>) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        let factory: Box<ErasedFactory> =
            Box::new(move |ctx: &InjectionContext<'_>| factory(ctx).map(|store| Arc::new(store) as AnyStore));
        Self {
            erased: AnyCreator {
                inner: Arc::new(CreatorInner {
                    label,
                    output: TypeId::of::<T>(),
                    output_name: std::any::type_name::<T>(),
                    factory,
                    teardown,
                }),
            },
            _marker: PhantomData,
        }
    }

    /// Identity of this creator.
    pub fn key(&self) -> CreatorKey {
        self.erased.key()
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        self.erased.label()
    }

    /// Erases the store type, keeping identity.
    pub fn erase(&self) -> AnyCreator {
        self.erased.clone()
    }

    pub(crate) fn as_any(&self) -> &AnyCreator {
        &self.erased
    }
}

fn sync_teardown<T: Dispose>() -> Box<ErasedTeardown> {
    Box::new(|store: AnyStore| {
        if let Ok(store) = store.downcast::<T>() {
            if store.is_active() {
                store.dispose();
            }
        }
        None
    })
}

fn async_teardown<T: AsyncDispose>() -> Box<ErasedTeardown> {
    Box::new(|store: AnyStore| {
        let store = store.downcast::<T>().ok()?;
        if !store.is_active() {
            return None;
        }
        Some(Box::pin(async move { store.dispose().await }) as BoxFutureUnit)
    })
}

impl<T: Dispose> StoreCreator<T> {
    /// Creates a creator whose stores are torn down with [`Dispose::dispose`] at scope exit.
    pub fn disposable<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        Self::try_disposable(std::any::type_name::<T>(), move |ctx| Ok(factory(ctx)))
    }

    /// Fallible, labeled form of [`StoreCreator::disposable`].
    ///
    /// The factory may resolve dependencies with `?`; a store is only torn
    /// down if the factory produced one.
    pub fn try_disposable<F>(label: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::from_parts(label.into(), factory, Some(sync_teardown::<T>()))
    }
}

impl<T: AsyncDispose> StoreCreator<T> {
    /// Creates a creator whose stores are torn down with [`AsyncDispose::dispose`] at scope exit.
    pub fn async_disposable<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        Self::try_async_disposable(std::any::type_name::<T>(), move |ctx| Ok(factory(ctx)))
    }

    /// Fallible, labeled form of [`StoreCreator::async_disposable`].
    pub fn try_async_disposable<F>(label: impl Into<Arc<str>>, factory: F) -> Self
    where
        F: for<'a> Fn(&InjectionContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::from_parts(label.into(), factory, Some(async_teardown::<T>()))
    }
}

impl<T> From<StoreCreator<T>> for AnyCreator {
    fn from(creator: StoreCreator<T>) -> Self {
        creator.erased
    }
}
