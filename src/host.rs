//! Host-side adapter: one injector slot per mounted scope.
//!
//! A UI host (or any tree of nested lifetimes) owns a [`StoreScope`] per
//! node that provides stores. Mounting builds the first generation, each
//! update reconciles the next generation against the live one, and
//! unmounting tears the current generation down.

use std::sync::Arc;

use crate::creator::StoreCreator;
use crate::error::{DiError, DiResult};
use crate::injector::{GetOptions, Injector, InjectorBuilder};
use crate::observer::InjectorObserver;
use crate::provider::ProviderEntry;

/// The injector slot of one mounted scope.
///
/// # Examples
///
/// ```
/// use store_injector::{GetOptions, StoreCreator, StoreScope, use_store};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let user = StoreCreator::labeled("user", |_| String::from("ada"));
///
/// let mut scope = StoreScope::mount(vec![user.clone()], None, Some("root")).unwrap();
/// let first = use_store(Some(scope.injector()), &user, GetOptions::required())
///     .unwrap()
///     .unwrap();
///
/// scope.update(vec![user.clone()], None).await.unwrap();
/// let second = scope.injector().get(&user).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
///
/// scope.unmount().await;
/// # }
/// ```
pub struct StoreScope {
    current: Injector,
    name: Option<String>,
    observer: Option<Arc<dyn InjectorObserver>>,
}

impl StoreScope {
    /// Builds the first generation.
    pub fn mount<I>(providers: I, parent: Option<&Injector>, name: Option<&str>) -> DiResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<ProviderEntry>,
    {
        Self::mount_observed(providers, parent, name, None)
    }

    /// Builds the first generation with an observer attached to every generation.
    pub fn mount_observed<I>(
        providers: I,
        parent: Option<&Injector>,
        name: Option<&str>,
        observer: Option<Arc<dyn InjectorObserver>>,
    ) -> DiResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<ProviderEntry>,
    {
        let name = name.map(str::to_owned);
        let current = configure(Injector::builder(providers), parent, &name, &observer).build()?;
        tracing::debug!(injector = %current.id(), "store scope mounted");
        Ok(Self {
            current,
            name,
            observer,
        })
    }

    /// The live generation, for descendants to resolve through or parent onto.
    pub fn injector(&self) -> &Injector {
        &self.current
    }

    /// Replaces the live generation with one built from `providers`.
    ///
    /// Unchanged providers keep their live stores. On error the current
    /// generation stays in place untouched.
    pub async fn update<I>(&mut self, providers: I, parent: Option<&Injector>) -> DiResult<()>
    where
        I: IntoIterator,
        I::Item: Into<ProviderEntry>,
    {
        let next = configure(Injector::builder(providers), parent, &self.name, &self.observer)
            .build_from(&self.current)
            .await?;
        self.current = next;
        Ok(())
    }

    /// Disposes the live generation.
    pub async fn unmount(self) {
        tracing::debug!(injector = %self.current.id(), "store scope unmounting");
        self.current.dispose().await;
    }
}

fn configure(
    builder: InjectorBuilder,
    parent: Option<&Injector>,
    name: &Option<String>,
    observer: &Option<Arc<dyn InjectorObserver>>,
) -> InjectorBuilder {
    let mut builder = builder.maybe_parent(parent);
    if let Some(name) = name {
        builder = builder.name(name.clone());
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer.clone());
    }
    builder
}

/// Resolves `creator` from the nearest injector a host component can reach.
///
/// Without any injector the lookup fails with [`DiError::NoInjector`] unless
/// `options.optional` is set.
pub fn use_store<T: Send + Sync + 'static>(
    injector: Option<&Injector>,
    creator: &StoreCreator<T>,
    options: GetOptions,
) -> DiResult<Option<Arc<T>>> {
    match injector {
        Some(injector) => injector.get_with(creator, options),
        None if options.optional => Ok(None),
        None => Err(DiError::NoInjector),
    }
}
