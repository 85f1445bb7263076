//! Store teardown traits.

/// Trait for synchronous store teardown.
///
/// Implement this for store types that own resources beyond their memory
/// (subscriptions, handles, timers). A creator built with
/// [`StoreCreator::disposable`](crate::StoreCreator::disposable) invokes
/// `dispose` after the record's `on_unmounted` callbacks have run, but only if
/// [`is_active`](Dispose::is_active) still reports `true` at that point.
///
/// # Examples
///
/// ```
/// use store_injector::{Dispose, Injector, StoreCreator};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Feed {
///     open: AtomicBool,
/// }
///
/// impl Dispose for Feed {
///     fn is_active(&self) -> bool {
///         self.open.load(Ordering::SeqCst)
///     }
///
///     fn dispose(&self) {
///         self.open.store(false, Ordering::SeqCst);
///     }
/// }
///
/// let feed = StoreCreator::disposable(|_| Feed { open: AtomicBool::new(true) });
/// let injector = Injector::builder(vec![feed.clone()]).build().unwrap();
/// let store = injector.get(&feed).unwrap();
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// injector.dispose().await;
/// # });
/// assert!(!store.open.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Whether the store was ever activated by its runtime.
    fn is_active(&self) -> bool {
        true
    }

    /// Perform synchronous teardown.
    fn dispose(&self);
}

/// Trait for asynchronous store teardown.
///
/// The injector awaits the returned future before moving on to the next record,
/// so a later store may rely on an earlier one being fully torn down.
///
/// # Examples
///
/// ```
/// use store_injector::{AsyncDispose, StoreCreator};
/// use async_trait::async_trait;
///
/// struct Socket;
///
/// #[async_trait]
/// impl AsyncDispose for Socket {
///     async fn dispose(&self) {
///         // flush and close
///     }
/// }
///
/// let socket = StoreCreator::async_disposable(|_| Socket);
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Whether the store was ever activated by its runtime.
    fn is_active(&self) -> bool {
        true
    }

    /// Perform asynchronous teardown.
    async fn dispose(&self);
}
