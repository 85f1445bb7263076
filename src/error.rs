//! Error types for the store injector.

use std::sync::Arc;

/// Store injection errors
///
/// Represents the conditions that can occur while building an injector,
/// resolving a store through a scope chain, or driving the host adapter.
///
/// Errors returned by a store factory are handed back to the caller of
/// [`Injector::get`](crate::Injector::get) unchanged.
///
/// # Examples
///
/// ```rust
/// use store_injector::{DiError, Injector, StoreCreator};
///
/// let counter = StoreCreator::labeled("counter", |_| 0u32);
/// let injector = Injector::builder(Vec::<StoreCreator<u32>>::new()).build().unwrap();
///
/// match injector.get(&counter) {
///     Err(DiError::NotFound(label)) => assert_eq!(label, "counter"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// Malformed provider entry, carries the entry's textual form
    #[error("Provider config error [{0}]")]
    Config(String),
    /// Required store not registered anywhere in the scope chain
    #[error("Store not provided and not optional: {0}")]
    NotFound(String),
    /// Store requested from a scope that has already been torn down
    #[error("Store already disposed: {0}")]
    Disposed(String),
    /// Host-level resolution without any injector in reach
    #[error("No injector registered for this scope")]
    NoInjector,
    /// Materialized value does not downcast to the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// A store is required again while its own factory is still running (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum materialization nesting exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Failure raised by a store factory itself
    #[error("Store factory failed: {0}")]
    Factory(Arc<dyn std::error::Error + Send + Sync>),
}

impl DiError {
    /// Wraps an arbitrary error raised inside a store factory.
    ///
    /// ```rust
    /// use store_injector::DiError;
    ///
    /// let err = DiError::factory(std::io::Error::other("disk full"));
    /// assert_eq!(err.to_string(), "Store factory failed: disk full");
    /// ```
    pub fn factory<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DiError::Factory(Arc::new(error))
    }
}

/// Result type for injector operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
