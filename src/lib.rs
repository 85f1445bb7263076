//! # store-injector
//!
//! Scope-chained store injection with lazy, memoized materialization and
//! ordered asynchronous teardown.
//!
//! ## Features
//!
//! - **Identity-keyed providers**: a [`StoreCreator`] is both the factory and the lookup key
//! - **Lazy and memoized**: each store is built on first request and shared afterwards
//! - **Scope chains**: child injectors fall back to their parent for unregistered creators
//! - **Generational reconciliation**: rebuilding a scope keeps unchanged live stores
//! - **Ordered disposal**: cleanups and teardowns run in registration order, each awaited
//! - **Circular dependency detection**: reentrant materialization fails with the full path
//!
//! ## Quick Start
//!
//! ```rust
//! use store_injector::{Injector, ProviderEntry, StoreCreator};
//! use std::sync::Arc;
//!
//! struct Api {
//!     base_url: String,
//! }
//!
//! struct Todos {
//!     api: Arc<Api>,
//! }
//!
//! let api = StoreCreator::labeled("api", |_| Api {
//!     base_url: "https://example.test".to_string(),
//! });
//! let api_dep = api.clone();
//! let todos = StoreCreator::try_labeled("todos", move |ctx| {
//!     Ok(Todos { api: ctx.get_store(&api_dep)? })
//! });
//!
//! let injector = Injector::builder([ProviderEntry::from(api.clone()), todos.clone().into()])
//!     .build()
//!     .unwrap();
//!
//! let todos = injector.get(&todos).unwrap();
//! assert_eq!(todos.api.base_url, "https://example.test");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use store_injector::{Injector, StoreCreator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let theme = StoreCreator::labeled("theme", |_| "light");
//!
//! let app = Injector::builder(vec![theme.clone()]).build().unwrap();
//! let dialog = Injector::builder(vec![theme.clone()]).parent(&app).build().unwrap();
//!
//! // The nearest registration shadows the parent's
//! assert!(!std::sync::Arc::ptr_eq(&app.get(&theme).unwrap(), &dialog.get(&theme).unwrap()));
//!
//! dialog.dispose().await;
//! app.dispose().await;
//! # }
//! ```

// Module declarations
pub mod creator;
pub mod error;
pub mod host;
pub mod injector;
pub mod key;
pub mod observer;
pub mod provider;
pub mod traits;

#[cfg(feature = "config")]
pub mod config;

// Internal modules
mod internal;

// Re-export core types
pub use creator::{AnyCreator, AnyStore, StoreCreator};
pub use error::{DiError, DiResult};
pub use host::{use_store, StoreScope};
pub use injector::{
    CleanupHandle, GetOptions, InjectionContext, Injector, InjectorBuilder, InjectorId, ProviderDiff,
};
pub use key::CreatorKey;
pub use observer::{InjectorObserver, TracingObserver};
pub use provider::{ProviderEntry, ProviderSpec};
pub use traits::{AsyncDispose, Dispose};
