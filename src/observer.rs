//! Diagnostic observers for injector lifecycle events.
//!
//! This module provides hooks for observing materialization, disposal and
//! reconciliation, for structured tracing and debugging of scope trees.

use std::sync::Arc;
use std::time::Duration;

use crate::injector::{InjectorId, ProviderDiff};
use crate::key::CreatorKey;

/// Observer trait for injector lifecycle events.
///
/// Observers are attached when an injector is built and are inherited by
/// child injectors that do not bring their own.
///
/// # Performance
///
/// Observer calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use store_injector::{CreatorKey, Injector, InjectorId, InjectorObserver, StoreCreator};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     built: Mutex<Vec<String>>,
/// }
///
/// impl InjectorObserver for Recorder {
///     fn materialized(&self, key: &CreatorKey, _injector: InjectorId, _duration: Duration) {
///         self.built.lock().unwrap().push(key.label().to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let counter = StoreCreator::labeled("counter", |_| 0u64);
/// let injector = Injector::builder(vec![counter.clone()])
///     .observer(recorder.clone())
///     .build()
///     .unwrap();
///
/// injector.get(&counter).unwrap();
/// injector.get(&counter).unwrap();
/// assert_eq!(*recorder.built.lock().unwrap(), vec!["counter"]);
/// ```
pub trait InjectorObserver: Send + Sync {
    /// Called right before a record's factory runs.
    fn materializing(&self, _key: &CreatorKey, _injector: InjectorId) {}

    /// Called after a record's factory returned a store.
    fn materialized(&self, key: &CreatorKey, injector: InjectorId, duration: Duration);

    /// Called after a materialized record finished its cleanups and teardown.
    fn record_disposed(&self, _key: &CreatorKey, _injector: InjectorId) {}

    /// Called once a new generation has been reconciled against its predecessor.
    fn reconciled(&self, _injector: InjectorId, _diff: &ProviderDiff) {}
}

/// Collection of observers attached to an injector.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn InjectorObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn InjectorObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn materializing(&self, key: &CreatorKey, injector: InjectorId) {
        for observer in &self.observers {
            observer.materializing(key, injector);
        }
    }

    pub(crate) fn materialized(&self, key: &CreatorKey, injector: InjectorId, duration: Duration) {
        for observer in &self.observers {
            observer.materialized(key, injector, duration);
        }
    }

    pub(crate) fn record_disposed(&self, key: &CreatorKey, injector: InjectorId) {
        for observer in &self.observers {
            observer.record_disposed(key, injector);
        }
    }

    pub(crate) fn reconciled(&self, injector: InjectorId, diff: &ProviderDiff) {
        for observer in &self.observers {
            observer.reconciled(injector, diff);
        }
    }
}

/// Observer that forwards every event to `tracing` at `INFO`.
///
/// The injector already emits `DEBUG` events on its own; attach this when the
/// lifecycle of one scope tree should stand out in the logs under a label.
///
/// ```
/// use store_injector::{Injector, TracingObserver};
/// use std::sync::Arc;
///
/// let injector = Injector::builder(Vec::<store_injector::ProviderEntry>::new())
///     .observer(Arc::new(TracingObserver::with_label("checkout")))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::with_label("store-injector")
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectorObserver for TracingObserver {
    fn materializing(&self, key: &CreatorKey, injector: InjectorId) {
        tracing::info!(scope = %self.label, %injector, creator = %key, "materializing store");
    }

    fn materialized(&self, key: &CreatorKey, injector: InjectorId, duration: Duration) {
        tracing::info!(scope = %self.label, %injector, creator = %key, ?duration, "store materialized");
    }

    fn record_disposed(&self, key: &CreatorKey, injector: InjectorId) {
        tracing::info!(scope = %self.label, %injector, creator = %key, "store disposed");
    }

    fn reconciled(&self, injector: InjectorId, diff: &ProviderDiff) {
        tracing::info!(
            scope = %self.label,
            %injector,
            reused = diff.reused.len(),
            replaced = diff.replaced.len(),
            added = diff.added.len(),
            removed = diff.removed.len(),
            "generation reconciled"
        );
    }
}
