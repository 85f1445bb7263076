//! Provider entries and their normalization.
//!
//! A provider comes in two shapes: a bare creator, whose identity is both the
//! key and the factory, or an object form that adds a pre-resolved instance
//! and a disposal opt-out. Both normalize into one [`Provider`] before an
//! injector is built from them.

use std::fmt;
use std::sync::Arc;

use crate::creator::{AnyCreator, AnyStore, StoreCreator};
use crate::error::{DiError, DiResult};
use crate::key::CreatorKey;

/// Normalized provider, one per registered creator.
#[derive(Clone)]
pub(crate) struct Provider {
    pub(crate) creator: AnyCreator,
    pub(crate) use_value: Option<AnyStore>,
    pub(crate) dispose_on_unmounted: bool,
}

impl Provider {
    pub(crate) fn key(&self) -> CreatorKey {
        self.creator.key()
    }

    /// Same creator and same pre-resolved instance.
    pub(crate) fn same_spec(&self, other: &Provider) -> bool {
        self.creator.addr() == other.creator.addr()
            && match (&self.use_value, &other.use_value) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

/// Typed object-form provider.
///
/// # Examples
///
/// ```
/// use store_injector::{Injector, ProviderSpec, StoreCreator};
/// use std::sync::Arc;
///
/// let cart = StoreCreator::new(|_| vec![1, 2, 3]);
/// let seeded = Arc::new(vec![9]);
///
/// let injector = Injector::builder(vec![
///     ProviderSpec::new(cart.clone()).with_use(seeded.clone()),
/// ])
/// .build()
/// .unwrap();
///
/// assert!(Arc::ptr_eq(&injector.get(&cart).unwrap(), &seeded));
/// ```
pub struct ProviderSpec<T> {
    creator: StoreCreator<T>,
    use_value: Option<Arc<T>>,
    dispose_on_unmounted: bool,
}

impl<T: Send + Sync + 'static> ProviderSpec<T> {
    /// Object form around `creator` with defaults: no pre-resolved instance, disposed on unmount.
    pub fn new(creator: StoreCreator<T>) -> Self {
        Self {
            creator,
            use_value: None,
            dispose_on_unmounted: true,
        }
    }

    /// Seeds the record with an already-resolved instance; the factory never runs.
    pub fn with_use(mut self, store: Arc<T>) -> Self {
        self.use_value = Some(store);
        self
    }

    /// Whether the store's own teardown runs when the scope exits.
    pub fn dispose_on_unmounted(mut self, dispose: bool) -> Self {
        self.dispose_on_unmounted = dispose;
        self
    }
}

/// A provider entry as handed to an injector, before validation.
///
/// Typed entries come from [`StoreCreator`] and [`ProviderSpec`] through `From`.
/// The untyped [`ProviderEntry::Object`] form exists for providers assembled at
/// runtime; it is checked when the injector is built.
#[derive(Clone)]
pub enum ProviderEntry {
    /// Bare creator: key and factory at once
    Creator(AnyCreator),
    /// Object form
    Object {
        creator: Option<AnyCreator>,
        use_value: Option<AnyStore>,
        dispose_on_unmounted: Option<bool>,
    },
}

impl ProviderEntry {
    /// Validates the entry into its normalized form.
    pub(crate) fn normalize(self) -> DiResult<Provider> {
        match self {
            ProviderEntry::Creator(creator) => Ok(Provider {
                creator,
                use_value: None,
                dispose_on_unmounted: true,
            }),
            ProviderEntry::Object {
                creator: Some(creator),
                use_value,
                dispose_on_unmounted,
            } => {
                if let Some(store) = &use_value {
                    if (**store).type_id() != creator.output_type() {
                        return Err(DiError::Config(
                            ProviderEntry::Object {
                                creator: Some(creator),
                                use_value,
                                dispose_on_unmounted,
                            }
                            .to_string(),
                        ));
                    }
                }
                Ok(Provider {
                    creator,
                    use_value,
                    dispose_on_unmounted: dispose_on_unmounted.unwrap_or(true),
                })
            }
            entry @ ProviderEntry::Object { creator: None, .. } => {
                Err(DiError::Config(entry.to_string()))
            }
        }
    }
}

impl fmt::Display for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderEntry::Creator(creator) => write!(f, "{creator:?}"),
            ProviderEntry::Object {
                creator,
                use_value,
                dispose_on_unmounted,
            } => {
                write!(f, "{{ creator: ")?;
                match creator {
                    Some(creator) => write!(f, "{creator:?}")?,
                    None => write!(f, "none")?,
                }
                if use_value.is_some() {
                    write!(f, ", use: <store>")?;
                }
                if let Some(dispose) = dispose_on_unmounted {
                    write!(f, ", dispose_on_unmounted: {dispose}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<T> From<StoreCreator<T>> for ProviderEntry {
    fn from(creator: StoreCreator<T>) -> Self {
        ProviderEntry::Creator(creator.into())
    }
}

impl From<AnyCreator> for ProviderEntry {
    fn from(creator: AnyCreator) -> Self {
        ProviderEntry::Creator(creator)
    }
}

impl<T: Send + Sync + 'static> From<ProviderSpec<T>> for ProviderEntry {
    fn from(spec: ProviderSpec<T>) -> Self {
        ProviderEntry::Object {
            creator: Some(spec.creator.into()),
            use_value: spec.use_value.map(|store| store as AnyStore),
            dispose_on_unmounted: Some(spec.dispose_on_unmounted),
        }
    }
}
