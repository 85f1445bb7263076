//! Creator identity keys.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a store creator.
///
/// Records are looked up by the identity of the factory that was registered,
/// never by name. Two creators built from byte-identical closures are distinct
/// keys; clones of one [`StoreCreator`](crate::StoreCreator) share a key.
///
/// The label is carried for diagnostics only and takes no part in equality,
/// ordering or hashing.
///
/// # Examples
///
/// ```rust
/// use store_injector::StoreCreator;
///
/// let a = StoreCreator::labeled("settings", |_| 1u8);
/// let b = StoreCreator::labeled("settings", |_| 1u8);
///
/// assert_eq!(a.key(), a.clone().key());
/// assert_ne!(a.key(), b.key());
/// assert_eq!(a.key().label(), b.key().label());
/// ```
#[derive(Clone)]
pub struct CreatorKey {
    addr: usize,
    label: Arc<str>,
}

impl CreatorKey {
    pub(crate) fn new(addr: usize, label: Arc<str>) -> Self {
        Self { addr, label }
    }

    /// Human-readable creator label used in error messages.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for CreatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CreatorKey({}@{:#x})", self.label, self.addr)
    }
}

impl fmt::Display for CreatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

// Identity only: the label is a diagnostic companion
impl PartialEq for CreatorKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for CreatorKey {}

impl PartialOrd for CreatorKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CreatorKey {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.addr.cmp(&other.addr)
    }
}

impl Hash for CreatorKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}
