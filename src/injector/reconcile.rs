//! Generational reconciliation between two provider lists.

use std::collections::{HashMap, HashSet};

use crate::key::CreatorKey;
use crate::provider::Provider;

/// Outcome of comparing a previous generation's providers with the next one's.
///
/// Keys in `reused`, `replaced` and `added` follow the new list's order;
/// `removed` follows the old list's order. Duplicate creators collapse to
/// their last entry, matching how records are registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderDiff {
    /// Same creator, same pre-resolved instance, old record still live: it carries over
    pub reused: Vec<CreatorKey>,
    /// Same creator, different spec or a disposed old record: fresh record created
    pub replaced: Vec<CreatorKey>,
    /// Creator only present in the new generation
    pub added: Vec<CreatorKey>,
    /// Creator only present in the old generation: disposed, no successor
    pub removed: Vec<CreatorKey>,
}

impl ProviderDiff {
    /// Keys whose old records must be disposed.
    pub fn discarded(&self) -> impl Iterator<Item = &CreatorKey> {
        self.replaced.iter().chain(self.removed.iter())
    }

    pub fn is_unchanged(&self) -> bool {
        self.replaced.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

fn last_wins(providers: &[Provider]) -> (Vec<CreatorKey>, HashMap<CreatorKey, &Provider>) {
    let mut order = Vec::new();
    let mut by_key = HashMap::new();
    for provider in providers {
        let key = provider.key();
        if by_key.insert(key.clone(), provider).is_none() {
            order.push(key);
        }
    }
    (order, by_key)
}

/// Classifies every creator of `new` against `old`. An unchanged spec only
/// counts as reused when `is_live` says the old record can still serve it.
pub(crate) fn diff<L>(old: &[Provider], new: &[Provider], is_live: L) -> ProviderDiff
where
    L: Fn(&CreatorKey) -> bool,
{
    let (old_order, old_by_key) = last_wins(old);
    let (new_order, new_by_key) = last_wins(new);

    let mut result = ProviderDiff::default();
    for key in new_order {
        match old_by_key.get(&key) {
            Some(previous) if previous.same_spec(new_by_key[&key]) && is_live(&key) => {
                result.reused.push(key)
            }
            Some(_) => result.replaced.push(key),
            None => result.added.push(key),
        }
    }

    let present: HashSet<&CreatorKey> = new_by_key.keys().collect();
    result.removed = old_order
        .into_iter()
        .filter(|key| !present.contains(key))
        .collect();
    result
}
