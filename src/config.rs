//! Declarative scope configuration.
//!
//! Creators are closures and cannot be serialized, so configuration refers to
//! them by name. A [`CreatorCatalog`] filled in code maps those names to
//! creators; a [`ScopeConfig`] read from JSON then turns into the provider
//! entries of one injector.
//!
//! ```
//! use store_injector::config::{CreatorCatalog, ScopeConfig};
//! use store_injector::StoreCreator;
//!
//! let prefs = StoreCreator::labeled("prefs", |_| vec![String::from("compact")]);
//!
//! let mut catalog = CreatorCatalog::new();
//! catalog.register("prefs", &prefs);
//!
//! let config = ScopeConfig::from_json_str(
//!     r#"{ "name": "settings", "stores": [ { "creator": "prefs", "dispose_on_unmounted": false } ] }"#,
//! )
//! .unwrap();
//!
//! let injector = config.builder(&catalog).unwrap().build().unwrap();
//! assert_eq!(injector.name(), Some("settings"));
//! assert_eq!(injector.get(&prefs).unwrap()[0], "compact");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::creator::{AnyCreator, StoreCreator};
use crate::error::{DiError, DiResult};
use crate::injector::{Injector, InjectorBuilder};
use crate::provider::ProviderEntry;

/// Name to creator registry used to resolve configured store entries.
#[derive(Default, Clone)]
pub struct CreatorCatalog {
    creators: HashMap<String, AnyCreator>,
}

impl CreatorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `creator` under `name`, replacing any previous registration.
    pub fn register<T>(&mut self, name: impl Into<String>, creator: &StoreCreator<T>) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.register_any(name, creator.erase())
    }

    pub fn register_any(&mut self, name: impl Into<String>, creator: AnyCreator) -> &mut Self {
        self.creators.insert(name.into(), creator);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AnyCreator> {
        self.creators.get(name)
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl std::fmt::Debug for CreatorCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.creators.keys().collect();
        names.sort();
        f.debug_struct("CreatorCatalog").field("creators", &names).finish()
    }
}

/// One configured store entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntryConfig {
    /// Catalog name of the creator
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispose_on_unmounted: Option<bool>,
}

/// Configuration of one injector scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub stores: Vec<StoreEntryConfig>,
}

impl ScopeConfig {
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|err| DiError::Config(format!("invalid scope config: {err}")))
    }

    pub fn to_json_string(&self) -> DiResult<String> {
        serde_json::to_string(self).map_err(|err| DiError::Config(err.to_string()))
    }

    /// Resolves every entry against `catalog`, in configured order.
    pub fn to_entries(&self, catalog: &CreatorCatalog) -> DiResult<Vec<ProviderEntry>> {
        self.stores
            .iter()
            .map(|entry| {
                let creator = entry
                    .creator
                    .as_deref()
                    .and_then(|name| catalog.get(name))
                    .ok_or_else(|| DiError::Config(entry_json(entry)))?;
                Ok(ProviderEntry::Object {
                    creator: Some(creator.clone()),
                    use_value: None,
                    dispose_on_unmounted: entry.dispose_on_unmounted,
                })
            })
            .collect()
    }

    /// Builder preloaded with this scope's entries and name.
    pub fn builder(&self, catalog: &CreatorCatalog) -> DiResult<InjectorBuilder> {
        let builder = Injector::builder(self.to_entries(catalog)?);
        Ok(match &self.name {
            Some(name) => builder.name(name.clone()),
            None => builder,
        })
    }
}

fn entry_json(entry: &StoreEntryConfig) -> String {
    serde_json::to_string(entry).unwrap_or_else(|_| format!("{entry:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default() {
        let config = ScopeConfig::from_json_str(r#"{ "stores": [ {} ] }"#).unwrap();
        assert_eq!(config.name, None);
        assert_eq!(config.stores, vec![StoreEntryConfig::default()]);
    }

    #[test]
    fn unknown_creator_reports_entry() {
        let config = ScopeConfig::from_json_str(r#"{ "stores": [ { "creator": "ghost" } ] }"#).unwrap();
        let err = config.to_entries(&CreatorCatalog::new()).unwrap_err();
        assert_eq!(err.to_string(), r#"Provider config error [{"creator":"ghost"}]"#);
    }
}
