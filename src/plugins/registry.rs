//! Keyed plugin registry.

use std::fmt;
use std::sync::Arc;

use crate::error::ErrorContext;
use crate::{Error, Result};

/// What a registry needs to know about its entries.
pub trait RegistryEntry {
    /// Human-readable kind used in error messages ("mock", "normalizer").
    const KIND: &'static str;
    /// Name of the key accessor, for error context.
    const KEY_FIELD: &'static str;

    fn registry_key(&self) -> &str;
    fn matches_endpoint(&self, endpoint: &str) -> bool;
}

/// Insertion-ordered collection of uniquely keyed plugins.
///
/// Populated during setup; lookups walk entries in registration order and
/// return the first match.
pub struct PluginRegistry<P: ?Sized> {
    entries: Vec<Arc<P>>,
}

impl<P: ?Sized + RegistryEntry> PluginRegistry<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check that `key` could be registered, without registering anything.
    pub fn check_insertable(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::configuration_with_context(
                format!(
                    "cannot register a {} with an empty \"{}\"",
                    P::KIND,
                    P::KEY_FIELD
                ),
                ErrorContext::new()
                    .with_field_path(format!("{}.{}", P::KIND, P::KEY_FIELD))
                    .with_source("plugin_registry"),
            ));
        }
        if self.contains(key) {
            return Err(Error::DuplicateKey {
                kind: P::KIND,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    pub fn register(&mut self, plugin: Arc<P>) -> Result<()> {
        self.check_insertable(plugin.registry_key())?;
        self.entries.push(plugin);
        Ok(())
    }

    /// Remove the entry stored under `key`. Returns whether one was removed.
    pub fn unregister(&mut self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        match self.entries.iter().position(|p| p.registry_key() == key) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// First entry, in registration order, whose predicate matches `endpoint`.
    pub fn find_match(&self, endpoint: &str) -> Option<Arc<P>> {
        self.entries
            .iter()
            .find(|p| p.matches_endpoint(endpoint))
            .cloned()
    }

    pub fn get(&self, key: &str) -> Option<Arc<P>> {
        self.entries
            .iter()
            .find(|p| p.registry_key() == key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|p| p.registry_key() == key)
    }

    /// Keys in registration order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|p| p.registry_key()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<P: ?Sized + RegistryEntry> Default for PluginRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized + RegistryEntry> fmt::Debug for PluginRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kind", &P::KIND)
            .field("keys", &self.keys())
            .finish()
    }
}
