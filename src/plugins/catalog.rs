//! Constructor catalogs.
//!
//! A catalog maps a type key to a constructor taking JSON arguments. Keys are
//! resolved while the client is being configured, never in the middle of a
//! call.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ErrorContext;
use crate::{Error, Result};

pub type Constructor<T> = Arc<dyn Fn(&Value) -> Result<T> + Send + Sync>;

pub struct ConstructorCatalog<T> {
    kind: &'static str,
    constructors: HashMap<String, Constructor<T>>,
}

impl<T> ConstructorCatalog<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor under `key`.
    ///
    /// Fails with `Configuration` for an empty key and `DuplicateKey` when the
    /// key is taken; the existing constructor is kept.
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&Value) -> Result<T> + Send + Sync + 'static,
    {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::configuration_with_context(
                format!("cannot register a {} type with an empty key", self.kind),
                ErrorContext::new().with_source("constructor_catalog"),
            ));
        }
        if self.constructors.contains_key(&key) {
            return Err(Error::DuplicateKey {
                kind: self.kind,
                key,
            });
        }
        self.constructors.insert(key, Arc::new(constructor));
        Ok(())
    }

    /// Insert a built-in constructor, replacing any previous one.
    pub(crate) fn with_builtin<F>(mut self, key: &str, constructor: F) -> Self
    where
        F: Fn(&Value) -> Result<T> + Send + Sync + 'static,
    {
        self.constructors.insert(key.to_string(), Arc::new(constructor));
        self
    }

    pub fn instantiate(&self, key: &str, args: &Value) -> Result<T> {
        let constructor = self.constructors.get(key).ok_or_else(|| {
            Error::configuration_with_context(
                format!("unknown {} type \"{}\"", self.kind, key),
                ErrorContext::new()
                    .with_details(format!("registered: {}", self.keys().join(", ")))
                    .with_source("constructor_catalog"),
            )
        })?;
        constructor(args)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<T> Clone for ConstructorCatalog<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            constructors: self.constructors.clone(),
        }
    }
}

impl<T> fmt::Debug for ConstructorCatalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorCatalog")
            .field("kind", &self.kind)
            .field("keys", &self.keys())
            .finish()
    }
}
