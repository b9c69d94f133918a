//! Kind-to-translator registry.

use crate::error::{SyncError, SyncResult};
use crate::translator::{self, Translator};
use edgesync_core::{EntityKind, Stores};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Collects translators before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    translators: BTreeMap<EntityKind, Arc<dyn Translator>>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a translator under its kind.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTranslator` if the kind already has one.
    pub fn register(self, translator: impl Translator + 'static) -> SyncResult<Self> {
        self.register_shared(Arc::new(translator))
    }

    /// Registers an already shared translator.
    pub fn register_shared(mut self, translator: Arc<dyn Translator>) -> SyncResult<Self> {
        let kind = translator.kind();
        if self.translators.contains_key(&kind) {
            return Err(SyncError::DuplicateTranslator(kind));
        }
        self.translators.insert(kind, translator);
        Ok(self)
    }

    /// Freezes the registry.
    pub fn build(self) -> TranslatorRegistry {
        TranslatorRegistry {
            translators: Arc::new(self.translators),
        }
    }
}

/// Immutable map from entity kind to translator.
///
/// Cloning is cheap; clones share the same map.
#[derive(Clone)]
pub struct TranslatorRegistry {
    translators: Arc<BTreeMap<EntityKind, Arc<dyn Translator>>>,
}

impl TranslatorRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Builds the registry with a translator for every kind.
    pub fn standard(stores: &Stores) -> Self {
        let translators = translator::standard_set(stores)
            .into_iter()
            .map(|translator| (translator.kind(), translator))
            .collect();
        Self {
            translators: Arc::new(translators),
        }
    }

    /// Returns the translator for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `UnregisteredKind` if none was registered.
    pub fn resolve(&self, kind: EntityKind) -> SyncResult<Arc<dyn Translator>> {
        self.translators
            .get(&kind)
            .cloned()
            .ok_or(SyncError::UnregisteredKind(kind))
    }

    /// Returns the registered kinds in order.
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.translators.keys().copied().collect()
    }

    /// Returns the kinds with no translator.
    pub fn missing_kinds(&self) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| !self.translators.contains_key(kind))
            .collect()
    }

    /// Fails with `UnregisteredKind` for the first kind with no translator.
    pub fn ensure_complete(&self) -> SyncResult<()> {
        match self.missing_kinds().first() {
            Some(kind) => Err(SyncError::UnregisteredKind(*kind)),
            None => Ok(()),
        }
    }

    /// Returns the number of registered translators.
    pub fn len(&self) -> usize {
        self.translators.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

impl fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
