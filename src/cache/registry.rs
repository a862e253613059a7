//! Cache registry - Central management for all caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{CacheConfig, TypedCache};

/// Errors raised by the cache registry.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache '{name}' already exists as {existing}, requested {requested}")]
    TypeMismatch {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },
}

/// Central registry of named typed caches.
///
/// Components ask for their cache by name, so two repositories created
/// from the same registry share one cache per name.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Internal cache entry storing type-erased cache.
struct CacheEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CacheEntry {
    fn downcast<K, V>(&self, name: &str) -> Result<TypedCache<K, V>, CacheError>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let requested = std::any::type_name::<TypedCache<K, V>>();
        if self.type_id != TypeId::of::<TypedCache<K, V>>() {
            return Err(CacheError::TypeMismatch {
                name: name.to_string(),
                existing: self.type_name,
                requested,
            });
        }
        self.cache
            .downcast_ref::<TypedCache<K, V>>()
            .cloned()
            .ok_or(CacheError::TypeMismatch {
                name: name.to_string(),
                existing: self.type_name,
                requested,
            })
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing cache or create a new one if it doesn't exist.
    ///
    /// Fails if `name` is already registered with different key/value types.
    pub fn get_or_create<K, V>(
        &self,
        name: &str,
        config: CacheConfig,
    ) -> Result<TypedCache<K, V>, CacheError>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if let Some(entry) = self.caches.read().get(name) {
            return entry.downcast(name);
        }

        let mut caches = self.caches.write();

        // Another caller may have registered it between the two locks
        if let Some(entry) = caches.get(name) {
            return entry.downcast(name);
        }

        debug!("Creating cache: {}", name);

        let cache = TypedCache::<K, V>::new(name, config);
        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_id: TypeId::of::<TypedCache<K, V>>(),
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );

        Ok(cache)
    }

}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_returns_shared_cache() {
        let registry = CacheRegistry::new();
        let a: TypedCache<i64, bool> = registry
            .get_or_create("roles", CacheConfig::default())
            .unwrap();
        let b: TypedCache<i64, bool> = registry
            .get_or_create("roles", CacheConfig::default())
            .unwrap();

        a.insert(1, true);
        assert_eq!(b.get(&1), Some(true));
        assert_eq!(registry.caches.read().len(), 1);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let registry = CacheRegistry::new();
        let _: TypedCache<i64, bool> = registry
            .get_or_create("settings", CacheConfig::default())
            .unwrap();

        let err = registry
            .get_or_create::<i64, String>("settings", CacheConfig::default())
            .unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { ref name, .. } if name == "settings"));
    }
}
