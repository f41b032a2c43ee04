//! # Storage
//!
//! Settings store for numbering schemes. The engine only needs to read a
//! scheme, write it back, and hold a per-scheme lock around read-modify-write.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

pub mod file;

use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

pub use self::file::FileStore;
use crate::{
    error::{Error, Result},
    scheme::NumberingScheme,
};

/// Row-style access to persisted schemes.
///
/// `try_lock` / `unlock` provide mutual exclusion per scheme id that holds
/// across every handle to the same backing store. `try_lock` returns
/// `Ok(false)` when another holder has the lock.
pub trait SchemeStore: Send + Sync {
    fn get(&self, id: &str) -> Result<NumberingScheme>;

    fn save(&self, scheme: &NumberingScheme) -> Result<()>;

    /// All schemes, ordered by id
    fn list(&self) -> Result<Vec<NumberingScheme>>;

    fn try_lock(&self, id: &str) -> Result<bool>;

    fn unlock(&self, id: &str) -> Result<()>;
}

impl<S: SchemeStore + ?Sized> SchemeStore for Arc<S> {
    fn get(&self, id: &str) -> Result<NumberingScheme> {
        (**self).get(id)
    }

    fn save(&self, scheme: &NumberingScheme) -> Result<()> {
        (**self).save(scheme)
    }

    fn list(&self) -> Result<Vec<NumberingScheme>> {
        (**self).list()
    }

    fn try_lock(&self, id: &str) -> Result<bool> {
        (**self).try_lock(id)
    }

    fn unlock(&self, id: &str) -> Result<()> {
        (**self).unlock(id)
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    schemes: Mutex<BTreeMap<String, NumberingScheme>>,
    locked: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `schemes`.
    pub fn with_schemes(schemes: impl IntoIterator<Item = NumberingScheme>) -> Self {
        let store = Self::new();
        {
            let mut map = lock(&store.schemes);
            for scheme in schemes {
                map.insert(scheme.id.clone(), scheme);
            }
        }
        store
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SchemeStore for MemoryStore {
    fn get(&self, id: &str) -> Result<NumberingScheme> {
        lock(&self.schemes)
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SchemeNotFound(id.to_string()))
    }

    fn save(&self, scheme: &NumberingScheme) -> Result<()> {
        crate::scheme::validate_id(&scheme.id)?;
        lock(&self.schemes).insert(scheme.id.clone(), scheme.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<NumberingScheme>> {
        Ok(lock(&self.schemes).values().cloned().collect())
    }

    fn try_lock(&self, id: &str) -> Result<bool> {
        Ok(lock(&self.locked).insert(id.to_string()))
    }

    fn unlock(&self, id: &str) -> Result<()> {
        lock(&self.locked).remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::Sector;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let scheme = NumberingScheme::new("acc", Sector::Museum, "ACC.{SEQ}").unwrap();
        store.save(&scheme).unwrap();
        assert_eq!(store.get("acc").unwrap(), scheme);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_missing() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("nope"), Err(Error::SchemeNotFound(_))));
    }

    #[test]
    fn test_memory_store_locking() {
        let store = MemoryStore::new();
        assert!(store.try_lock("a").unwrap());
        assert!(!store.try_lock("a").unwrap());
        assert!(store.try_lock("b").unwrap());
        store.unlock("a").unwrap();
        assert!(store.try_lock("a").unwrap());
    }

    #[test]
    fn test_list_is_ordered() {
        let store = MemoryStore::with_schemes([
            NumberingScheme::new("zeta", Sector::Archive, "{SEQ}").unwrap(),
            NumberingScheme::new("alpha", Sector::Archive, "{SEQ}").unwrap(),
        ]);
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
