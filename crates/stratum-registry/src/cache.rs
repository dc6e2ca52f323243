//! Load cache with atomic snapshot publication.
//!
//! Readers load the current `Arc` snapshot and never block. Writers clone the
//! snapshot, apply their change and publish it with compare-and-swap,
//! retrying from the latest snapshot when another writer won first.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use stratum_core::{DefinitionUnit, NamespacePath};

/// Identity of one merged unit: the base unit, the override unit and the
/// path it is mounted at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub base: NamespacePath,
    pub override_path: NamespacePath,
    pub mount: NamespacePath,
}

impl CacheKey {
    pub fn new(base: NamespacePath, override_path: NamespacePath, mount: NamespacePath) -> Self {
        Self {
            base,
            override_path,
            mount,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- ({} over {})", self.mount, self.override_path, self.base)
    }
}

type Snapshot<K> = FxHashMap<K, Arc<DefinitionUnit>>;

/// Constructed units keyed by `K`.
pub struct LoadCache<K = CacheKey> {
    snap: ArcSwap<Snapshot<K>>,
}

impl<K> Default for LoadCache<K> {
    fn default() -> Self {
        Self {
            snap: ArcSwap::from_pointee(FxHashMap::default()),
        }
    }
}

impl<K: Eq + Hash + Clone> LoadCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock-free lookup.
    #[inline]
    pub fn get(&self, key: &K) -> Option<Arc<DefinitionUnit>> {
        self.snap.load().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.snap.load().contains_key(key)
    }

    /// Insert `unit` unless `key` is already present; returns whichever unit
    /// is cached afterwards. The first insert wins.
    pub fn get_or_insert(&self, key: K, unit: Arc<DefinitionUnit>) -> Arc<DefinitionUnit> {
        let mut existing = None;
        self.publish(|next| match next.get(&key) {
            Some(cached) => {
                existing = Some(cached.clone());
                false
            }
            None => {
                next.insert(key.clone(), unit.clone());
                true
            }
        });
        existing.unwrap_or(unit)
    }

    /// Insert or overwrite; returns the previous unit.
    pub fn replace(&self, key: K, unit: Arc<DefinitionUnit>) -> Option<Arc<DefinitionUnit>> {
        let mut previous = None;
        self.publish(|next| {
            previous = next.insert(key.clone(), unit.clone());
            true
        });
        previous
    }

    /// Remove one key; returns the removed unit.
    pub fn invalidate(&self, key: &K) -> Option<Arc<DefinitionUnit>> {
        let mut removed = None;
        self.publish(|next| {
            removed = next.remove(key);
            removed.is_some()
        });
        removed
    }

    /// Remove every key matching `pred`; returns how many were removed.
    pub fn invalidate_where(&self, pred: impl Fn(&K) -> bool) -> usize {
        let mut count = 0;
        self.publish(|next| {
            let before = next.len();
            next.retain(|key, _| !pred(key));
            count = before - next.len();
            count > 0
        });
        count
    }

    pub fn clear(&self) {
        self.snap.store(Arc::new(FxHashMap::default()));
    }

    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }

    /// Every cached key.
    pub fn keys(&self) -> Vec<K> {
        self.snap.load().keys().cloned().collect()
    }

    /// CAS loop: `apply` edits a private copy of the current snapshot and
    /// returns whether it changed anything.
    fn publish(&self, mut apply: impl FnMut(&mut Snapshot<K>) -> bool) {
        loop {
            let cur = self.snap.load_full();
            let mut next = (*cur).clone();
            if !apply(&mut next) {
                return;
            }
            let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                return;
            }
        }
    }
}

impl LoadCache<CacheKey> {
    /// Remove every merged unit mounted at or below `mount`.
    pub fn invalidate_mount(&self, mount: &NamespacePath) -> usize {
        self.invalidate_where(|key| key.mount.starts_with(mount))
    }
}

impl<K> fmt::Debug for LoadCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCache")
            .field("len", &self.snap.load().len())
            .finish()
    }
}
