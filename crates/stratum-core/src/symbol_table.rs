//! Shared symbol tables.
//!
//! A [`SymbolTable`] is the binding environment of one definition unit. It is
//! shared by handle: the unit, every function defined in it (weakly) and any
//! namespace value referring to the unit all see the same map.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{Value, is_private};

type Symbols = FxHashMap<String, Value>;

/// Shared, lock-protected map from name to value.
///
/// Locks are held only for the duration of one operation; values are cloned
/// out, never borrowed, so evaluation never runs under a table lock.
#[derive(Clone, Default)]
pub struct SymbolTable {
    inner: Arc<RwLock<Symbols>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.read().get(name).cloned()
    }

    /// Bind `name`, returning the previous value.
    pub fn insert(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.write().insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// All bound names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All bindings, sorted by name.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Bindings whose names are not private, sorted by name.
    pub fn public_entries(&self) -> Vec<(String, Value)> {
        let mut entries = self.entries();
        entries.retain(|(name, _)| !is_private(name));
        entries
    }

    /// An independent shallow copy. Later writes to either table are not
    /// visible in the other.
    pub fn snapshot(&self) -> SymbolTable {
        let copy = self.inner.read().clone();
        SymbolTable {
            inner: Arc::new(RwLock::new(copy)),
        }
    }

    /// Copy every public binding of `source` over `self`, returning how many
    /// names were written.
    pub fn copy_public_from(&self, source: &SymbolTable) -> usize {
        if self.ptr_eq(source) {
            return 0;
        }
        let entries = source.public_entries();
        let count = entries.len();
        let mut symbols = self.inner.write();
        for (name, value) in entries {
            symbols.insert(name, value);
        }
        count
    }

    pub fn downgrade(&self) -> WeakSymbolTable {
        WeakSymbolTable {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same table.
    pub fn ptr_eq(&self, other: &SymbolTable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("names", &self.names())
            .finish()
    }
}

/// Non-owning handle to a [`SymbolTable`].
#[derive(Clone, Default)]
pub struct WeakSymbolTable {
    inner: Weak<RwLock<Symbols>>,
}

impl WeakSymbolTable {
    pub fn upgrade(&self) -> Option<SymbolTable> {
        self.inner.upgrade().map(|inner| SymbolTable { inner })
    }
}

impl fmt::Debug for WeakSymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakSymbolTable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_independent() {
        let table = SymbolTable::new();
        table.insert("a", Value::Int(1));
        let copy = table.snapshot();
        table.insert("a", Value::Int(2));
        copy.insert("b", Value::Int(3));
        assert_eq!(copy.get("a"), Some(Value::Int(1)));
        assert!(!table.contains("b"));
        assert!(!copy.ptr_eq(&table));
    }

    #[test]
    fn copy_public_skips_private() {
        let source = SymbolTable::new();
        source.insert("visible", Value::Int(1));
        source.insert("_hidden", Value::Int(2));
        let target = SymbolTable::new();
        target.insert("visible", Value::Int(0));
        assert_eq!(target.copy_public_from(&source), 1);
        assert_eq!(target.get("visible"), Some(Value::Int(1)));
        assert!(!target.contains("_hidden"));
    }

    #[test]
    fn copy_into_self_is_noop() {
        let table = SymbolTable::new();
        table.insert("x", Value::Null);
        assert_eq!(table.copy_public_from(&table.clone()), 0);
    }

    #[test]
    fn weak_handle_follows_owner() {
        let table = SymbolTable::new();
        let weak = table.downgrade();
        assert!(weak.upgrade().unwrap().ptr_eq(&table));
        drop(table);
        assert!(weak.upgrade().is_none());
    }
}
