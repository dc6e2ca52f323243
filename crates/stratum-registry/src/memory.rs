//! In-memory namespace provider.
//!
//! Holds definition-language sources and native units addressed by dotted
//! names. The tree sits behind a lock so entries can be edited after the
//! provider has been shared with a resolver (for example before a reload).

use std::sync::Arc;

use parking_lot::RwLock;
use stratum_core::{
    BindError, NamespacePath, NamespaceProvider, PathError, ProviderEntry, SymbolTable,
};

use crate::module::NativeModule;
use crate::namespace_tree::{NamespaceData, NamespaceTree};

/// A provider whose entries live in a [`NamespaceTree`].
///
/// Any node with children is a package. Intermediate nodes that were never
/// given a source are empty packages.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    tree: RwLock<NamespaceTree>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Add a script unit.
    pub fn with_script(self, name: &str, source: &str) -> Result<Self, PathError> {
        self.insert_script(name, source)?;
        Ok(self)
    }

    /// Add a package unit (a unit that can have sub-units) with source text.
    pub fn with_package(self, name: &str, source: &str) -> Result<Self, PathError> {
        self.insert_package(name, source)?;
        Ok(self)
    }

    /// Add a native unit.
    pub fn with_native(self, name: &str, module: NativeModule) -> Result<Self, PathError> {
        self.insert_native(name, module)?;
        Ok(self)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Set (or replace) the source text of `name`.
    pub fn insert_script(&self, name: &str, source: &str) -> Result<(), PathError> {
        self.update(name, |data| data.text = Some(Arc::from(source)))
    }

    /// Like [`insert_script`](Self::insert_script) but marks the entry as a package.
    pub fn insert_package(&self, name: &str, source: &str) -> Result<(), PathError> {
        self.update(name, |data| {
            data.text = Some(Arc::from(source));
            data.package = true;
        })
    }

    /// Set (or replace) the native form of `name`. An entry may carry both a
    /// text form and a native form.
    pub fn insert_native(&self, name: &str, module: NativeModule) -> Result<(), PathError> {
        self.update(name, |data| data.native = Some(module))
    }

    /// Clear the entry at `name`. Sub-entries are kept. Returns whether
    /// anything was defined there.
    pub fn remove(&self, name: &str) -> bool {
        let Ok(path) = NamespacePath::parse(name) else {
            return false;
        };
        let mut tree = self.tree.write();
        let Some(node) = tree.get_path(path.segments()) else {
            return false;
        };
        match tree.get_namespace_mut(node) {
            Some(data) if data.is_defined() => {
                *data = NamespaceData::new();
                true
            }
            _ => false,
        }
    }

    /// Every defined name, sorted.
    pub fn names(&self) -> Vec<NamespacePath> {
        self.tree
            .read()
            .defined_paths()
            .into_iter()
            .filter_map(|segments| NamespacePath::from_segments(segments).ok())
            .collect()
    }

    fn update(&self, name: &str, f: impl FnOnce(&mut NamespaceData)) -> Result<(), PathError> {
        let path = NamespacePath::parse(name)?;
        let mut tree = self.tree.write();
        let node = tree.get_or_create_path(path.segments());
        if let Some(data) = tree.get_namespace_mut(node) {
            f(data);
        }
        Ok(())
    }

    fn with_data<R>(&self, name: &NamespacePath, f: impl FnOnce(&NamespaceData) -> R) -> Option<R> {
        let tree = self.tree.read();
        let node = tree.get_path(name.segments())?;
        tree.get_namespace(node).map(f)
    }
}

impl NamespaceProvider for MemoryProvider {
    fn locate(&self, name: &NamespacePath) -> Option<ProviderEntry> {
        let tree = self.tree.read();
        let node = tree.get_path(name.segments())?;
        if !tree.is_live(node) {
            return None;
        }
        let data = tree.get_namespace(node)?;
        let origin = if data.text.is_some() || data.native.is_none() {
            format!("memory:{name}")
        } else {
            format!("native:{name}")
        };
        Some(ProviderEntry {
            name: name.clone(),
            is_package: tree.is_package(node),
            origin: Arc::from(origin),
        })
    }

    fn get_text(&self, entry: &ProviderEntry) -> Option<Arc<str>> {
        self.with_data(&entry.name, |data| match (&data.text, &data.native) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(_)) => None,
            // Implicit package: nothing to execute.
            (None, None) => Some(Arc::from("")),
        })
        .flatten()
    }

    fn bind(&self, entry: &ProviderEntry, into: &SymbolTable) -> Result<(), BindError> {
        let module = self
            .with_data(&entry.name, |data| data.native.clone())
            .flatten();
        match module {
            Some(module) => {
                module.bind_into(into);
                Ok(())
            }
            None => Err(BindError::NoNativeForm {
                name: entry.name.clone(),
            }),
        }
    }
}
