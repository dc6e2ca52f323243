//! Definition units: bound hierarchical names.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::{NamespacePath, SymbolTable, Value};

bitflags! {
    /// Facts about how a unit was produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UnitFlags: u8 {
        /// The unit can contain sub-units.
        const PACKAGE = 1 << 0;
        /// Symbols were copied from a provider's native form, not executed.
        const NATIVE = 1 << 1;
        /// Built by the two-phase overlay bind.
        const MERGED = 1 << 2;
        /// A frozen snapshot taken between the base and override phases.
        const WORKING_COPY = 1 << 3;
    }
}

/// Where a unit came from.
#[derive(Debug, Clone)]
pub struct Provenance {
    /// Provider-supplied description of the source (e.g. `memory:json`).
    pub origin: Arc<str>,
    /// Root of the layer the unit was loaded from, if it belongs to one.
    pub layer_root: Option<NamespacePath>,
    pub flags: UnitFlags,
}

impl Provenance {
    pub fn new(origin: impl Into<Arc<str>>, flags: UnitFlags) -> Self {
        Self {
            origin: origin.into(),
            layer_root: None,
            flags,
        }
    }

    pub fn with_layer_root(mut self, root: NamespacePath) -> Self {
        self.layer_root = Some(root);
        self
    }
}

/// The bound result of loading one hierarchical name.
///
/// A unit may retain auxiliary units whose tables its symbols depend on: a
/// merged unit retains the override unit its functions were copied from, so
/// their globals live exactly as long as the merged unit.
pub struct DefinitionUnit {
    path: NamespacePath,
    provenance: Provenance,
    table: SymbolTable,
    retained: Mutex<Vec<Arc<DefinitionUnit>>>,
}

impl DefinitionUnit {
    pub fn new(path: NamespacePath, provenance: Provenance, table: SymbolTable) -> Self {
        Self {
            path,
            provenance,
            table,
            retained: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &NamespacePath {
        &self.path
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn flags(&self) -> UnitFlags {
        self.provenance.flags
    }

    pub fn is_package(&self) -> bool {
        self.provenance.flags.contains(UnitFlags::PACKAGE)
    }

    pub fn is_merged(&self) -> bool {
        self.provenance.flags.contains(UnitFlags::MERGED)
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn parent(&self) -> Option<NamespacePath> {
        self.path.parent()
    }

    /// The package relative imports resolve against: the unit itself for a
    /// package, otherwise its parent.
    pub fn anchor(&self) -> Option<NamespacePath> {
        if self.is_package() {
            Some(self.path.clone())
        } else {
            self.parent()
        }
    }

    /// Tier-one attribute lookup: the bound table only.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.table.get(name)
    }

    /// Keep `unit` alive for as long as `self` is.
    pub fn retain(&self, unit: Arc<DefinitionUnit>) {
        self.retained.lock().push(unit);
    }

    pub fn retained(&self) -> Vec<Arc<DefinitionUnit>> {
        self.retained.lock().clone()
    }
}

impl fmt::Debug for DefinitionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionUnit")
            .field("path", &self.path.to_string())
            .field("origin", &self.provenance.origin)
            .field("flags", &self.provenance.flags)
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str, flags: UnitFlags) -> DefinitionUnit {
        DefinitionUnit::new(
            NamespacePath::parse(path).unwrap(),
            Provenance::new("test", flags),
            SymbolTable::new(),
        )
    }

    #[test]
    fn anchor_for_package_and_module() {
        let pkg = unit("pkg.sub", UnitFlags::PACKAGE);
        assert_eq!(pkg.anchor().unwrap().to_string(), "pkg.sub");
        let module = unit("pkg.sub", UnitFlags::empty());
        assert_eq!(module.anchor().unwrap().to_string(), "pkg");
        assert!(unit("top", UnitFlags::empty()).anchor().is_none());
    }

    #[test]
    fn retained_units_live_with_owner() {
        let owner = unit("m", UnitFlags::MERGED);
        let aux = Arc::new(unit("o", UnitFlags::empty()));
        owner.retain(aux.clone());
        assert_eq!(Arc::strong_count(&aux), 2);
        drop(owner);
        assert_eq!(Arc::strong_count(&aux), 1);
    }
}
