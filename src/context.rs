//! Per-resolver interception state.
//!
//! A `ResolutionContext` is only touched while the resolution guard is held.
//! It records the units currently under construction (so a circular import
//! sees the partially built unit) and the working copies that override code
//! may import while its merged unit is being built.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use stratum_core::{DefinitionUnit, NamespacePath};

#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Units being constructed, keyed by the path they are requested under.
    in_progress: FxHashMap<NamespacePath, Arc<DefinitionUnit>>,
    /// Live working copies keyed by their synthetic single-segment name.
    working_copies: FxHashMap<String, Arc<DefinitionUnit>>,
    /// Constructions currently nested inside one another.
    depth: usize,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================
    // In-progress units
    // =========================================

    pub fn in_progress(&self, path: &NamespacePath) -> Option<Arc<DefinitionUnit>> {
        self.in_progress.get(path).cloned()
    }

    pub fn begin(&mut self, path: NamespacePath, unit: Arc<DefinitionUnit>) {
        self.in_progress.insert(path, unit);
        self.depth += 1;
    }

    pub fn finish(&mut self, path: &NamespacePath) {
        if self.in_progress.remove(path).is_some() {
            self.depth = self.depth.saturating_sub(1);
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    // =========================================
    // Working copies
    // =========================================

    pub fn add_working_copy(&mut self, name: String, unit: Arc<DefinitionUnit>) {
        self.working_copies.insert(name, unit);
    }

    pub fn working_copy(&self, name: &str) -> Option<Arc<DefinitionUnit>> {
        self.working_copies.get(name).cloned()
    }

    pub fn drop_working_copy(&mut self, name: &str) -> Option<Arc<DefinitionUnit>> {
        self.working_copies.remove(name)
    }

    /// Whether nothing is under construction.
    pub fn is_idle(&self) -> bool {
        self.in_progress.is_empty() && self.working_copies.is_empty()
    }
}
