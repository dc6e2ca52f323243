//! Local scope management for function lowering.
//!
//! `LocalScope` tracks the locals of one function body:
//! - slot allocation for parameters, `let` bindings, loop variables and
//!   function-level imports
//! - nested block scopes (if/while/for bodies)
//! - shadowing with restoration on scope exit
//!
//! Top-level code has no `LocalScope`; every name there is a global.

use std::sync::Arc;

use rustc_hash::FxHashMap;

/// A declared local.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub slot: u32,
    /// Block depth where declared (0 = function scope).
    pub depth: u32,
}

#[derive(Debug, Default)]
pub struct LocalScope {
    variables: FxHashMap<Arc<str>, LocalVar>,
    depth: u32,
    /// (shadowing depth, name, shadowed variable)
    shadowed: Vec<(u32, Arc<str>, LocalVar)>,
    /// Name of every slot allocated so far; its length is the frame size.
    slot_names: Vec<Arc<str>>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enter a block.
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave a block, forgetting its variables and restoring shadowed ones.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.variables.retain(|_, var| var.depth < depth);

        while let Some((shadowing_depth, _, _)) = self.shadowed.last() {
            if *shadowing_depth != depth {
                break;
            }
            if let Some((_, name, var)) = self.shadowed.pop() {
                self.variables.insert(name, var);
            }
        }

        // Slots are never reused.
        self.depth -= 1;
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    // ==========================================================================
    // Declaration and Lookup
    // ==========================================================================

    /// Declare a local in the current block.
    ///
    /// Redeclaring a name in the same block rebinds the existing slot;
    /// declaring it in an inner block shadows the outer variable.
    pub fn declare(&mut self, name: &str) -> u32 {
        if let Some(existing) = self.variables.get(name) {
            if existing.depth == self.depth {
                return existing.slot;
            }
            let shadowed = existing.clone();
            self.shadowed.push((self.depth, Arc::from(name), shadowed));
        }

        let name: Arc<str> = Arc::from(name);
        let slot = self.slot_names.len() as u32;
        self.slot_names.push(name.clone());
        self.variables.insert(
            name,
            LocalVar {
                slot,
                depth: self.depth,
            },
        );
        slot
    }

    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    /// Number of slots the function frame needs.
    pub fn frame_size(&self) -> u32 {
        self.slot_names.len() as u32
    }

    /// Consume the scope, returning each slot's name.
    pub fn into_slot_names(self) -> Vec<Arc<str>> {
        self.slot_names
    }
}
