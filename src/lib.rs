//! Stratum: layered namespace overlays.
//!
//! A [`Resolver`] mounts an *override* namespace over a *base* namespace at a
//! *mount* point. Resolving the mount yields a merged namespace: the base's
//! definitions are bound first with every reference to the base redirected to
//! the mount, then the override's public definitions replace them. Code in
//! the override reaches the original base definitions through a frozen
//! working copy taken between the two phases, so extending a function by
//! calling the original is not a cycle.
//!
//! Neither layer is modified: the base and override stay importable on their
//! own, and sub-namespaces of a mount resolve lazily through the same rules.
//!
//! # Crates
//!
//! - `stratum-core` - paths, values, symbol tables, units and errors
//! - `stratum-parser` - definition-language parser and reference rewriter
//! - `stratum-compiler` - lowering to the owned IR
//! - `stratum-registry` - in-memory provider, load cache and mount registry
//! - `stratum-modules` - native `json`, `math` and `text` namespaces

pub mod config;
pub mod context;
pub mod engine;
pub mod guard;
pub mod loader;
pub mod providers;
pub mod vm;

pub use config::{FallbackPolicy, ResolverConfig};
pub use engine::{MergedNamespace, Resolver};
pub use loader::{LoadOutcome, Rewrite, compile_rewritten};
pub use providers::{Located, ProviderChain};
pub use vm::Interpreter;

pub use stratum_core::{
    Arity, BindError, DefinitionUnit, Function, LayerRole, NamespaceHandle, NamespacePath,
    NamespaceProvider, OverlayError, ParseErrors, PathError, Provenance, ProviderEntry,
    RuntimeError, SymbolTable, UnitFlags, Value,
};
pub use stratum_registry::{MemoryProvider, NativeModule};

pub use stratum_modules as modules;
