//! Stratum core crate.
//!
//! Foundational types shared by every layer of the overlay resolver:
//!
//! - [`NamespacePath`] / [`NamespaceHandle`] - hierarchical, dot-separated names
//! - [`Value`], [`Function`] - runtime values of the definition language
//! - [`SymbolTable`] - shared, lock-protected name → value maps
//! - [`DefinitionUnit`] - one bound hierarchical name plus provenance
//! - [`ir`] - the owned, lowered form of a definition unit
//! - [`NamespaceProvider`] - the seam through which namespace trees are located
//! - Error taxonomy for lexing, parsing, evaluation and overlay resolution

pub mod ir;

mod error;
mod path;
mod provider;
mod span;
mod symbol_table;
mod unit;
mod value;

pub use error::{
    BindError, LexError, OverlayError, ParseError, ParseErrorKind, ParseErrors, RuntimeError,
};
pub use path::{LayerRole, NamespaceHandle, NamespacePath, PathError, is_identifier, is_private};
pub use provider::{NamespaceProvider, ProviderEntry};
pub use span::Span;
pub use symbol_table::{SymbolTable, WeakSymbolTable};
pub use unit::{DefinitionUnit, Provenance, UnitFlags};
pub use value::{Arity, Function, NativeFn, NativeFunction, ScriptFunction, Value};
