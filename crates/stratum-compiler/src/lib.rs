//! Stratum Compiler
//!
//! Lowers the arena AST produced by `stratum-parser` into the owned IR of
//! `stratum_core::ir`, which outlives the arena and is what the interpreter
//! executes.
//!
//! ## Modules
//!
//! - [`lower`]: AST to IR lowering
//! - [`scope`]: Local scope management for function bodies

pub mod lower;
pub mod scope;

pub use lower::lower;
pub use scope::{LocalScope, LocalVar};

use bumpalo::Bump;
use stratum_core::ParseErrors;
use stratum_core::ir::Chunk;
use stratum_parser::Parser;

/// Parse and lower `source` in one step.
pub fn compile(source: &str) -> Result<Chunk, ParseErrors> {
    let arena = Bump::new();
    let unit = Parser::parse(source, &arena)?;
    Ok(lower(&unit))
}
