//! Layer loader: turns a located entry into symbols bound in a unit's table.
//!
//! With a text form the source is parsed, every cross-reference rewrite is
//! applied in order, and the lowered chunk is executed with the target
//! unit's table as its globals. Without one, the provider's native form is
//! bound into a scratch table and its public symbols are copied over.

use std::sync::Arc;

use bumpalo::Bump;
use stratum_compiler::lower;
use stratum_core::ir::Chunk;
use stratum_core::{DefinitionUnit, NamespacePath, OverlayError, ParseErrors, SymbolTable};
use stratum_parser::{Parser, rewrite};
use tracing::{debug, warn};

use crate::Resolver;
use crate::config::FallbackPolicy;
use crate::providers::Located;
use crate::vm::Interpreter;

/// One `search -> replace` root substitution.
pub type Rewrite = (NamespacePath, NamespacePath);

/// How a load bound its symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The text form was executed.
    Executed,
    /// The native form was bound; there was no text form.
    Bound,
    /// The text form was malformed and the native form was bound instead.
    FellBack,
}

/// Parse `source`, apply `rewrites` in order and lower the result.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_rewritten(source: &str, rewrites: &[Rewrite]) -> Result<Chunk, ParseErrors> {
    let arena = Bump::new();
    let mut unit = Parser::parse(source, &arena)?;
    for (search, replace) in rewrites {
        unit = rewrite(&unit, search, replace, &arena).unit;
    }
    Ok(lower(&unit))
}

/// Load `located` into `target`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn load(
    resolver: &Resolver,
    located: &Located,
    target: &Arc<DefinitionUnit>,
    rewrites: &[Rewrite],
) -> Result<LoadOutcome, OverlayError> {
    let name = &located.entry.name;
    let Some(text) = located.provider.get_text(&located.entry) else {
        bind_public(located, target.table())?;
        debug!(unit = %name, into = %target.path(), "bound native form");
        return Ok(LoadOutcome::Bound);
    };

    match compile_rewritten(&text, rewrites) {
        Ok(chunk) => {
            Interpreter::new(resolver)
                .run_unit(target, &chunk)
                .map_err(|source| OverlayError::Execution {
                    name: name.clone(),
                    source,
                })?;
            debug!(unit = %name, into = %target.path(), "executed text form");
            Ok(LoadOutcome::Executed)
        }
        Err(errors) => match resolver.config().fallback_policy {
            FallbackPolicy::Strict => Err(OverlayError::MalformedUnit {
                name: name.clone(),
                errors,
            }),
            FallbackPolicy::Lenient => {
                warn!(unit = %name, %errors, "malformed unit text, falling back to native form");
                bind_public(located, target.table()).map_err(|_| OverlayError::MalformedUnit {
                    name: name.clone(),
                    errors,
                })?;
                Ok(LoadOutcome::FellBack)
            }
        },
    }
}

fn bind_public(located: &Located, target: &SymbolTable) -> Result<(), OverlayError> {
    let scratch = SymbolTable::new();
    located
        .provider
        .bind(&located.entry, &scratch)
        .map_err(|source| OverlayError::Bind {
            name: located.entry.name.clone(),
            source,
        })?;
    target.copy_public_from(&scratch);
    Ok(())
}
