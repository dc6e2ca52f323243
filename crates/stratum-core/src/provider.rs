//! The seam through which namespace trees are located.

use std::sync::Arc;

use crate::{BindError, NamespacePath, SymbolTable};

/// A located hierarchical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    pub name: NamespacePath,
    /// Whether the entry can contain sub-entries.
    pub is_package: bool,
    /// Human-readable description of where the entry lives.
    pub origin: Arc<str>,
}

/// Supplies definition units by hierarchical name.
///
/// An entry may have a text form (definition-language source), a native form
/// (symbols bound directly by Rust code), or both. Loaders prefer text and
/// fall back to [`bind`](NamespaceProvider::bind).
pub trait NamespaceProvider: Send + Sync {
    /// Find `name`, or `None` if this provider does not know it.
    fn locate(&self, name: &NamespacePath) -> Option<ProviderEntry>;

    /// Source text of a located entry, if it has one.
    fn get_text(&self, entry: &ProviderEntry) -> Option<Arc<str>>;

    /// Bind the entry's native form into `into`.
    fn bind(&self, entry: &ProviderEntry, into: &SymbolTable) -> Result<(), BindError>;
}

impl<P: NamespaceProvider + ?Sized> NamespaceProvider for Arc<P> {
    fn locate(&self, name: &NamespacePath) -> Option<ProviderEntry> {
        (**self).locate(name)
    }

    fn get_text(&self, entry: &ProviderEntry) -> Option<Arc<str>> {
        (**self).get_text(entry)
    }

    fn bind(&self, entry: &ProviderEntry, into: &SymbolTable) -> Result<(), BindError> {
        (**self).bind(entry, into)
    }
}
