//! Ordered provider chain.

use std::fmt;
use std::sync::Arc;

use stratum_core::{NamespacePath, NamespaceProvider, ProviderEntry};

/// An entry together with the provider that located it.
#[derive(Clone)]
pub struct Located {
    pub provider: Arc<dyn NamespaceProvider>,
    pub entry: ProviderEntry,
}

impl fmt::Debug for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Located").field("entry", &self.entry).finish()
    }
}

/// Providers consulted in order; the first that locates a name wins.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn NamespaceProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, provider: Arc<dyn NamespaceProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn locate(&self, name: &NamespacePath) -> Option<Located> {
        self.providers.iter().find_map(|provider| {
            provider.locate(name).map(|entry| Located {
                provider: provider.clone(),
                entry,
            })
        })
    }
}

impl fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderChain")
            .field("len", &self.providers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use stratum_registry::MemoryProvider;

    use super::*;

    #[test]
    fn first_provider_wins() {
        let first = MemoryProvider::new().with_script("a", "let v = 1;").unwrap();
        let second = MemoryProvider::new()
            .with_script("a", "let v = 2;")
            .unwrap()
            .with_script("b", "")
            .unwrap();

        let mut chain = ProviderChain::new();
        chain.push(Arc::new(first));
        chain.push(Arc::new(second));
        assert_eq!(chain.len(), 2);

        let a = NamespacePath::parse("a").unwrap();
        let located = chain.locate(&a).unwrap();
        assert_eq!(
            located.provider.get_text(&located.entry).as_deref(),
            Some("let v = 1;")
        );
        assert!(chain.locate(&NamespacePath::parse("b").unwrap()).is_some());
        assert!(chain.locate(&NamespacePath::parse("c").unwrap()).is_none());
    }
}
