//! Resolver configuration.

/// What the loader does with unit text that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Log a warning and bind the provider's native form instead. The load
    /// fails only if there is no native form either.
    #[default]
    Lenient,
    /// Fail the load with `OverlayError::MalformedUnit`.
    Strict,
}

/// Tunables for a [`Resolver`](crate::Resolver).
///
/// ```
/// use stratum::{FallbackPolicy, ResolverConfig};
///
/// let config = ResolverConfig::new()
///     .fallback_policy(FallbackPolicy::Strict)
///     .max_depth(16);
/// assert_eq!(config.max_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub fallback_policy: FallbackPolicy,
    /// Maximum number of unit constructions nested inside one another.
    pub max_depth: usize,
    /// Maximum script call depth within one evaluation.
    pub max_call_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::Lenient,
            max_depth: 64,
            max_call_depth: 128,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
