//! Stratum registry crate.
//!
//! Storage and bookkeeping around the resolver:
//!
//! - [`NamespaceTree`] - petgraph-backed hierarchy of provider entries
//! - [`MemoryProvider`] - in-memory [`NamespaceProvider`](stratum_core::NamespaceProvider)
//! - [`NativeModule`] - builder for units implemented in Rust
//! - [`LoadCache`] - constructed units keyed by (base, override, mount)
//! - [`MountRegistry`] - registered overlay mounts

pub mod cache;
pub mod memory;
pub mod module;
pub mod mounts;
pub mod namespace_tree;

pub use cache::{CacheKey, LoadCache};
pub use memory::MemoryProvider;
pub use module::NativeModule;
pub use mounts::{MountMatch, MountRegistry, OverlayMount, Registration};
pub use namespace_tree::{NamespaceData, NamespaceEdge, NamespaceTree};
