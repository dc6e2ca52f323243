//! Mount registry: which overlay is mounted where.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use parking_lot::RwLock;
use stratum_core::NamespacePath;

/// A registered overlay: `override_root` layered over `base`, visible at `mount`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverlayMount {
    pub mount: NamespacePath,
    pub override_root: NamespacePath,
    pub base: NamespacePath,
}

impl OverlayMount {
    pub fn new(base: NamespacePath, override_root: NamespacePath, mount: NamespacePath) -> Self {
        Self {
            mount,
            override_root,
            base,
        }
    }

    /// Base and override unit paths for `suffix` below the mount root.
    pub fn layers_for(&self, suffix: &[String]) -> (NamespacePath, NamespacePath) {
        (self.base.join(suffix), self.override_root.join(suffix))
    }
}

impl fmt::Display for OverlayMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} over {}",
            self.mount, self.override_root, self.base
        )
    }
}

/// A path matched against a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountMatch {
    pub mount: OverlayMount,
    /// Segments of the requested path below the mount root.
    pub suffix: Vec<String>,
}

impl MountMatch {
    /// The requested path itself.
    pub fn unit_path(&self) -> NamespacePath {
        self.mount.mount.join(&self.suffix)
    }
}

/// Result of [`MountRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The mount root was free.
    Added,
    /// The exact same triple was already registered.
    Unchanged,
    /// The mount root was bound to a different pair; carries the old mount.
    Replaced(OverlayMount),
}

impl Registration {
    pub fn changed(&self) -> bool {
        !matches!(self, Registration::Unchanged)
    }
}

/// Registered mounts keyed by mount root.
#[derive(Debug, Default)]
pub struct MountRegistry {
    mounts: RwLock<BTreeMap<NamespacePath, OverlayMount>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, mount: OverlayMount) -> Registration {
        let mut mounts = self.mounts.write();
        match mounts.get(&mount.mount) {
            Some(existing) if *existing == mount => Registration::Unchanged,
            _ => match mounts.insert(mount.mount.clone(), mount) {
                Some(old) => Registration::Replaced(old),
                None => Registration::Added,
            },
        }
    }

    /// Remove the mount rooted exactly at `mount`.
    pub fn unregister(&self, mount: &NamespacePath) -> Option<OverlayMount> {
        self.mounts.write().remove(mount)
    }

    /// The mount rooted exactly at `mount`.
    pub fn get(&self, mount: &NamespacePath) -> Option<OverlayMount> {
        self.mounts.read().get(mount).cloned()
    }

    /// The longest registered mount root that is `path` or one of its prefixes.
    pub fn find(&self, path: &NamespacePath) -> Option<MountMatch> {
        let mounts = self.mounts.read();
        (1..=path.len()).rev().find_map(|n| {
            let mount = mounts.get(&path.prefix(n))?;
            Some(MountMatch {
                mount: mount.clone(),
                suffix: path.segments()[n..].to_vec(),
            })
        })
    }

    /// Whether `path` is a strict prefix of some registered mount root, so a
    /// nested mount stays reachable through parents no provider supplies.
    pub fn is_mount_ancestor(&self, path: &NamespacePath) -> bool {
        self.mounts
            .read()
            .keys()
            .any(|root| root.len() > path.len() && root.starts_with(path))
    }

    pub fn list_mounts(&self) -> BTreeSet<NamespacePath> {
        self.mounts.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(name: &str) -> NamespacePath {
        NamespacePath::parse(name).unwrap()
    }

    fn overlay(base: &str, over: &str, mount: &str) -> OverlayMount {
        OverlayMount::new(path(base), path(over), path(mount))
    }

    #[test]
    fn register_is_idempotent() {
        let registry = MountRegistry::new();
        assert_eq!(registry.register(overlay("json", "json_sq", "mnt")), Registration::Added);
        assert_eq!(
            registry.register(overlay("json", "json_sq", "mnt")),
            Registration::Unchanged
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_replaces_different_pair() {
        let registry = MountRegistry::new();
        registry.register(overlay("json", "a", "mnt"));
        let outcome = registry.register(overlay("json", "b", "mnt"));
        assert_eq!(outcome, Registration::Replaced(overlay("json", "a", "mnt")));
        assert!(outcome.changed());
        assert_eq!(registry.get(&path("mnt")).unwrap().override_root, path("b"));
    }

    #[test]
    fn find_longest_prefix() {
        let registry = MountRegistry::new();
        registry.register(overlay("b", "o", "m"));
        registry.register(overlay("b2", "o2", "m.inner"));

        let hit = registry.find(&path("m.inner.x")).unwrap();
        assert_eq!(hit.mount.mount, path("m.inner"));
        assert_eq!(hit.suffix, vec!["x".to_string()]);
        assert_eq!(hit.unit_path(), path("m.inner.x"));

        let hit = registry.find(&path("m.other")).unwrap();
        assert_eq!(hit.mount.mount, path("m"));
        let (base, over) = hit.mount.layers_for(&hit.suffix);
        assert_eq!(base, path("b.other"));
        assert_eq!(over, path("o.other"));
    }

    #[test]
    fn mount_ancestors() {
        let registry = MountRegistry::new();
        registry.register(overlay("b", "o", "vendor.json"));
        assert!(registry.is_mount_ancestor(&path("vendor")));
        assert!(!registry.is_mount_ancestor(&path("vendor.json")));
        assert!(!registry.is_mount_ancestor(&path("other")));
    }

    #[test]
    fn find_is_segment_exact() {
        let registry = MountRegistry::new();
        registry.register(overlay("b", "o", "json"));
        assert!(registry.find(&path("json2")).is_none());
        assert!(registry.find(&path("json")).unwrap().suffix.is_empty());
    }

    #[test]
    fn unregister_and_list() {
        let registry = MountRegistry::new();
        registry.register(overlay("b", "o", "z"));
        registry.register(overlay("b", "o", "a"));
        assert_eq!(
            registry.list_mounts().into_iter().collect::<Vec<_>>(),
            vec![path("a"), path("z")]
        );
        assert!(registry.unregister(&path("a")).is_some());
        assert!(registry.unregister(&path("a")).is_none());
        assert!(registry.find(&path("a.x")).is_none());
        assert_eq!(registry.len(), 1);
    }
}
