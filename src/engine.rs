//! The overlay resolver.
//!
//! A [`Resolver`] owns the provider chain, the mount registry and two load
//! caches: merged namespaces keyed by (base, override, mount) and plain
//! namespaces keyed by path. Every lookup first reads a cache snapshot
//! without locking; constructions happen under the reentrant resolution
//! guard so that code executed while building a unit can import further
//! units on the same thread.
//!
//! # Example
//!
//! ```
//! use stratum::{MemoryProvider, NamespaceHandle, Resolver, Value};
//!
//! let provider = MemoryProvider::new()
//!     .with_script("greet", r#"fn hello() { return "hello"; }"#)?
//!     .with_script("greet_loud", r#"
//!         import greet;
//!         fn hello() { return greet.hello().upper(); }
//!     "#)?;
//! let resolver = Resolver::new().with_provider(provider);
//!
//! let loud = resolver.shim(
//!     NamespaceHandle::base("greet"),
//!     NamespaceHandle::overlay("greet_loud"),
//!     NamespaceHandle::mount("greet_loud"),
//! )?;
//! let hello = resolver.get_attr(&loud, "hello")?;
//! assert_eq!(resolver.call(&hello, &[])?, Value::str("HELLO"));
//!
//! // The base namespace is untouched.
//! let plain = resolver.import("greet")?;
//! let hello = resolver.get_attr(&plain, "hello")?;
//! assert_eq!(resolver.call(&hello, &[])?, Value::str("hello"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use stratum_core::{
    DefinitionUnit, LayerRole, NamespaceHandle, NamespacePath, NamespaceProvider, OverlayError,
    PathError, Provenance, RuntimeError, SymbolTable, UnitFlags, Value, is_identifier,
};
use stratum_registry::{CacheKey, LoadCache, MountMatch, MountRegistry, OverlayMount, Registration};
use tracing::{debug, trace};

use crate::config::ResolverConfig;
use crate::guard::ResolutionGuard;
use crate::loader::{self, Rewrite};
use crate::providers::{Located, ProviderChain};
use crate::vm::Interpreter;

/// A merged namespace: a unit built by layering an override over a base.
pub type MergedNamespace = Arc<DefinitionUnit>;

pub struct Resolver {
    config: ResolverConfig,
    providers: ProviderChain,
    mounts: MountRegistry,
    merged: LoadCache<CacheKey>,
    plain: LoadCache<NamespacePath>,
    guard: ResolutionGuard,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            config,
            providers: ProviderChain::new(),
            mounts: MountRegistry::new(),
            merged: LoadCache::new(),
            plain: LoadCache::new(),
            guard: ResolutionGuard::new(),
        }
    }

    /// Append a provider; earlier providers take precedence.
    pub fn with_provider(mut self, provider: impl NamespaceProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    // =========================================
    // Registration
    // =========================================

    /// Mount `overlay` over `base` at `mount`.
    ///
    /// Registering the same triple again is a no-op. Registering a different
    /// pair at an existing mount root replaces it and drops every namespace
    /// built under the old registration.
    pub fn register(
        &self,
        base: NamespaceHandle,
        overlay: NamespaceHandle,
        mount: NamespaceHandle,
    ) -> Result<(), OverlayError> {
        let overlay_mount = OverlayMount::new(
            registration_path(&base, LayerRole::Base)?,
            registration_path(&overlay, LayerRole::Override)?,
            registration_path(&mount, LayerRole::Mount)?,
        );

        let _hold = self.guard.enter();
        match self.mounts.register(overlay_mount.clone()) {
            Registration::Unchanged => {
                trace!(mount = %overlay_mount.mount, "mount already registered");
            }
            Registration::Added => {
                debug!(%overlay_mount, "registered mount");
            }
            Registration::Replaced(old) => {
                let dropped = self.merged.invalidate_mount(&old.mount);
                debug!(%overlay_mount, replaced = %old, dropped, "replaced mount");
            }
        }
        Ok(())
    }

    /// [`register`](Self::register) from plain names.
    pub fn register_paths(&self, base: &str, overlay: &str, mount: &str) -> Result<(), OverlayError> {
        self.register(
            NamespaceHandle::base(base),
            NamespaceHandle::overlay(overlay),
            NamespaceHandle::mount(mount),
        )
    }

    /// Remove the mount rooted at `mount` and every namespace built under it.
    /// Unknown mounts are ignored.
    pub fn unregister(&self, mount: &NamespaceHandle) {
        let Ok(path) = mount.path() else {
            return;
        };
        let _hold = self.guard.enter();
        if let Some(old) = self.mounts.unregister(&path) {
            let dropped = self.merged.invalidate_mount(&old.mount);
            debug!(mount = %path, dropped, "unregistered mount");
        }
    }

    pub fn list_mounts(&self) -> BTreeSet<NamespacePath> {
        self.mounts.list_mounts()
    }

    /// [`register`](Self::register) followed by [`resolve`](Self::resolve).
    pub fn shim(
        &self,
        base: NamespaceHandle,
        overlay: NamespaceHandle,
        mount: NamespaceHandle,
    ) -> Result<MergedNamespace, OverlayError> {
        self.register(base, overlay, mount.clone())?;
        self.resolve(&mount)
    }

    // =========================================
    // Resolution
    // =========================================

    /// The merged namespace at `mount`, which may be a mount root or any path
    /// below one.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(&self, mount: &NamespaceHandle) -> Result<MergedNamespace, OverlayError> {
        let path = mount.path()?;
        let hit = self
            .mounts
            .find(&path)
            .ok_or(OverlayError::NotMounted { name: path })?;
        self.resolve_match(&hit)
    }

    /// Rebuild the merged namespace at `mount` and swap it into the cache.
    ///
    /// The previous instance is left as it was; namespaces below `mount` are
    /// rebuilt lazily on next access.
    pub fn reload(&self, mount: &NamespaceHandle) -> Result<MergedNamespace, OverlayError> {
        let path = mount.path()?;
        let _hold = self.guard.enter();
        let hit = self
            .mounts
            .find(&path)
            .ok_or_else(|| OverlayError::NotMounted { name: path.clone() })?;
        let key = cache_key(&hit);

        let nested = self
            .merged
            .invalidate_where(|k| k.mount.len() > path.len() && k.mount.starts_with(&path));
        let unit = self.construct_merged(&hit.mount, &key)?;
        if !self.still_mounted(&hit) {
            debug!(mount = %path, "mount changed while reloading, not caching");
            return Ok(unit);
        }
        self.merged.replace(key, unit.clone());
        debug!(mount = %path, nested, "reloaded merged namespace");
        Ok(unit)
    }

    /// Import `name` the way an `import` statement does: every prefix is
    /// loaded and attached to its parent, and the last unit is returned.
    pub fn import(&self, name: &str) -> Result<Arc<DefinitionUnit>, OverlayError> {
        let path = NamespacePath::parse(name)?;
        let chain = self.import_chain(&path)?;
        chain
            .last()
            .cloned()
            .ok_or(OverlayError::NotFound { name: path })
    }

    /// Load every prefix of `path`, binding each unit into its parent's table.
    pub(crate) fn import_chain(&self, path: &NamespacePath) -> Result<Vec<Arc<DefinitionUnit>>, OverlayError> {
        let mut chain: Vec<Arc<DefinitionUnit>> = Vec::with_capacity(path.len());
        for (n, segment) in path.segments().iter().enumerate() {
            let unit = self.load_path(&path.prefix(n + 1))?;
            if let Some(parent) = chain.last()
                && !parent.flags().contains(UnitFlags::WORKING_COPY)
            {
                parent.table().insert(segment.as_str(), Value::Unit(unit.clone()));
            }
            chain.push(unit);
        }
        Ok(chain)
    }

    /// Load one unit by path: a live working copy, a mounted namespace or a
    /// plain one.
    fn load_path(&self, path: &NamespacePath) -> Result<Arc<DefinitionUnit>, OverlayError> {
        if path.is_working_copy()
            && let Some(working) = self.guard.with(|ctx| ctx.working_copy(path.first()))
        {
            if path.len() == 1 {
                return Ok(working);
            }
            let Some(root) = working.provenance().layer_root.as_ref() else {
                return Err(OverlayError::NotFound { name: path.clone() });
            };
            return self.load_path(&root.join(&path.segments()[1..]));
        }
        match self.mounts.find(path) {
            Some(hit) => self.resolve_match(&hit),
            None => self.load_plain(path),
        }
    }

    fn resolve_match(&self, hit: &MountMatch) -> Result<MergedNamespace, OverlayError> {
        let key = cache_key(hit);
        if let Some(unit) = self.merged.get(&key) {
            trace!(mount = %key.mount, "merged cache hit");
            return Ok(unit);
        }

        let _hold = self.guard.enter();
        if !self.still_mounted(hit) {
            return Err(OverlayError::NotMounted { name: key.mount });
        }
        if let Some(unit) = self.merged.get(&key) {
            trace!(mount = %key.mount, "merged cache hit after waiting");
            return Ok(unit);
        }
        if let Some(partial) = self.guard.with(|ctx| ctx.in_progress(&key.mount)) {
            trace!(mount = %key.mount, "returning partially built namespace");
            return Ok(partial);
        }
        let unit = self.construct_merged(&hit.mount, &key)?;
        if !self.still_mounted(hit) {
            debug!(mount = %key.mount, "mount changed during construction, not caching");
            return Ok(unit);
        }
        Ok(self.merged.get_or_insert(key, unit))
    }

    /// Whether the registry still maps `hit`'s path to the same mount.
    fn still_mounted(&self, hit: &MountMatch) -> bool {
        self.mounts.find(&hit.unit_path()).as_ref() == Some(hit)
    }

    /// Build a merged namespace: base phase, working copy, override phase.
    fn construct_merged(&self, mount: &OverlayMount, key: &CacheKey) -> Result<MergedNamespace, OverlayError> {
        self.check_depth(&key.mount)?;
        let base = self.providers.locate(&key.base);
        let overlay = self.providers.locate(&key.override_path);
        if base.is_none() && overlay.is_none() {
            return Err(OverlayError::UnresolvableMount {
                mount: key.mount.clone(),
                base: key.base.clone(),
                override_root: key.override_path.clone(),
            });
        }

        let package = base
            .iter()
            .chain(overlay.iter())
            .any(|layer| layer.entry.is_package);
        let package_flag = if package {
            UnitFlags::PACKAGE
        } else {
            UnitFlags::empty()
        };
        let provenance = Provenance::new(
            format!("merged:{}+{}", key.base, key.override_path),
            UnitFlags::MERGED | package_flag,
        )
        .with_layer_root(mount.mount.clone());
        let unit = Arc::new(DefinitionUnit::new(
            key.mount.clone(),
            provenance,
            SymbolTable::new(),
        ));

        let working_name = key.mount.working_copy_name();
        self.guard
            .with(|ctx| ctx.begin(key.mount.clone(), unit.clone()));
        let merged = self.merge_layers(mount, key, &unit, base.as_ref(), overlay.as_ref(), package_flag);
        self.guard.with(|ctx| {
            ctx.finish(&key.mount);
            ctx.drop_working_copy(&working_name);
        });
        merged?;

        debug!(
            mount = %key.mount,
            base = %key.base,
            override_path = %key.override_path,
            symbols = unit.table().len(),
            "constructed merged namespace"
        );
        Ok(unit)
    }

    fn merge_layers(
        &self,
        mount: &OverlayMount,
        key: &CacheKey,
        unit: &Arc<DefinitionUnit>,
        base: Option<&Located>,
        overlay: Option<&Located>,
        package_flag: UnitFlags,
    ) -> Result<(), OverlayError> {
        let base_rewrite: Rewrite = (mount.base.clone(), mount.mount.clone());
        match base {
            Some(located) => {
                loader::load(self, located, unit, std::slice::from_ref(&base_rewrite))?;
            }
            None => debug!(base = %key.base, "base layer absent, starting empty"),
        }

        let working_path = key.mount.working_copy_path();
        let working = Arc::new(DefinitionUnit::new(
            working_path.clone(),
            Provenance::new(
                format!("working-copy:{}", key.mount),
                UnitFlags::WORKING_COPY | package_flag,
            )
            .with_layer_root(key.mount.clone()),
            unit.table().snapshot(),
        ));
        self.guard.with(|ctx| {
            ctx.add_working_copy(working_path.first().to_string(), working.clone())
        });

        let Some(located) = overlay else {
            debug!(override_path = %key.override_path, "override layer absent");
            return Ok(());
        };
        let override_unit = Arc::new(DefinitionUnit::new(
            key.mount.clone(),
            Provenance::new(located.entry.origin.clone(), package_flag)
                .with_layer_root(mount.override_root.clone()),
            SymbolTable::new(),
        ));
        // Chains re-rooted at the working copy need its name bound even when
        // the override only imported an enclosing namespace.
        override_unit
            .table()
            .insert(working_path.first(), Value::Unit(working));
        let rewrites = [base_rewrite, (key.mount.clone(), working_path)];
        loader::load(self, located, &override_unit, &rewrites)?;

        let copied = unit.table().copy_public_from(override_unit.table());
        trace!(mount = %key.mount, copied, "override symbols applied");
        unit.retain(override_unit);
        Ok(())
    }

    /// Load a namespace straight from the provider chain.
    fn load_plain(&self, path: &NamespacePath) -> Result<Arc<DefinitionUnit>, OverlayError> {
        if let Some(unit) = self.plain.get(path) {
            trace!(unit = %path, "cache hit");
            return Ok(unit);
        }

        let _hold = self.guard.enter();
        if let Some(unit) = self.plain.get(path) {
            return Ok(unit);
        }
        if let Some(partial) = self.guard.with(|ctx| ctx.in_progress(path)) {
            trace!(unit = %path, "returning partially built namespace");
            return Ok(partial);
        }

        let Some(located) = self.providers.locate(path) else {
            if self.mounts.is_mount_ancestor(path) {
                let parent = Arc::new(DefinitionUnit::new(
                    path.clone(),
                    Provenance::new(format!("mount-parent:{path}"), UnitFlags::PACKAGE),
                    SymbolTable::new(),
                ));
                return Ok(self.plain.get_or_insert(path.clone(), parent));
            }
            return Err(OverlayError::NotFound { name: path.clone() });
        };
        self.check_depth(path)?;

        let mut flags = UnitFlags::empty();
        if located.entry.is_package {
            flags |= UnitFlags::PACKAGE;
        }
        if located.provider.get_text(&located.entry).is_none() {
            flags |= UnitFlags::NATIVE;
        }
        let unit = Arc::new(DefinitionUnit::new(
            path.clone(),
            Provenance::new(located.entry.origin.clone(), flags),
            SymbolTable::new(),
        ));

        self.guard.with(|ctx| ctx.begin(path.clone(), unit.clone()));
        let loaded = loader::load(self, &located, &unit, &[]);
        self.guard.with(|ctx| ctx.finish(path));
        let outcome = loaded?;

        debug!(unit = %path, ?outcome, "loaded namespace");
        Ok(self.plain.get_or_insert(path.clone(), unit))
    }

    fn check_depth(&self, name: &NamespacePath) -> Result<(), OverlayError> {
        let limit = self.config.max_depth;
        if self.guard.with(|ctx| ctx.depth()) >= limit {
            return Err(OverlayError::DepthExceeded {
                name: name.clone(),
                limit,
            });
        }
        Ok(())
    }

    // =========================================
    // Attribute access and calls
    // =========================================

    /// Two-tier attribute lookup.
    ///
    /// Tier one reads the unit's table. Tier two applies to packages, merged
    /// namespaces and working copies: `name` is loaded as a sub-namespace
    /// (through a mount when one covers it) and bound into the table, so
    /// sub-namespaces of a mount resolve lazily on first access.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_attr(&self, unit: &Arc<DefinitionUnit>, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = unit.get(name) {
            return Ok(value);
        }
        let no_attribute = || RuntimeError::NoAttribute {
            target: unit.path().to_string(),
            name: name.to_string(),
        };

        let flags = unit.flags();
        let lazy = UnitFlags::PACKAGE | UnitFlags::MERGED | UnitFlags::WORKING_COPY;
        if !flags.intersects(lazy) || !is_identifier(name) {
            return Err(no_attribute());
        }
        let parent = match unit.provenance().layer_root.as_ref() {
            Some(root) if flags.contains(UnitFlags::WORKING_COPY) => root,
            _ => unit.path(),
        };
        let sub_path = parent.child(name);

        match self.load_path(&sub_path) {
            Ok(sub) => {
                if !flags.contains(UnitFlags::WORKING_COPY) {
                    unit.table().insert(name, Value::Unit(sub.clone()));
                    trace!(unit = %unit.path(), name, "bound sub-namespace");
                }
                Ok(Value::Unit(sub))
            }
            Err(OverlayError::NotFound { name: missing }) if missing == sub_path => {
                Err(no_attribute())
            }
            Err(OverlayError::UnresolvableMount { mount, .. }) if mount == sub_path => {
                Err(no_attribute())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Call a function value with `args`.
    pub fn call(&self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        Interpreter::new(self).call_value(callee, args)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .field("mounts", &self.mounts)
            .field("merged", &self.merged.len())
            .field("plain", &self.plain.len())
            .finish()
    }
}

fn cache_key(hit: &MountMatch) -> CacheKey {
    let (base, override_path) = hit.mount.layers_for(&hit.suffix);
    CacheKey::new(base, override_path, hit.unit_path())
}

/// Validate one registration argument.
fn registration_path(handle: &NamespaceHandle, role: LayerRole) -> Result<NamespacePath, OverlayError> {
    if handle.role() != role {
        return Err(OverlayError::InvalidRegistration(format!(
            "expected a {role} handle, got {handle}"
        )));
    }
    handle.path().map_err(|err| match err {
        PathError::Empty => {
            OverlayError::InvalidRegistration(format!("{role} namespace name cannot be empty"))
        }
        other => OverlayError::InvalidRegistration(other.to_string()),
    })
}
