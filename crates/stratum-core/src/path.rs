use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use xxhash_rust::xxh64::xxh64;

/// Seed for working-copy name hashing. Keeps the synthetic names distinct from
/// any other xxh64 use of the same path text.
const WORKING_COPY_SEED: u64 = 0x5d3a_91c4_e07b_2f18;

/// Errors produced when a string is not a valid hierarchical name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The name was empty (or only dots).
    #[error("namespace path cannot be empty")]
    Empty,

    /// One dot-separated segment is not an identifier.
    #[error("invalid segment `{segment}` in namespace path `{path}`")]
    InvalidSegment { path: String, segment: String },
}

/// Hierarchical, dot-separated, case-sensitive namespace name.
///
/// Never empty: every path has at least one segment, and every segment is an
/// identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// # Examples
///
/// ```
/// use stratum_core::NamespacePath;
///
/// let path = NamespacePath::parse("json.decoder").unwrap();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "json.decoder");
///
/// let root = NamespacePath::parse("json").unwrap();
/// let mount = NamespacePath::parse("json_sq").unwrap();
/// assert_eq!(path.reroot(&root, &mount).unwrap().to_string(), "json_sq.decoder");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacePath {
    segments: Vec<String>,
}

impl NamespacePath {
    /// Parse a dotted name such as `"pkg.sub.unit"`.
    pub fn parse(name: &str) -> Result<Self, PathError> {
        if name.trim().is_empty() {
            return Err(PathError::Empty);
        }
        Self::from_segments(name.split('.')).map_err(|err| match err {
            PathError::InvalidSegment { segment, .. } => PathError::InvalidSegment {
                path: name.to_string(),
                segment,
            },
            other => other,
        })
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(PathError::InvalidSegment {
                path: segments.join("."),
                segment: bad.clone(),
            });
        }
        Ok(Self { segments })
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Paths are never empty; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The outermost segment.
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The innermost segment (the unit's local name).
    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The enclosing path, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// The first `n` segments of this path. `n` is clamped to `1..=len`.
    pub fn prefix(&self, n: usize) -> Self {
        let n = n.clamp(1, self.segments.len());
        Self {
            segments: self.segments[..n].to_vec(),
        }
    }

    /// Append one segment.
    ///
    /// The caller guarantees `name` is an identifier; names reaching this point
    /// come from parsed source or from already validated paths.
    pub fn child(&self, name: &str) -> Self {
        debug_assert!(is_identifier(name), "invalid path segment {name:?}");
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Append a (possibly empty) suffix.
    pub fn join<S: AsRef<str>>(&self, suffix: &[S]) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(suffix.iter().map(|s| s.as_ref().to_string()));
        Self { segments }
    }

    /// Whether `self` is `root` or a strict dotted descendant of it.
    ///
    /// Matching is segment-wise: `json2` is not under `json`.
    pub fn starts_with(&self, root: &NamespacePath) -> bool {
        self.strip_root(root).is_some()
    }

    /// The suffix of `self` below `root`, if `self` is `root` or a descendant.
    pub fn strip_root(&self, root: &NamespacePath) -> Option<&[String]> {
        strip_segments(&self.segments, root.segments())
    }

    /// Whether this path is the leading chain of `chain` (segment-wise).
    pub fn is_prefix_of<S: AsRef<str>>(&self, chain: &[S]) -> bool {
        strip_segments(chain, &self.segments).is_some()
    }

    /// Replace the leading `search` chain with `replace`.
    ///
    /// Returns `None` when `self` is not under `search`.
    pub fn reroot(&self, search: &NamespacePath, replace: &NamespacePath) -> Option<Self> {
        self.strip_root(search).map(|suffix| replace.join(suffix))
    }

    /// Synthetic, private, single-segment name for the working copy of this unit.
    ///
    /// Deterministic: the same path always produces the same name.
    pub fn working_copy_name(&self) -> String {
        let hash = xxh64(self.to_string().as_bytes(), WORKING_COPY_SEED);
        format!("_wc_{hash:016x}")
    }

    /// [`working_copy_name`](Self::working_copy_name) as a single-segment path.
    pub fn working_copy_path(&self) -> Self {
        Self {
            segments: vec![self.working_copy_name()],
        }
    }

    /// Whether this path starts with a working-copy segment.
    pub fn is_working_copy(&self) -> bool {
        self.first().starts_with("_wc_")
    }
}

/// Segment-wise prefix strip used by paths and by the rewriter's chains.
pub(crate) fn strip_segments<'a, S: AsRef<str>>(
    segments: &'a [S],
    root: &[String],
) -> Option<&'a [S]> {
    if segments.len() < root.len() {
        return None;
    }
    let matches = segments
        .iter()
        .zip(root)
        .all(|(seg, r)| seg.as_ref() == r.as_str());
    matches.then(|| &segments[root.len()..])
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for NamespacePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `name` is a valid identifier segment.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Names with a leading underscore are private by convention and never cross
/// layers.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

// ============================================================================
// Handles
// ============================================================================

/// The role a hierarchical name plays in an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// The namespace being extended.
    Base,
    /// The namespace supplying replacement symbols.
    Override,
    /// The virtual merged namespace.
    Mount,
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerRole::Base => "base",
            LayerRole::Override => "override",
            LayerRole::Mount => "mount",
        };
        f.write_str(name)
    }
}

/// A hierarchical name tagged with the role it plays.
///
/// Handles keep the raw name so that invalid input is reported by whoever
/// consumes the handle (registration raises `InvalidRegistration` there).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceHandle {
    role: LayerRole,
    name: Arc<str>,
}

impl NamespaceHandle {
    /// Create a handle with an explicit role.
    pub fn new(role: LayerRole, name: impl AsRef<str>) -> Self {
        Self {
            role,
            name: Arc::from(name.as_ref()),
        }
    }

    /// Handle for a base layer.
    pub fn base(name: impl AsRef<str>) -> Self {
        Self::new(LayerRole::Base, name)
    }

    /// Handle for an override layer.
    pub fn overlay(name: impl AsRef<str>) -> Self {
        Self::new(LayerRole::Override, name)
    }

    /// Handle for a mount point.
    pub fn mount(name: impl AsRef<str>) -> Self {
        Self::new(LayerRole::Mount, name)
    }

    /// Handle for an already validated path.
    pub fn from_path(role: LayerRole, path: &NamespacePath) -> Self {
        Self::new(role, path.to_string())
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    /// The raw name as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate and parse the name.
    pub fn path(&self) -> Result<NamespacePath, PathError> {
        NamespacePath::parse(&self.name)
    }
}

impl fmt::Display for NamespaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.role, self.name)
    }
}
