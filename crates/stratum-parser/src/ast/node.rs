//! Leaf nodes shared by expressions and statements.

use std::fmt;

use stratum_core::Span;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    #[inline]
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The namespace path of an import statement: `a.b`, `.sib`, `..`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportPath<'ast> {
    /// Number of leading dots; zero for absolute paths.
    pub level: u32,
    /// May be empty only when `level > 0` (`from . import x`).
    pub segments: &'ast [Ident<'ast>],
    pub span: Span,
}

impl<'ast> ImportPath<'ast> {
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }

    /// Segment names, outermost first.
    pub fn names(&self) -> impl Iterator<Item = &'ast str> + '_ {
        self.segments.iter().map(|s| s.name)
    }
}

impl fmt::Display for ImportPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.level {
            f.write_str(".")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(seg.name)?;
        }
        Ok(())
    }
}
