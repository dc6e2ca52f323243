//! Error taxonomy for Stratum.
//!
//! ```text
//! OverlayError (resolver-level, surfaced to callers of resolve/register)
//! ├── NotFound / NotMounted     - a name no provider or mount can supply
//! ├── MalformedUnit             - unparsable unit text (recoverable via fallback)
//! ├── UnresolvableMount         - neither base nor override exists
//! ├── InvalidRegistration       - bad register() arguments
//! ├── InvalidName               - a string that is not a namespace path
//! ├── Bind                      - a native binder failed
//! ├── Execution                 - top-level code of a unit failed (RuntimeError)
//! └── DepthExceeded             - nested resolution ran too deep
//!
//! RuntimeError (evaluator-level)
//! LexError / ParseError / ParseErrors (parser-level)
//! ```

use std::fmt;

use thiserror::Error;

use crate::{NamespacePath, PathError, Span};

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur while tokenizing unit text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of input.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A statement was expected.
    ExpectedStatement,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A dotted namespace path was expected.
    ExpectedPath,
    /// A construct is not allowed where it appears.
    Misplaced,
    /// The lexer rejected the input.
    InvalidSyntax,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedPath => "expected namespace path",
            ParseErrorKind::Misplaced => "misplaced construct",
            ParseErrorKind::InvalidSyntax => "invalid syntax",
        };
        f.write_str(msg)
    }
}

/// A parse error with location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}{}", if message.is_empty() { String::new() } else { format!(": {message}") })]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::InvalidSyntax, err.span(), err.to_string())
    }
}

/// A collection of parse errors from one unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while executing definition-unit code.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("name `{name}` is not defined")]
    UndefinedName { name: String },

    #[error("`{target}` has no attribute `{name}`")]
    NoAttribute { target: String, name: String },

    #[error("value of type `{type_name}` is not callable")]
    NotCallable { type_name: &'static str },

    #[error("`{function}` expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("type error: {message}")]
    Type { message: String },

    #[error("index error: {message}")]
    Index { message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("the namespace defining `{function}` has been dropped")]
    DroppedNamespace { function: String },

    #[error("call depth limit of {limit} exceeded")]
    CallDepth { limit: usize },

    #[error("relative import of level {level} from `{module}` goes beyond the top-level namespace")]
    RelativeImport { module: String, level: u32 },

    #[error("`{function}` failed: {message}")]
    Native { function: String, message: String },

    #[error(transparent)]
    Import(Box<OverlayError>),
}

impl RuntimeError {
    /// Shorthand for a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type {
            message: message.into(),
        }
    }
}

impl From<OverlayError> for RuntimeError {
    fn from(err: OverlayError) -> Self {
        RuntimeError::Import(Box::new(err))
    }
}

// ============================================================================
// Bind Errors
// ============================================================================

/// Errors from a provider's native (pre-bound) form.
#[derive(Debug, Clone, Error)]
pub enum BindError {
    #[error("`{name}` has no native form")]
    NoNativeForm { name: NamespacePath },

    #[error("binding `{name}` failed: {message}")]
    Failed { name: NamespacePath, message: String },
}

// ============================================================================
// Overlay Errors
// ============================================================================

/// Resolver-level errors, surfaced by `register` / `resolve` / `import`.
#[derive(Debug, Clone, Error)]
pub enum OverlayError {
    /// No provider can locate the name.
    #[error("namespace `{name}` not found")]
    NotFound { name: NamespacePath },

    /// `resolve` was asked for a name outside every registered mount.
    #[error("`{name}` is not under any registered mount")]
    NotMounted { name: NamespacePath },

    /// Unit text could not be parsed.
    #[error("malformed definition unit `{name}`: {errors}")]
    MalformedUnit {
        name: NamespacePath,
        errors: ParseErrors,
    },

    /// Neither layer of a mount exists.
    #[error(
        "cannot resolve mount `{mount}`: neither base `{base}` nor override `{override_root}` exists"
    )]
    UnresolvableMount {
        mount: NamespacePath,
        base: NamespacePath,
        override_root: NamespacePath,
    },

    /// Registration arguments were invalid.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// A string is not a valid namespace path.
    #[error("invalid namespace name: {0}")]
    InvalidName(#[from] PathError),

    /// A native binder failed.
    #[error("cannot bind `{name}`: {source}")]
    Bind {
        name: NamespacePath,
        #[source]
        source: BindError,
    },

    /// Top-level code of a unit raised an error.
    #[error("executing `{name}` failed: {source}")]
    Execution {
        name: NamespacePath,
        #[source]
        source: RuntimeError,
    },

    /// Nested resolution exceeded the configured depth.
    #[error("resolving `{name}` exceeded the nesting limit of {limit}")]
    DepthExceeded { name: NamespacePath, limit: usize },
}
