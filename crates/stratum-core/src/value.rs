//! Runtime values of the definition language.
//!
//! Values are cheap to clone: strings, lists and maps share their storage
//! through `Arc`, and lists and maps are immutable (methods build new values).

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::ir::FunctionProto;
use crate::{DefinitionUnit, NamespacePath, RuntimeError, WeakSymbolTable};

/// Signature of a native function body.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync;

// ============================================================================
// Functions
// ============================================================================

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive range.
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(lo, hi) => write!(f, "{lo} to {hi}"),
        }
    }
}

/// A function implemented in Rust.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    arity: Arity,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<Arc<str>>, arity: Arity, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Check the argument count and invoke the body.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        if !self.arity.accepts(args.len()) {
            return Err(RuntimeError::Arity {
                function: self.name.to_string(),
                expected: self.arity.to_string(),
                found: args.len(),
            });
        }
        (self.func)(args)
    }
}

/// A function defined in a definition unit.
///
/// `globals` is weak: the defining unit's table owns the function, so a strong
/// reference back would form a cycle. Calling a function whose table has been
/// dropped raises [`RuntimeError::DroppedNamespace`].
pub struct ScriptFunction {
    pub name: Arc<str>,
    pub proto: Arc<FunctionProto>,
    pub globals: WeakSymbolTable,
    /// Package relative imports inside the body resolve against.
    pub anchor: Option<NamespacePath>,
    /// Path of the unit the function was executed in.
    pub module: NamespacePath,
}

/// A callable value.
#[derive(Clone)]
pub enum Function {
    Native(NativeFunction),
    Script(Arc<ScriptFunction>),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Native(f) => f.name(),
            Function::Script(f) => &f.name,
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => Arc::ptr_eq(&a.func, &b.func),
            (Function::Script(a), Function::Script(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<NativeFunction> for Function {
    fn from(f: NativeFunction) -> Self {
        Function::Native(f)
    }
}

// ============================================================================
// Values
// ============================================================================

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(Arc<str>),
    List(Arc<[Value]>),
    /// Insertion-ordered key/value pairs.
    Map(Arc<[(Value, Value)]>),
    Function(Function),
    /// A definition unit used as a namespace value.
    Unit(Arc<DefinitionUnit>),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(pairs.into_iter().collect())
    }

    pub fn native(
        name: impl Into<Arc<str>>,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        Value::Function(Function::Native(NativeFunction::new(name, arity, func)))
    }

    /// The language-level type name, as returned by `type_of`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Unit(_) => "namespace",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => f.0 != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(pairs) => !pairs.is_empty(),
            Value::Function(_) | Value::Unit(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(f.0),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&Arc<DefinitionUnit>> {
        match self {
            Value::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Look up `key` in a map value.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Human-readable form, as produced by the `str` builtin.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }

    /// Source-like form, as produced by the `repr` builtin.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&format_float(f.0)),
            Value::Str(s) => write_quoted(out, s),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_repr(out);
                }
                out.push(']');
            }
            Value::Map(pairs) => {
                out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_repr(out);
                    out.push_str(": ");
                    v.write_repr(out);
                }
                out.push('}');
            }
            Value::Function(f) => {
                out.push_str("<fn ");
                out.push_str(f.name());
                out.push('>');
            }
            Value::Unit(unit) => {
                out.push_str("<namespace ");
                out.push_str(&unit.path().to_string());
                out.push('>');
            }
        }
    }
}

/// Floats always show a fractional part or exponent so they read back as floats.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Single quotes unless the text contains a single quote and no double quote.
fn write_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == b.0
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Unit(a), Value::Unit(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(n) => write!(f, "NativeFunction({}/{})", n.name, n.arity),
            Function::Script(s) => write!(f, "ScriptFunction({}.{})", s.module, s.name),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Arc<DefinitionUnit>> for Value {
    fn from(unit: Arc<DefinitionUnit>) -> Self {
        Value::Unit(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_matches_source_forms() {
        let map = Value::map([(Value::from("k"), Value::from("v"))]);
        assert_eq!(map.repr(), "{'k': 'v'}");
        assert_eq!(Value::from(vec![Value::Int(1), Value::Null]).repr(), "[1, null]");
        assert_eq!(Value::from(2.0).repr(), "2.0");
        assert_eq!(Value::from(0.25).repr(), "0.25");
        assert_eq!(Value::from("it's").repr(), "\"it's\"");
        assert_eq!(Value::from("a\nb").repr(), "'a\\nb'");
    }

    #[test]
    fn display_strips_string_quotes() {
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(3), Value::from(3.0));
        assert_ne!(Value::Int(3), Value::from("3"));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(vec![Value::Null]).is_truthy());
        assert!(!Value::map([]).is_truthy());
    }

    #[test]
    fn native_checks_arity() {
        let f = NativeFunction::new("twice", Arity::Exact(1), |args| {
            Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
        });
        assert_eq!(f.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
        let err = f.call(&[]).unwrap_err();
        assert_eq!(err.to_string(), "`twice` expects 1 argument(s), got 0");
    }

    #[test]
    fn function_identity() {
        let f = Function::from(NativeFunction::new("f", Arity::AtLeast(0), |_| Ok(Value::Null)));
        let g = Function::from(NativeFunction::new("f", Arity::AtLeast(0), |_| Ok(Value::Null)));
        assert_eq!(Value::from(f.clone()), Value::from(f.clone()));
        assert_ne!(Value::from(f), Value::from(g));
    }
}
