//! Native units: symbols bound directly by Rust code.

use std::fmt;
use std::sync::Arc;

use stratum_core::{Arity, RuntimeError, SymbolTable, Value};

/// Builder for a native unit.
///
/// # Example
///
/// ```
/// use stratum_core::{Arity, SymbolTable, Value};
/// use stratum_registry::NativeModule;
///
/// let module = NativeModule::new()
///     .constant("VERSION", Value::Int(2))
///     .function("twice", Arity::Exact(1), |args| match &args[0] {
///         Value::Int(i) => Ok(Value::Int(i * 2)),
///         other => Err(stratum_core::RuntimeError::type_error(format!(
///             "expected int, got {}",
///             other.type_name()
///         ))),
///     });
///
/// let table = SymbolTable::new();
/// module.bind_into(&table);
/// assert_eq!(table.get("VERSION"), Some(Value::Int(2)));
/// ```
#[derive(Clone, Default)]
pub struct NativeModule {
    symbols: Vec<(Arc<str>, Value)>,
}

impl NativeModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant.
    pub fn constant(mut self, name: impl Into<Arc<str>>, value: Value) -> Self {
        self.symbols.push((name.into(), value));
        self
    }

    /// Add a native function.
    pub fn function<F>(mut self, name: &str, arity: Arity, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.symbols
            .push((Arc::from(name), Value::native(name, arity, func)));
        self
    }

    /// Names this module defines, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|(name, _)| name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Insert every symbol into `table`; later definitions of a name win.
    pub fn bind_into(&self, table: &SymbolTable) {
        for (name, value) in &self.symbols {
            table.insert(name.as_ref(), value.clone());
        }
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
