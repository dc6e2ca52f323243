//! Global builtin functions, visible in every unit after its own globals.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use stratum_core::{Arity, RuntimeError, Value};

static BUILTINS: LazyLock<FxHashMap<&'static str, Value>> = LazyLock::new(|| {
    let mut table = FxHashMap::default();
    table.insert("len", Value::native("len", Arity::Exact(1), |args| len(&args[0])));
    table.insert(
        "str",
        Value::native("str", Arity::Exact(1), |args| {
            Ok(Value::str(args[0].to_display_string()))
        }),
    );
    table.insert(
        "repr",
        Value::native("repr", Arity::Exact(1), |args| Ok(Value::str(args[0].repr()))),
    );
    table.insert("int", Value::native("int", Arity::Exact(1), |args| int(&args[0])));
    table.insert("float", Value::native("float", Arity::Exact(1), |args| float(&args[0])));
    table.insert(
        "type_of",
        Value::native("type_of", Arity::Exact(1), |args| {
            Ok(Value::str(args[0].type_name()))
        }),
    );
    table.insert("range", Value::native("range", Arity::Range(1, 2), range));
    table
});

/// Look up a builtin by name.
pub(crate) fn lookup(name: &str) -> Option<Value> {
    BUILTINS.get(name).cloned()
}

pub(crate) fn len(value: &Value) -> Result<Value, RuntimeError> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(pairs) => pairs.len(),
        other => {
            return Err(RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(n as i64))
}

fn int(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.0.is_finite() => Ok(Value::Int(f.0.trunc() as i64)),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            RuntimeError::type_error(format!("invalid literal for int(): {}", value.repr()))
        }),
        other => Err(RuntimeError::type_error(format!(
            "cannot convert {} to int",
            other.repr()
        ))),
    }
}

fn float(value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().map(Value::from).map_err(|_| {
            RuntimeError::type_error(format!("invalid literal for float(): {}", value.repr()))
        }),
        Value::Bool(b) => Ok(Value::from(f64::from(u8::from(*b)))),
        other => other.as_float().map(Value::from).ok_or_else(|| {
            RuntimeError::type_error(format!("cannot convert {} to float", other.repr()))
        }),
    }
}

fn range(args: &[Value]) -> Result<Value, RuntimeError> {
    let bound = |v: &Value| {
        v.as_int().ok_or_else(|| {
            RuntimeError::type_error(format!("range() expects int, got '{}'", v.type_name()))
        })
    };
    let (start, end) = match args {
        [end] => (0, bound(end)?),
        [start, end] => (bound(start)?, bound(end)?),
        _ => (0, 0),
    };
    Ok(Value::list((start..end).map(Value::Int)))
}
