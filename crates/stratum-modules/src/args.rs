//! Argument extraction shared by the native units.

use stratum_core::{RuntimeError, Value};

pub(crate) fn number(function: &str, args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    args.get(index)
        .and_then(Value::as_float)
        .ok_or_else(|| mismatch(function, "number", args.get(index)))
}

pub(crate) fn int(function: &str, args: &[Value], index: usize) -> Result<i64, RuntimeError> {
    args.get(index)
        .and_then(Value::as_int)
        .ok_or_else(|| mismatch(function, "int", args.get(index)))
}

pub(crate) fn string<'a>(
    function: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, RuntimeError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| mismatch(function, "str", args.get(index)))
}

fn mismatch(function: &str, expected: &str, found: Option<&Value>) -> RuntimeError {
    RuntimeError::type_error(format!(
        "{function}() expected {expected}, got {}",
        found.map_or("nothing", Value::type_name)
    ))
}

