//! JSON unit: `dumps(value)` and `loads(text)`.
//!
//! `dumps` separates items with `", "` and keys from values with `": "`, so
//! `dumps({"k": "v"})` is `{"k": "v"}`. Map keys keep insertion order.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use stratum_core::{Arity, RuntimeError, Value};
use stratum_registry::NativeModule;

use crate::args;

// =============================================================================
// ENCODING
// =============================================================================

/// Compact output with a space after every separator.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn encode_error(message: impl Into<String>) -> RuntimeError {
    RuntimeError::Native {
        function: "dumps".into(),
        message: message.into(),
    }
}

fn to_json(value: &Value) -> Result<serde_json::Value, RuntimeError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(f.0)
            .map(serde_json::Value::Number)
            .ok_or_else(|| encode_error(format!("{} is not JSON compliant", value.repr())))?,
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect::<Result<_, _>>()?)
        }
        Value::Map(pairs) => {
            let mut object = serde_json::Map::with_capacity(pairs.len());
            for (key, item) in pairs.iter() {
                object.insert(object_key(key)?, to_json(item)?);
            }
            serde_json::Value::Object(object)
        }
        Value::Function(_) | Value::Unit(_) => {
            return Err(encode_error(format!(
                "object of type {} is not JSON serializable",
                value.type_name()
            )));
        }
    })
}

/// Scalars are accepted as keys and converted to strings.
fn object_key(key: &Value) -> Result<String, RuntimeError> {
    match key {
        Value::Str(s) => Ok(s.to_string()),
        Value::Null => Ok("null".into()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(_) | Value::Float(_) => Ok(key.repr()),
        other => Err(encode_error(format!(
            "keys must be str, int, float, bool or null, not {}",
            other.type_name()
        ))),
    }
}

/// Encode `value` as JSON text.
pub fn dumps(value: &Value) -> Result<String, RuntimeError> {
    let json = to_json(value)?;
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    json.serialize(&mut serializer)
        .map_err(|err| encode_error(err.to_string()))?;
    String::from_utf8(out).map_err(|err| encode_error(err.to_string()))
}

// =============================================================================
// DECODING
// =============================================================================

fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => Value::list(items.into_iter().map(from_json)),
        serde_json::Value::Object(object) => Value::map(
            object
                .into_iter()
                .map(|(key, item)| (Value::str(key), from_json(item))),
        ),
    }
}

/// Decode JSON text.
pub fn loads(text: &str) -> Result<Value, RuntimeError> {
    serde_json::from_str(text)
        .map(from_json)
        .map_err(|err| RuntimeError::Native {
            function: "loads".into(),
            message: err.to_string(),
        })
}

// =============================================================================
// MODULE CREATION
// =============================================================================

/// Creates the json unit.
pub fn module() -> NativeModule {
    NativeModule::new()
        .function("dumps", Arity::Exact(1), |args| dumps(&args[0]).map(Value::str))
        .function("loads", Arity::Exact(1), |args| {
            loads(args::string("loads", args, 0)?)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumps_spaces_separators() {
        let value = Value::map([(Value::str("k"), Value::str("v"))]);
        assert_eq!(dumps(&value).unwrap(), r#"{"k": "v"}"#);

        let value = Value::list([Value::Int(1), Value::from(2.0), Value::Null, Value::Bool(true)]);
        assert_eq!(dumps(&value).unwrap(), "[1, 2.0, null, true]");
    }

    #[test]
    fn dumps_keeps_insertion_order() {
        let value = Value::map([
            (Value::str("z"), Value::Int(1)),
            (Value::str("a"), Value::list([])),
        ]);
        assert_eq!(dumps(&value).unwrap(), r#"{"z": 1, "a": []}"#);
    }

    #[test]
    fn dumps_escapes_strings() {
        assert_eq!(dumps(&Value::str("say \"hi\"\n")).unwrap(), r#""say \"hi\"\n""#);
    }

    #[test]
    fn dumps_converts_scalar_keys() {
        let value = Value::map([(Value::Int(1), Value::Null), (Value::Bool(false), Value::Null)]);
        assert_eq!(dumps(&value).unwrap(), r#"{"1": null, "false": null}"#);
    }

    #[test]
    fn dumps_rejects_functions_and_nan() {
        let f = Value::native("f", Arity::Exact(0), |_| Ok(Value::Null));
        assert!(dumps(&f).is_err());
        assert!(dumps(&Value::from(f64::NAN)).is_err());
    }

    #[test]
    fn loads_builds_values() {
        let value = loads(r#"{"a": [1, 2.5, "x"], "b": null}"#).unwrap();
        assert_eq!(
            value.map_get(&Value::str("a")),
            Some(&Value::list([Value::Int(1), Value::from(2.5), Value::str("x")]))
        );
        assert_eq!(value.map_get(&Value::str("b")), Some(&Value::Null));
        assert!(loads("{").is_err());
    }
}
