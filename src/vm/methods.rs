//! Builtin methods on strings, lists and maps.
//!
//! Lists and maps are immutable values: `append` and `insert` return a new
//! value and leave the receiver untouched.

use std::sync::Arc;

use stratum_core::{Arity, RuntimeError, Value};

use super::builtins;

fn check(receiver: &Value, method: &str, arity: Arity, args: &[Value]) -> Result<(), RuntimeError> {
    if arity.accepts(args.len()) {
        Ok(())
    } else {
        Err(RuntimeError::Arity {
            function: format!("{}.{method}", receiver.type_name()),
            expected: arity.to_string(),
            found: args.len(),
        })
    }
}

fn str_arg<'a>(method: &str, value: &'a Value) -> Result<&'a str, RuntimeError> {
    value.as_str().ok_or_else(|| {
        RuntimeError::type_error(format!(
            "{method}() expects str, got '{}'",
            value.type_name()
        ))
    })
}

fn no_method(receiver: &Value, method: &str) -> RuntimeError {
    RuntimeError::NoAttribute {
        target: receiver.type_name().to_string(),
        name: method.to_string(),
    }
}

/// Call `method` on a non-namespace `receiver`.
pub(crate) fn call_method(
    receiver: &Value,
    method: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    match receiver {
        Value::Str(s) => str_method(receiver, s, method, args),
        Value::List(items) => list_method(receiver, items, method, args),
        Value::Map(pairs) => map_method(receiver, pairs, method, args),
        _ => Err(no_method(receiver, method)),
    }
}

fn str_method(receiver: &Value, s: &str, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let value = match method {
        "replace" => {
            check(receiver, method, Arity::Exact(2), args)?;
            let from = str_arg(method, &args[0])?;
            let to = str_arg(method, &args[1])?;
            Value::str(s.replace(from, to))
        }
        "upper" => {
            check(receiver, method, Arity::Exact(0), args)?;
            Value::str(s.to_uppercase())
        }
        "lower" => {
            check(receiver, method, Arity::Exact(0), args)?;
            Value::str(s.to_lowercase())
        }
        "trim" => {
            check(receiver, method, Arity::Exact(0), args)?;
            Value::str(s.trim())
        }
        "split" => {
            check(receiver, method, Arity::Range(0, 1), args)?;
            match args.first() {
                Some(sep) => {
                    let sep = str_arg(method, sep)?;
                    if sep.is_empty() {
                        return Err(RuntimeError::type_error("split() separator cannot be empty"));
                    }
                    Value::list(s.split(sep).map(Value::str))
                }
                None => Value::list(s.split_whitespace().map(Value::str)),
            }
        }
        "join" => {
            check(receiver, method, Arity::Exact(1), args)?;
            let Value::List(items) = &args[0] else {
                return Err(RuntimeError::type_error(format!(
                    "join() expects list, got '{}'",
                    args[0].type_name()
                )));
            };
            let parts = items
                .iter()
                .map(|item| str_arg(method, item))
                .collect::<Result<Vec<_>, _>>()?;
            Value::str(parts.join(s))
        }
        "starts_with" => {
            check(receiver, method, Arity::Exact(1), args)?;
            Value::Bool(s.starts_with(str_arg(method, &args[0])?))
        }
        "ends_with" => {
            check(receiver, method, Arity::Exact(1), args)?;
            Value::Bool(s.ends_with(str_arg(method, &args[0])?))
        }
        "contains" => {
            check(receiver, method, Arity::Exact(1), args)?;
            Value::Bool(s.contains(str_arg(method, &args[0])?))
        }
        "len" => {
            check(receiver, method, Arity::Exact(0), args)?;
            builtins::len(receiver)?
        }
        _ => return Err(no_method(receiver, method)),
    };
    Ok(value)
}

fn list_method(
    receiver: &Value,
    items: &Arc<[Value]>,
    method: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let value = match method {
        "len" => {
            check(receiver, method, Arity::Exact(0), args)?;
            builtins::len(receiver)?
        }
        "contains" => {
            check(receiver, method, Arity::Exact(1), args)?;
            Value::Bool(items.contains(&args[0]))
        }
        "append" => {
            check(receiver, method, Arity::Exact(1), args)?;
            Value::list(items.iter().cloned().chain(std::iter::once(args[0].clone())))
        }
        _ => return Err(no_method(receiver, method)),
    };
    Ok(value)
}

fn map_method(
    receiver: &Value,
    pairs: &Arc<[(Value, Value)]>,
    method: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let value = match method {
        "len" => {
            check(receiver, method, Arity::Exact(0), args)?;
            builtins::len(receiver)?
        }
        "get" => {
            check(receiver, method, Arity::Range(1, 2), args)?;
            receiver
                .map_get(&args[0])
                .cloned()
                .unwrap_or_else(|| args.get(1).cloned().unwrap_or_default())
        }
        "contains" => {
            check(receiver, method, Arity::Exact(1), args)?;
            Value::Bool(receiver.map_get(&args[0]).is_some())
        }
        "keys" => {
            check(receiver, method, Arity::Exact(0), args)?;
            Value::list(pairs.iter().map(|(k, _)| k.clone()))
        }
        "values" => {
            check(receiver, method, Arity::Exact(0), args)?;
            Value::list(pairs.iter().map(|(_, v)| v.clone()))
        }
        "insert" => {
            check(receiver, method, Arity::Exact(2), args)?;
            let (key, value) = (&args[0], &args[1]);
            let mut out: Vec<(Value, Value)> = pairs.to_vec();
            match out.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => out.push((key.clone(), value.clone())),
            }
            Value::map(out)
        }
        _ => return Err(no_method(receiver, method)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::str(text)
    }

    #[test]
    fn string_methods() {
        assert_eq!(call_method(&s("a\"b\""), "replace", &[s("\""), s("'")]).unwrap(), s("a'b'"));
        assert_eq!(call_method(&s("Ab"), "upper", &[]).unwrap(), s("AB"));
        assert_eq!(
            call_method(&s("a,b"), "split", &[s(",")]).unwrap(),
            Value::list([s("a"), s("b")])
        );
        assert_eq!(
            call_method(&s("-"), "join", &[Value::list([s("a"), s("b")])]).unwrap(),
            s("a-b")
        );
        assert_eq!(call_method(&s("  x "), "trim", &[]).unwrap(), s("x"));
        assert_eq!(call_method(&s("abc"), "starts_with", &[s("ab")]).unwrap(), Value::Bool(true));
        assert_eq!(call_method(&s("abc"), "len", &[]).unwrap(), Value::Int(3));
    }

    #[test]
    fn list_methods_return_new_values() {
        let list = Value::list([Value::Int(1)]);
        let appended = call_method(&list, "append", &[Value::Int(2)]).unwrap();
        assert_eq!(appended, Value::list([Value::Int(1), Value::Int(2)]));
        assert_eq!(list, Value::list([Value::Int(1)]));
        assert_eq!(call_method(&list, "contains", &[Value::Int(1)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn map_methods() {
        let map = Value::map([(s("a"), Value::Int(1))]);
        assert_eq!(call_method(&map, "get", &[s("a")]).unwrap(), Value::Int(1));
        assert_eq!(call_method(&map, "get", &[s("b"), Value::Int(0)]).unwrap(), Value::Int(0));
        assert_eq!(call_method(&map, "get", &[s("b")]).unwrap(), Value::Null);

        let inserted = call_method(&map, "insert", &[s("a"), Value::Int(2)]).unwrap();
        assert_eq!(inserted, Value::map([(s("a"), Value::Int(2))]));
        let grown = call_method(&map, "insert", &[s("b"), Value::Int(3)]).unwrap();
        assert_eq!(call_method(&grown, "keys", &[]).unwrap(), Value::list([s("a"), s("b")]));
    }

    #[test]
    fn bad_calls() {
        assert!(matches!(
            call_method(&s("x"), "nope", &[]),
            Err(RuntimeError::NoAttribute { .. })
        ));
        assert!(matches!(
            call_method(&s("x"), "upper", &[s("y")]),
            Err(RuntimeError::Arity { .. })
        ));
        assert!(call_method(&Value::Int(1), "len", &[]).is_err());
    }
}
