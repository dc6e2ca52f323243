//! Text unit: string helpers beyond the built-in string methods.

use stratum_core::{Arity, RuntimeError, Value};
use stratum_registry::NativeModule;

use crate::args;

fn repeat(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args::string("repeat", args, 0)?;
    let n = args::int("repeat", args, 1)?;
    Ok(Value::str(s.repeat(usize::try_from(n).unwrap_or(0))))
}

/// `pad_left(s, width[, fill])` / `pad_right(...)`; `fill` defaults to a space.
fn pad(name: &'static str, left: bool) -> impl Fn(&[Value]) -> Result<Value, RuntimeError> {
    move |args| {
        let s = args::string(name, args, 0)?;
        let width = usize::try_from(args::int(name, args, 1)?).unwrap_or(0);
        let fill = match args.get(2) {
            Some(_) => args::string(name, args, 2)?,
            None => " ",
        };
        let mut chars = fill.chars();
        let (Some(fill), None) = (chars.next(), chars.next()) else {
            return Err(RuntimeError::type_error(format!(
                "{name}() fill must be exactly one character"
            )));
        };

        let missing = width.saturating_sub(s.chars().count());
        let padding: String = std::iter::repeat_n(fill, missing).collect();
        Ok(Value::str(if left {
            padding + s
        } else {
            format!("{s}{padding}")
        }))
    }
}

fn capitalize(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args::string("capitalize", args, 0)?;
    let mut chars = s.chars();
    Ok(Value::str(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }))
}

fn reverse(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args::string("reverse", args, 0)?;
    Ok(Value::str(s.chars().rev().collect::<String>()))
}

/// Non-overlapping occurrences of `sub` in `s`.
fn count(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args::string("count", args, 0)?;
    let sub = args::string("count", args, 1)?;
    let n = if sub.is_empty() {
        s.chars().count() + 1
    } else {
        s.matches(sub).count()
    };
    Ok(Value::Int(n as i64))
}

/// Creates the text unit.
pub fn module() -> NativeModule {
    NativeModule::new()
        .function("repeat", Arity::Exact(2), repeat)
        .function("pad_left", Arity::Range(2, 3), pad("pad_left", true))
        .function("pad_right", Arity::Range(2, 3), pad("pad_right", false))
        .function("capitalize", Arity::Exact(1), capitalize)
        .function("reverse", Arity::Exact(1), reverse)
        .function("count", Arity::Exact(2), count)
}

#[cfg(test)]
mod tests {
    use stratum_core::{Function, SymbolTable};

    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let table = SymbolTable::new();
        module().bind_into(&table);
        match table.get(name) {
            Some(Value::Function(Function::Native(f))) => f.call(args),
            other => panic!("{name} is not a native function: {other:?}"),
        }
    }

    #[test]
    fn repeat_and_reverse() {
        assert_eq!(
            call("repeat", &[Value::str("ab"), Value::Int(3)]).unwrap(),
            Value::str("ababab")
        );
        assert_eq!(call("repeat", &[Value::str("ab"), Value::Int(-1)]).unwrap(), Value::str(""));
        assert_eq!(call("reverse", &[Value::str("abc")]).unwrap(), Value::str("cba"));
    }

    #[test]
    fn padding() {
        assert_eq!(
            call("pad_left", &[Value::str("7"), Value::Int(3), Value::str("0")]).unwrap(),
            Value::str("007")
        );
        assert_eq!(
            call("pad_right", &[Value::str("ab"), Value::Int(4)]).unwrap(),
            Value::str("ab  ")
        );
        assert!(call("pad_left", &[Value::str("a"), Value::Int(3), Value::str("xy")]).is_err());
    }

    #[test]
    fn capitalize_and_count() {
        assert_eq!(call("capitalize", &[Value::str("hELLO")]).unwrap(), Value::str("Hello"));
        assert_eq!(
            call("count", &[Value::str("banana"), Value::str("an")]).unwrap(),
            Value::Int(2)
        );
        assert!(call("count", &[Value::Int(1), Value::str("a")]).is_err());
    }
}
