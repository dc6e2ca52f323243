//! Math unit providing constants and functions.
//!
//! `import math; math.sqrt(2.0)`, `math.PI`, etc.

use stratum_core::{Arity, RuntimeError, Value};
use stratum_registry::NativeModule;

use crate::args;

// =============================================================================
// FUNCTIONS
// =============================================================================

/// `sqrt(x)`; negative input is an error.
fn sqrt(args: &[Value]) -> Result<Value, RuntimeError> {
    let x = args::number("sqrt", args, 0)?;
    if x < 0.0 {
        return Err(RuntimeError::Native {
            function: "sqrt".into(),
            message: "math domain error".into(),
        });
    }
    Ok(Value::from(x.sqrt()))
}

/// `pow(x, y)`: integral when both operands are ints and `y >= 0`.
fn pow(args: &[Value]) -> Result<Value, RuntimeError> {
    if let (Value::Int(base), Value::Int(exp)) = (&args[0], &args[1]) {
        if let Some(result) = u32::try_from(*exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
        {
            return Ok(Value::Int(result));
        }
    }
    let x = args::number("pow", args, 0)?;
    let y = args::number("pow", args, 1)?;
    Ok(Value::from(x.powf(y)))
}

fn abs(args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Native {
                function: "abs".into(),
                message: "integer overflow".into(),
            }),
        _ => Ok(Value::from(args::number("abs", args, 0)?.abs())),
    }
}

/// Rounding functions return ints, like their counterparts in most scripting
/// languages.
fn rounding(name: &'static str, op: fn(f64) -> f64) -> impl Fn(&[Value]) -> Result<Value, RuntimeError> {
    move |args| {
        if let Value::Int(i) = args[0] {
            return Ok(Value::Int(i));
        }
        let x = op(args::number(name, args, 0)?);
        if !x.is_finite() || x < i64::MIN as f64 || x > i64::MAX as f64 {
            return Err(RuntimeError::Native {
                function: name.into(),
                message: format!("cannot convert {x} to int"),
            });
        }
        Ok(Value::Int(x as i64))
    }
}

/// `min`/`max` over one or more numbers, returning the winning argument
/// unchanged.
fn extremum(
    name: &'static str,
    prefer: fn(f64, f64) -> bool,
) -> impl Fn(&[Value]) -> Result<Value, RuntimeError> {
    move |args| {
        let items: Vec<Value> = match args {
            [Value::List(items)] => items.to_vec(),
            _ => args.to_vec(),
        };
        let mut best: Option<(f64, Value)> = None;
        for (i, item) in items.iter().enumerate() {
            let x = args::number(name, &items, i)?;
            if best.as_ref().is_none_or(|(b, _)| prefer(x, *b)) {
                best = Some((x, item.clone()));
            }
        }
        best.map(|(_, v)| v).ok_or_else(|| RuntimeError::Native {
            function: name.into(),
            message: "expected at least one value".into(),
        })
    }
}

fn unary(name: &'static str, op: fn(f64) -> f64) -> impl Fn(&[Value]) -> Result<Value, RuntimeError> {
    move |args| Ok(Value::from(op(args::number(name, args, 0)?)))
}

// =============================================================================
// MODULE CREATION
// =============================================================================

/// Creates the math unit.
pub fn module() -> NativeModule {
    NativeModule::new()
        .constant("PI", Value::from(std::f64::consts::PI))
        .constant("E", Value::from(std::f64::consts::E))
        .constant("TAU", Value::from(std::f64::consts::TAU))
        .constant("INFINITY", Value::from(f64::INFINITY))
        // Power and root
        .function("sqrt", Arity::Exact(1), sqrt)
        .function("pow", Arity::Exact(2), pow)
        .function("exp", Arity::Exact(1), unary("exp", f64::exp))
        .function("ln", Arity::Exact(1), unary("ln", f64::ln))
        // Trigonometric
        .function("sin", Arity::Exact(1), unary("sin", f64::sin))
        .function("cos", Arity::Exact(1), unary("cos", f64::cos))
        .function("tan", Arity::Exact(1), unary("tan", f64::tan))
        // Rounding
        .function("floor", Arity::Exact(1), rounding("floor", f64::floor))
        .function("ceil", Arity::Exact(1), rounding("ceil", f64::ceil))
        .function("round", Arity::Exact(1), rounding("round", f64::round))
        // Absolute value, min/max
        .function("abs", Arity::Exact(1), abs)
        .function("min", Arity::AtLeast(1), extremum("min", |a, b| a < b))
        .function("max", Arity::AtLeast(1), extremum("max", |a, b| a > b))
}

#[cfg(test)]
mod tests {
    use stratum_core::SymbolTable;

    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let table = SymbolTable::new();
        module().bind_into(&table);
        match table.get(name) {
            Some(Value::Function(stratum_core::Function::Native(f))) => f.call(args),
            other => panic!("{name} is not a native function: {other:?}"),
        }
    }

    #[test]
    fn test_module_creates() {
        let m = module();
        assert!(m.names().any(|n| n == "PI"));
        assert!(m.names().any(|n| n == "sqrt"));
    }

    #[test]
    fn sqrt_and_domain_error() {
        assert_eq!(call("sqrt", &[Value::Int(9)]).unwrap(), Value::from(3.0));
        assert!(call("sqrt", &[Value::Int(-1)]).is_err());
        assert!(call("sqrt", &[Value::str("x")]).is_err());
    }

    #[test]
    fn pow_keeps_ints() {
        assert_eq!(call("pow", &[Value::Int(2), Value::Int(10)]).unwrap(), Value::Int(1024));
        assert_eq!(
            call("pow", &[Value::Int(2), Value::Int(-1)]).unwrap(),
            Value::from(0.5)
        );
    }

    #[test]
    fn rounding_returns_ints() {
        assert_eq!(call("floor", &[Value::from(2.7)]).unwrap(), Value::Int(2));
        assert_eq!(call("ceil", &[Value::from(2.1)]).unwrap(), Value::Int(3));
        assert_eq!(call("round", &[Value::Int(5)]).unwrap(), Value::Int(5));
        assert!(call("floor", &[Value::from(f64::INFINITY)]).is_err());
    }

    #[test]
    fn min_max_return_original_values() {
        let args = [Value::Int(3), Value::from(1.5), Value::Int(2)];
        assert_eq!(call("min", &args).unwrap(), Value::from(1.5));
        assert_eq!(call("max", &args).unwrap(), Value::Int(3));
        let list = Value::list([Value::Int(4), Value::Int(9)]);
        assert_eq!(call("max", &[list]).unwrap(), Value::Int(9));
        assert!(call("max", &[Value::list([])]).is_err());
    }

    #[test]
    fn abs_int_and_float() {
        assert_eq!(call("abs", &[Value::Int(-4)]).unwrap(), Value::Int(4));
        assert_eq!(call("abs", &[Value::from(-0.5)]).unwrap(), Value::from(0.5));
        assert!(call("abs", &[Value::Int(i64::MIN)]).is_err());
    }
}
