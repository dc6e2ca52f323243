//! Operator semantics.

use std::sync::Arc;

use stratum_core::ir::{BinaryOp, UnaryOp};
use stratum_core::{RuntimeError, Value};

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn overflow() -> RuntimeError {
    RuntimeError::type_error("integer overflow")
}

/// Integer arithmetic with overflow checks, float arithmetic otherwise.
fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int(*a, *b).map(Value::Int).ok_or_else(overflow),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::from(float(a, b))),
            _ => Err(unsupported(op, left, right)),
        },
    }
}

fn too_large(len: usize, times: usize) -> RuntimeError {
    RuntimeError::type_error(format!("cannot repeat a sequence of length {len} {times} times"))
}

fn repeat<T: Clone>(items: &[T], times: i64) -> Result<Vec<T>, RuntimeError> {
    let times = usize::try_from(times).unwrap_or(0);
    let total = items
        .len()
        .checked_mul(times)
        .ok_or_else(|| too_large(items.len(), times))?;
    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| too_large(items.len(), times))?;
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

fn repeat_str(s: &str, times: i64) -> Result<String, RuntimeError> {
    let times = usize::try_from(times).unwrap_or(0);
    let total = s
        .len()
        .checked_mul(times)
        .ok_or_else(|| too_large(s.len(), times))?;
    let mut out = String::new();
    out.try_reserve_exact(total)
        .map_err(|_| too_large(s.len(), times))?;
    for _ in 0..times {
        out.push_str(s);
    }
    Ok(out)
}

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => arithmetic(op, left, right, i64::checked_add, |a, b| a + b),
        },
        BinaryOp::Sub => arithmetic(op, left, right, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => match (left, right) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::str(repeat_str(s, *n)?))
            }
            (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
                Ok(Value::List(Arc::from(repeat(items, *n)?)))
            }
            _ => arithmetic(op, left, right, i64::checked_mul, |a, b| a * b),
        },
        BinaryOp::Div => match (left.as_float(), right.as_float()) {
            (Some(_), Some(b)) if b == 0.0 => Err(RuntimeError::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::from(a / b)),
            _ => Err(unsupported(op, left, right)),
        },
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, left, right),
    }
}

/// The result takes the sign of the divisor.
fn modulo(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => {
            let r = a.checked_rem(*b).ok_or_else(overflow)?;
            Ok(Value::Int(if r != 0 && (r < 0) != (*b < 0) { r + b } else { r }))
        }
        _ => match (left.as_float(), right.as_float()) {
            (Some(_), Some(b)) if b == 0.0 => Err(RuntimeError::DivisionByZero),
            (Some(a), Some(b)) => {
                let r = a % b;
                Ok(Value::from(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
            }
            _ => Err(unsupported(BinaryOp::Mod, left, right)),
        },
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(unsupported(op, left, right)),
        },
    };
    // NaN compares false against everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Int(i) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
            Value::Float(f) => Ok(Value::from(-f.0)),
            other => Err(RuntimeError::type_error(format!(
                "bad operand type for unary -: '{}'",
                other.type_name()
            ))),
        },
    }
}

/// Resolve a possibly negative index against `len`.
fn position(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

pub(crate) fn index(object: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match (object, index) {
        (Value::List(items), Value::Int(i)) => position(*i, items.len())
            .map(|i| items[i].clone())
            .ok_or_else(|| RuntimeError::Index {
                message: format!("list index {i} out of range"),
            }),
        (Value::Str(s), Value::Int(i)) => {
            let count = s.chars().count();
            position(*i, count)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::str(c.to_string()))
                .ok_or_else(|| RuntimeError::Index {
                    message: format!("string index {i} out of range"),
                })
        }
        (Value::Map(_), key) => object.map_get(key).cloned().ok_or_else(|| RuntimeError::Index {
            message: format!("key {} not found", key.repr()),
        }),
        _ => Err(RuntimeError::type_error(format!(
            "'{}' cannot be indexed by '{}'",
            object.type_name(),
            index.type_name()
        ))),
    }
}
