//! Natural and float arithmetic.
//!
//! Naturals are boxed `i64` with checked arithmetic: overflow and division
//! by zero are errors, never wrap-around. Floats follow IEEE-754 double
//! semantics, so `float_div` by zero yields an infinity. The two kinds are
//! never mixed; conversion goes through `float_of_nat` / `nat_of_float`.

use crate::types::{EvalError, Value};

pub fn nat_arith(
    op: &str,
    a: &Value,
    b: &Value,
    f: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    let (a, b) = (a.as_nat()?, b.as_nat()?);
    f(a, b).map(Value::Nat).ok_or_else(|| EvalError::Overflow {
        message: format!("{}({}, {})", op, a, b),
    })
}

/// Floor division.
pub fn nat_div(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (a, b) = (a.as_nat()?, b.as_nat()?);
    if b == 0 {
        return Err(EvalError::DivisionByZero {
            op: "nat_div".to_string(),
        });
    }
    let q = a.checked_div(b).ok_or_else(|| EvalError::Overflow {
        message: format!("nat_div({}, {})", a, b),
    })?;
    // checked_div truncates toward zero; step down when the signs differ.
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(Value::Nat(q - 1))
    } else {
        Ok(Value::Nat(q))
    }
}

/// Remainder with the sign of the dividend.
pub fn nat_rem(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (a, b) = (a.as_nat()?, b.as_nat()?);
    if b == 0 {
        return Err(EvalError::DivisionByZero {
            op: "nat_rem".to_string(),
        });
    }
    a.checked_rem(b)
        .map(Value::Nat)
        .ok_or_else(|| EvalError::Overflow {
            message: format!("nat_rem({}, {})", a, b),
        })
}

pub fn nat_abs(a: &Value) -> Result<Value, EvalError> {
    let a = a.as_nat()?;
    a.checked_abs()
        .map(Value::Nat)
        .ok_or_else(|| EvalError::Overflow {
            message: format!("nat_abs({})", a),
        })
}

pub fn nat_cmp(
    a: &Value,
    b: &Value,
    pred: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, EvalError> {
    Ok(Value::Bool(pred(a.as_nat()?.cmp(&b.as_nat()?))))
}

pub fn nat_sum(seq: &Value) -> Result<Value, EvalError> {
    let mut total: i64 = 0;
    for item in seq.as_seq()? {
        total = total
            .checked_add(item.as_nat()?)
            .ok_or_else(|| EvalError::Overflow {
                message: "nat_sum".to_string(),
            })?;
    }
    Ok(Value::Nat(total))
}

pub fn float_arith(a: &Value, b: &Value, f: impl Fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Float(f(a.as_float()?, b.as_float()?)))
}

pub fn float_unary(a: &Value, f: impl Fn(f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Float(f(a.as_float()?)))
}

pub fn float_cmp(a: &Value, b: &Value, f: impl Fn(f64, f64) -> bool) -> Result<Value, EvalError> {
    Ok(Value::Bool(f(a.as_float()?, b.as_float()?)))
}

pub fn float_sum(seq: &Value) -> Result<Value, EvalError> {
    let mut total = 0.0;
    for item in seq.as_seq()? {
        total += item.as_float()?;
    }
    Ok(Value::Float(total))
}

/// Arithmetic mean; `0.0` for an empty sequence.
pub fn float_mean(seq: &Value) -> Result<Value, EvalError> {
    let items = seq.as_seq()?;
    if items.is_empty() {
        return Ok(Value::Float(0.0));
    }
    let total = float_sum(seq)?.as_float()?;
    Ok(Value::Float(total / items.len() as f64))
}

/// Truncates toward zero.
pub fn nat_of_float(a: &Value) -> Result<Value, EvalError> {
    let f = a.as_float()?;
    let t = f.trunc();
    if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(EvalError::Overflow {
            message: format!("nat_of_float({})", f),
        });
    }
    Ok(Value::Nat(t as i64))
}
