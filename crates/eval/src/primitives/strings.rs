//! String operators. Lengths and offsets count Unicode scalar values.

use crate::types::{EvalError, Value};

pub fn concat(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let mut s = a.as_str()?.to_string();
    s.push_str(b.as_str()?);
    Ok(Value::Str(s))
}

pub fn length(s: &Value) -> Result<Value, EvalError> {
    Ok(Value::Nat(s.as_str()?.chars().count() as i64))
}

/// `substring(s, start, len)`, clamped to the bounds of `s`.
pub fn substring(s: &Value, start: &Value, len: &Value) -> Result<Value, EvalError> {
    let s = s.as_str()?;
    let (start, len) = (start.as_nat()?, len.as_nat()?);
    if start < 0 || len < 0 {
        return Err(EvalError::TypeError {
            message: format!("substring bounds must be non-negative, got ({}, {})", start, len),
        });
    }
    Ok(Value::Str(
        s.chars().skip(start as usize).take(len as usize).collect(),
    ))
}

pub fn join(sep: &Value, items: &Value) -> Result<Value, EvalError> {
    let sep = sep.as_str()?;
    let parts: Result<Vec<&str>, _> = items.as_seq()?.iter().map(|v| v.as_str()).collect();
    Ok(Value::Str(parts?.join(sep)))
}

pub fn contains(s: &Value, needle: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(s.as_str()?.contains(needle.as_str()?)))
}

/// Strings pass through unquoted; anything else becomes its structural text.
pub fn to_string(v: &Value) -> Value {
    match v {
        Value::Str(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}
