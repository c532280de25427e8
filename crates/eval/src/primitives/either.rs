//! Sum helpers and error unwrapping.

use crate::types::{EvalError, Value};

pub fn is_left(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::Left(_) => Ok(Value::Bool(true)),
        Value::Right(_) => Ok(Value::Bool(false)),
        other => Err(not_a_sum(other)),
    }
}

pub fn unwrap_left(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::Left(inner) => Ok((**inner).clone()),
        Value::Right(inner) => Err(EvalError::Unwrap {
            message: format!("expected Left, got Right({})", inner),
        }),
        other => Err(not_a_sum(other)),
    }
}

pub fn unwrap_right(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::Right(inner) => Ok((**inner).clone()),
        Value::Left(inner) => Err(EvalError::Unwrap {
            message: format!("expected Right, got Left({})", inner),
        }),
        other => Err(not_a_sum(other)),
    }
}

/// The `message` field of an error record, or the structural text of any
/// other failure value.
pub fn error_message(v: &Value) -> Value {
    let fields = match v {
        Value::Branded { fields, .. } | Value::Record(fields) => Some(fields),
        _ => None,
    };
    match fields.and_then(|f| f.get("message")) {
        Some(Value::Str(message)) => Value::Str(message.clone()),
        _ => Value::Str(v.to_string()),
    }
}

fn not_a_sum(v: &Value) -> EvalError {
    EvalError::TypeError {
        message: format!("expected Left or Right, got {}", v.type_name()),
    }
}
