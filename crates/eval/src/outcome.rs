//! Invocation results and their wire form.

use crate::types::{value_to_wire, Value};

/// Terminal state of one `init` or `invoke`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        /// Clause that handled the request (`"init"` for initialisation).
        clause: String,
        response: Value,
        state: Value,
        emit: Vec<Value>,
    },
    Failure(Failure),
}

/// Failure reported through the error channel of a clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// An error-branded `{message}` value, including dispatch errors.
    Error { brand: String, message: String },
    /// Any other failure value, kept as-is.
    Unshaped(Value),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn response(&self) -> Option<&Value> {
        match self {
            Outcome::Success { response, .. } => Some(response),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(f) => Some(f),
            Outcome::Success { .. } => None,
        }
    }

    /// `{"$left": {response, state, emit}}` or `{"$right": <failure>}`.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Outcome::Success {
                response,
                state,
                emit,
                ..
            } => serde_json::json!({
                "$left": {
                    "response": value_to_wire(response),
                    "state": value_to_wire(state),
                    "emit": emit.iter().map(value_to_wire).collect::<Vec<_>>(),
                }
            }),
            Outcome::Failure(f) => serde_json::json!({ "$right": value_to_wire(&f.to_value()) }),
        }
    }
}

impl Failure {
    /// The failure as a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            Failure::Error { brand, message } => {
                Value::branded(brand.as_str(), [("message", Value::text(message.as_str()))])
            }
            Failure::Unshaped(v) => v.clone(),
        }
    }

    /// Human-readable message: the error message, or the structural text
    /// of an unshaped value.
    pub fn message(&self) -> String {
        match self {
            Failure::Error { message, .. } => message.clone(),
            Failure::Unshaped(v) => v.to_string(),
        }
    }
}
