//! Accord clause execution engine -- accepts a compiled-logic interchange
//! bundle plus contract parameters, state and a request, and produces a
//! response with updated state and emitted events, or a failure.
//!
//! The engine consumes interchange JSON (never contract source text),
//! dispatches the request on its brand, and evaluates the selected
//! clause's expression tree over a structurally tagged value model.
//! Evaluation is deterministic and side-effect free: `now` is an input
//! and nothing is read from the environment.

pub mod compare;
pub mod config;
pub mod engine;
pub mod expr;
pub mod outcome;
pub mod primitives;
pub mod registry;
pub mod types;

pub use config::{EngineConfig, Subtyping};
pub use engine::{Engine, Invocation, Phase, DISPATCH_ERROR};
pub use outcome::{Failure, Outcome};
pub use registry::BrandRegistry;
pub use types::{value_to_wire, ContractLogic, EvalError, Expr, Value};

/// Initialise a contract from wire JSON.
///
/// `input` is `{contract, now}`. Runs with the default [`EngineConfig`].
pub fn init(bundle: &serde_json::Value, input: &serde_json::Value) -> Result<Outcome, EvalError> {
    let engine = Engine::from_interchange(bundle, EngineConfig::default())?;
    let contract = match input.get("contract") {
        Some(c) => Value::from_wire(c)?,
        None => {
            return Err(EvalError::DeserializeError {
                message: "init input missing 'contract'".to_string(),
            })
        }
    };
    let now = engine::read_now(input)?;
    engine.init(&contract, &now)
}

/// Run one request from wire JSON.
///
/// `input` is `{contract, state, emit, request, now}`; `state` defaults to
/// unit and `emit` to the empty sequence. Runs with the default
/// [`EngineConfig`].
pub fn invoke(bundle: &serde_json::Value, input: &serde_json::Value) -> Result<Outcome, EvalError> {
    let engine = Engine::from_interchange(bundle, EngineConfig::default())?;
    let invocation = Invocation::from_wire(input)?;
    engine.invoke(&invocation)
}
