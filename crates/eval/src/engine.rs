//! Clause dispatch and the engine entry points.
//!
//! One invocation moves through `Initial` -> `Dispatching` -> `Evaluating`
//! and ends in `Succeeded` or `Failed`. Dispatch casts the request against
//! each clause's request brand in declaration order and runs the first
//! clause that accepts it.
//!
//! An [`Engine`] is immutable once built. Concurrent invocations share the
//! registry and parsed clauses and nothing else.

use std::fmt;

use crate::config::EngineConfig;
use crate::expr::{EvalContext, Evaluator};
use crate::outcome::{Failure, Outcome};
use crate::registry::BrandRegistry;
use crate::types::{Clause, ContractLogic, EvalError, Expr, Value};

pub const DISPATCH_ERROR: &str = "Dispatch Error: no clause in the contract matches the request";

/// Brand of the state produced when a contract declares no init body.
pub const CONTRACT_STATE_BRAND: &str = "org.accordproject.cicero.contract.AccordContractState";

const INIT_CLAUSE: &str = "init";

/// Phase of one invocation, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Dispatching,
    Evaluating,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initial => "Initial",
            Phase::Dispatching => "Dispatching",
            Phase::Evaluating => "Evaluating",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Inputs of one `invoke`.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Contract parameters.
    pub contract: Value,
    pub state: Value,
    pub emit: Vec<Value>,
    pub request: Value,
    /// Current time; the engine never reads the wall clock.
    pub now: Value,
}

impl Invocation {
    /// Decode `{contract, state?, emit?, request, now}` from wire JSON.
    ///
    /// `now` may be a `$datetime` object or a bare date-time string.
    pub fn from_wire(input: &serde_json::Value) -> Result<Invocation, EvalError> {
        let contract = required(input, "contract")?;
        let request = required(input, "request")?;
        let now = read_now(input)?;
        let state = match input.get("state") {
            Some(s) => Value::from_wire(s)?,
            None => Value::Unit,
        };
        let emit = match input.get("emit") {
            Some(e) => Value::from_wire(e)?.into_seq()?,
            None => Vec::new(),
        };
        Ok(Invocation {
            contract,
            state,
            emit,
            request,
            now,
        })
    }
}

fn required(input: &serde_json::Value, name: &str) -> Result<Value, EvalError> {
    let v = input.get(name).ok_or_else(|| EvalError::DeserializeError {
        message: format!("invocation input missing '{}'", name),
    })?;
    Value::from_wire(v)
}

pub(crate) fn read_now(input: &serde_json::Value) -> Result<Value, EvalError> {
    match required(input, "now")? {
        Value::Str(s) => crate::primitives::datetime::parse_date_time(&s).map(Value::DateTime),
        dt @ Value::DateTime(_) => Ok(dt),
        other => Err(EvalError::TypeError {
            message: format!("'now' must be a date-time, got {}", other.type_name()),
        }),
    }
}

/// Loaded contract logic ready to serve invocations.
#[derive(Debug, Clone)]
pub struct Engine {
    id: String,
    clauses: Vec<Clause>,
    init: Option<Expr>,
    registry: BrandRegistry,
    error_brand: String,
    max_depth: usize,
}

impl Engine {
    /// Load a bundle. The brand registry is built here, once.
    pub fn from_interchange(
        bundle: &serde_json::Value,
        config: EngineConfig,
    ) -> Result<Engine, EvalError> {
        config.validate()?;
        let logic = ContractLogic::from_interchange(bundle)?;
        Engine::from_logic(logic, config)
    }

    /// Build an engine from already parsed logic. The configuration is
    /// validated here as well, and so is a bundle-declared error brand.
    pub fn from_logic(logic: ContractLogic, config: EngineConfig) -> Result<Engine, EvalError> {
        config.validate()?;
        let error_brand = logic.error_brand.unwrap_or(config.error_brand);
        if error_brand.is_empty() {
            return Err(EvalError::Config {
                message: format!("contract '{}' declares an empty error brand", logic.id),
            });
        }
        let registry = BrandRegistry::new(logic.edges, config.subtyping, config.multi_brand_cast);
        log::debug!(
            "loaded contract '{}': {} clause(s), {} branded subtype(s)",
            logic.id,
            logic.clauses.len(),
            registry.len()
        );
        Ok(Engine {
            id: logic.id,
            clauses: logic.clauses,
            init: logic.init,
            registry,
            error_brand,
            max_depth: config.max_depth,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn registry(&self) -> &BrandRegistry {
        &self.registry
    }

    pub fn error_brand(&self) -> &str {
        &self.error_brand
    }

    /// Produce the initial contract state.
    ///
    /// Runs the bundle's init body when there is one; otherwise returns the
    /// sentinel `AccordContractState` with no response and no events.
    pub fn init(&self, contract: &Value, now: &Value) -> Result<Outcome, EvalError> {
        log::debug!("[{}] {} -> {}", self.id, Phase::Initial, Phase::Evaluating);
        let body = match &self.init {
            Some(body) => body,
            None => {
                let state = Value::branded(
                    CONTRACT_STATE_BRAND,
                    [(
                        "stateId",
                        Value::text(format!("{}#1", CONTRACT_STATE_BRAND)),
                    )],
                );
                log::debug!("[{}] {} -> {}", self.id, Phase::Evaluating, Phase::Succeeded);
                return Ok(Outcome::Success {
                    clause: INIT_CLAUSE.to_string(),
                    response: Value::Unit,
                    state,
                    emit: Vec::new(),
                });
            }
        };
        let ctx = root_context(contract, &Value::Unit, &Value::Unit, now, &[]);
        let result = self.evaluator().eval(body, &ctx)?;
        self.finish(INIT_CLAUSE, result, &Value::Unit, &[])
    }

    /// Dispatch a request to the first clause that accepts it and run it.
    ///
    /// Business-rule and dispatch failures come back as
    /// [`Outcome::Failure`]; `Err` is reserved for defects such as a type
    /// error in the compiled logic.
    pub fn invoke(&self, inv: &Invocation) -> Result<Outcome, EvalError> {
        log::debug!("[{}] {} -> {}", self.id, Phase::Initial, Phase::Dispatching);
        let Some((clause, request)) = self.dispatch(&inv.request)? else {
            log::debug!("[{}] {} -> {}", self.id, Phase::Dispatching, Phase::Failed);
            return Ok(Outcome::Failure(Failure::Error {
                brand: self.error_brand.clone(),
                message: DISPATCH_ERROR.to_string(),
            }));
        };

        log::debug!(
            "[{}] {} -> {}: clause '{}'",
            self.id,
            Phase::Dispatching,
            Phase::Evaluating,
            clause.id
        );
        let ctx = root_context(&inv.contract, &inv.state, &request, &inv.now, &inv.emit);
        let result = self.evaluator().eval(&clause.body, &ctx)?;
        self.finish(&clause.id, result, &inv.state, &inv.emit)
    }

    /// First clause whose request brand the request casts to, with the
    /// cast request.
    fn dispatch(&self, request: &Value) -> Result<Option<(&Clause, Value)>, EvalError> {
        for clause in &self.clauses {
            if let Value::Left(cast) = self
                .registry
                .cast(std::slice::from_ref(&clause.request), request)?
            {
                return Ok(Some((clause, *cast)));
            }
        }
        Ok(None)
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.registry, self.max_depth)
    }

    /// Interpret a body result: `Left({response, state?, emit?})` or
    /// `Right(error)`.
    fn finish(
        &self,
        clause: &str,
        result: Value,
        state: &Value,
        emit: &[Value],
    ) -> Result<Outcome, EvalError> {
        match result {
            Value::Left(payload) => {
                let fields = payload.as_record()?;
                let response = fields.get("response").cloned().unwrap_or(Value::Unit);
                let state = fields.get("state").cloned().unwrap_or_else(|| state.clone());
                let emit = match fields.get("emit") {
                    Some(e) => e.as_seq()?.to_vec(),
                    None => emit.to_vec(),
                };
                log::debug!("[{}] {} -> {}", self.id, Phase::Evaluating, Phase::Succeeded);
                Ok(Outcome::Success {
                    clause: clause.to_string(),
                    response,
                    state,
                    emit,
                })
            }
            Value::Right(err) => {
                let failure = self.classify(*err);
                if let Failure::Unshaped(v) = &failure {
                    log::warn!("[{}] clause '{}' failed with unshaped value {}", self.id, clause, v);
                }
                log::debug!("[{}] {} -> {}", self.id, Phase::Evaluating, Phase::Failed);
                Ok(Outcome::Failure(failure))
            }
            other => Err(EvalError::TypeError {
                message: format!(
                    "clause '{}' must yield Left or Right, got {}",
                    clause,
                    other.type_name()
                ),
            }),
        }
    }

    fn classify(&self, err: Value) -> Failure {
        if let Value::Branded { brand, fields } = &err {
            let is_error = *brand == self.error_brand
                || self.registry.is_sub_brand(brand, &self.error_brand);
            if let (true, Some(Value::Str(message))) = (is_error, fields.get("message")) {
                return Failure::Error {
                    brand: brand.clone(),
                    message: message.clone(),
                };
            }
        }
        Failure::Unshaped(err)
    }
}

fn root_context(
    contract: &Value,
    state: &Value,
    request: &Value,
    now: &Value,
    emit: &[Value],
) -> EvalContext {
    let mut ctx = EvalContext::new();
    ctx.bindings.insert("contract".to_string(), contract.clone());
    ctx.bindings.insert("state".to_string(), state.clone());
    ctx.bindings.insert("request".to_string(), request.clone());
    ctx.bindings.insert("now".to_string(), now.clone());
    ctx.bindings
        .insert("emit".to_string(), Value::Seq(emit.to_vec()));
    ctx
}
