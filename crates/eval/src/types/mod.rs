//! Runtime value types and compiled contract logic for the Accord evaluator.
//!
//! The evaluator consumes interchange JSON produced by the contract
//! compiler, never contract source text. Everything here is deserialized
//! from that interchange format.

pub mod logic;
pub mod values;

pub use logic::{parse_expr, Clause, ContractLogic};
pub use values::{value_to_wire, Value};

use crate::primitives::Primitive;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Defects raised while loading or evaluating compiled logic.
///
/// These are never contract outcomes: business-rule and dispatch failures
/// are reported as [`crate::Outcome::Failure`]. An `EvalError` aborts the
/// invocation and points at the compiler, the caller's input encoding, or
/// a primitive misuse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// Error deserializing interchange JSON or a wire value.
    #[error("deserialization error: {message}")]
    DeserializeError { message: String },

    /// A value had the wrong kind for the operation applied to it.
    #[error("type error: {message}")]
    TypeError { message: String },

    /// Field access on a non-record value.
    #[error("not a record: {message}")]
    NotARecord { message: String },

    /// Field access on a record that lacks the field.
    #[error("record has no field '{field}'")]
    MissingField { field: String },

    /// Variable not bound in the current scope.
    #[error("unbound variable: {name}")]
    UnboundVariable { name: String },

    /// A primitive operator name the engine does not implement.
    #[error("unknown primitive operator: {name}")]
    UnknownPrimitive { name: String },

    /// A primitive was applied to the wrong number of arguments.
    #[error("operator '{op}' expects {expected} argument(s), got {got}")]
    Arity {
        op: String,
        expected: usize,
        got: usize,
    },

    #[error("division by zero in '{op}'")]
    DivisionByZero { op: String },

    /// Checked integer arithmetic overflowed.
    #[error("numeric overflow: {message}")]
    Overflow { message: String },

    /// Cast against more than one target brand with multi-brand casts disabled.
    #[error("cast with {count} target brands is not supported")]
    UnsupportedCast { count: usize },

    #[error("invalid date-time: {message}")]
    InvalidDateTime { message: String },

    #[error("invalid temporal unit: {message}")]
    InvalidTemporalUnit { message: String },

    /// An either-unwrap helper met the other branch.
    #[error("unwrap failed: {message}")]
    Unwrap { message: String },

    /// Expression nesting exceeded the configured evaluation depth.
    #[error("evaluation depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },

    #[error("configuration error: {message}")]
    Config { message: String },
}

// ──────────────────────────────────────────────
// Compiled expression tree
// ──────────────────────────────────────────────

/// Expression nodes of compiled clause logic.
#[derive(Debug, Clone)]
pub enum Expr {
    Const(Value),
    /// Reference to a bound variable (`contract`, `state`, `request`,
    /// `now`, `emit`, or a local binding).
    Var(String),
    Let {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// Field access on an unbranded record.
    Dot {
        record: Box<Expr>,
        field: String,
    },
    /// Record construction.
    Record(Vec<(String, Expr)>),
    /// Record concatenation; fields of `right` win.
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Brand {
        brand: String,
        expr: Box<Expr>,
    },
    Unbrand(Box<Expr>),
    /// Subtype-aware cast producing `Left(value)` or `Right(Unit)`.
    Cast {
        brands: Vec<String>,
        expr: Box<Expr>,
    },
    Left(Box<Expr>),
    Right(Box<Expr>),
    /// Case analysis over a sum value.
    Either {
        scrutinee: Box<Expr>,
        left_var: String,
        left: Box<Expr>,
        right_var: String,
        right: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Apply {
        op: Primitive,
        args: Vec<Expr>,
    },
    Seq(Vec<Expr>),
    Map {
        var: String,
        over: Box<Expr>,
        body: Box<Expr>,
    },
    Filter {
        var: String,
        over: Box<Expr>,
        body: Box<Expr>,
    },
    /// Brand-typed pattern dispatch: the first case whose cast succeeds
    /// runs with the value bound to its variable.
    Match {
        scrutinee: Box<Expr>,
        cases: Vec<MatchCase>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct MatchCase {
    pub brands: Vec<String>,
    pub var: String,
    pub body: Expr,
}
