//! Typed structs representing the compiled-logic interchange JSON.
//!
//! Clause and init bodies are stored as `serde_json::Value`: the
//! expression tree is deeply nested and only the evaluator interprets it.

use std::fmt;

/// Source location provenance recorded by the contract compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub file: String,
    pub line: u64,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Top-level interchange bundle containing all constructs.
#[derive(Debug, Clone)]
pub struct InterchangeBundle {
    /// Bundle identifier (contract id).
    pub id: String,
    /// All constructs in the bundle, in declaration order.
    pub constructs: Vec<InterchangeConstruct>,
}

impl InterchangeBundle {
    /// Declared subtype edges, in declaration order.
    pub fn subtypes(&self) -> impl Iterator<Item = &SubtypeConstruct> {
        self.constructs.iter().filter_map(|c| match c {
            InterchangeConstruct::Subtype(s) => Some(s),
            _ => None,
        })
    }

    /// Declared clauses, in declaration (dispatch) order.
    pub fn clauses(&self) -> impl Iterator<Item = &ClauseConstruct> {
        self.constructs.iter().filter_map(|c| match c {
            InterchangeConstruct::Clause(cl) => Some(cl),
            _ => None,
        })
    }

    /// The init construct, if the contract declares one.
    /// When several are present the last one wins.
    pub fn init(&self) -> Option<&InitConstruct> {
        self.constructs
            .iter()
            .filter_map(|c| match c {
                InterchangeConstruct::Init(i) => Some(i),
                _ => None,
            })
            .last()
    }

    /// The error brand override, if the contract declares one.
    pub fn error_brand(&self) -> Option<&str> {
        self.constructs
            .iter()
            .filter_map(|c| match c {
                InterchangeConstruct::ErrorBrand(e) => Some(e.brand.as_str()),
                _ => None,
            })
            .last()
    }
}

/// A single construct from the interchange bundle, dispatched by kind.
#[derive(Debug, Clone)]
pub enum InterchangeConstruct {
    Subtype(SubtypeConstruct),
    Clause(ClauseConstruct),
    Init(InitConstruct),
    ErrorBrand(ErrorBrandConstruct),
}

// ── Subtype ─────────────────────────────────────────────────────────

/// A declared nominal subtyping edge `sub <: sup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeConstruct {
    pub sub: String,
    pub sup: String,
}

// ── Clause ──────────────────────────────────────────────────────────

/// A Clause construct: one request brand and the compiled body run
/// when a request of that brand is dispatched to it.
#[derive(Debug, Clone)]
pub struct ClauseConstruct {
    pub id: String,
    /// Brand the request must cast to for this clause to be selected.
    pub request: String,
    /// Raw expression JSON.
    pub body: serde_json::Value,
    pub provenance: Option<Provenance>,
}

// ── Init ────────────────────────────────────────────────────────────

/// An Init construct: the compiled body that produces initial state.
#[derive(Debug, Clone)]
pub struct InitConstruct {
    pub body: serde_json::Value,
    pub provenance: Option<Provenance>,
}

// ── ErrorBrand ──────────────────────────────────────────────────────

/// Names the brand the contract uses for `{message}` error values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBrandConstruct {
    pub brand: String,
}
