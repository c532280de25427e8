//! accord-interchange: compiled contract logic bundles.
//!
//! Provides typed structs for the construct kinds a contract compiler
//! emits (Subtype, Clause, Init, ErrorBrand) and a single
//! `from_interchange()` entry point that deserializes a
//! `serde_json::Value` bundle into an `InterchangeBundle`.
//!
//! Expression bodies are kept as raw JSON; the evaluator owns their
//! deep parsing.

pub mod deserialize;
pub mod types;

pub use deserialize::{from_interchange, InterchangeError};
pub use types::*;
