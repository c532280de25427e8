//! Deserialization from interchange JSON bundles into typed structs.
//!
//! The main entry point is [`from_interchange`], which takes a
//! `&serde_json::Value` and produces an [`InterchangeBundle`].

use crate::types::*;
use std::fmt;

/// Errors during interchange JSON deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    /// The bundle is missing a required top-level field.
    MissingField { field: String },
    /// A construct is missing a required field.
    ConstructError {
        kind: String,
        id: String,
        message: String,
    },
    /// The bundle structure is invalid.
    InvalidBundle(String),
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::MissingField { field } => {
                write!(f, "bundle missing required field: '{}'", field)
            }
            InterchangeError::ConstructError { kind, id, message } => {
                write!(f, "{} '{}': {}", kind, id, message)
            }
            InterchangeError::InvalidBundle(msg) => {
                write!(f, "invalid bundle: {}", msg)
            }
        }
    }
}

impl std::error::Error for InterchangeError {}

/// Deserialize an interchange JSON bundle into typed structs.
///
/// Walks the `constructs` array and dispatches on the `kind` field.
/// Unknown construct kinds are silently skipped for forward compatibility.
pub fn from_interchange(bundle: &serde_json::Value) -> Result<InterchangeBundle, InterchangeError> {
    let id = bundle
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "id".to_string(),
        })?
        .to_string();

    let constructs_arr = bundle
        .get("constructs")
        .and_then(|c| c.as_array())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "constructs".to_string(),
        })?;

    let mut constructs = Vec::with_capacity(constructs_arr.len());

    for (idx, obj) in constructs_arr.iter().enumerate() {
        if !obj.is_object() {
            return Err(InterchangeError::InvalidBundle(format!(
                "construct #{} is not an object",
                idx
            )));
        }
        let kind = obj.get("kind").and_then(|k| k.as_str()).unwrap_or("");

        let construct = match kind {
            "Subtype" => Some(InterchangeConstruct::Subtype(parse_subtype(obj)?)),
            "Clause" => Some(InterchangeConstruct::Clause(parse_clause(obj)?)),
            "Init" => Some(InterchangeConstruct::Init(parse_init(obj)?)),
            "ErrorBrand" => Some(InterchangeConstruct::ErrorBrand(parse_error_brand(obj)?)),
            _ => None, // Skip unknown kinds for forward compatibility
        };

        if let Some(c) = construct {
            constructs.push(c);
        }
    }

    Ok(InterchangeBundle { id, constructs })
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn construct_str(
    obj: &serde_json::Value,
    kind: &str,
    id: &str,
    field: &str,
) -> Result<String, InterchangeError> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| InterchangeError::ConstructError {
            kind: kind.to_string(),
            id: id.to_string(),
            message: format!("missing '{}' field", field),
        })
}

fn construct_body(
    obj: &serde_json::Value,
    kind: &str,
    id: &str,
) -> Result<serde_json::Value, InterchangeError> {
    obj.get("body")
        .filter(|b| !b.is_null())
        .cloned()
        .ok_or_else(|| InterchangeError::ConstructError {
            kind: kind.to_string(),
            id: id.to_string(),
            message: "missing 'body' field".to_string(),
        })
}

fn parse_provenance(obj: &serde_json::Value) -> Option<Provenance> {
    let prov = obj.get("provenance")?;
    let file = prov.get("file")?.as_str()?.to_string();
    let line = prov.get("line")?.as_u64()?;
    Some(Provenance { file, line })
}

fn parse_subtype(obj: &serde_json::Value) -> Result<SubtypeConstruct, InterchangeError> {
    let sub = construct_str(obj, "Subtype", "?", "sub")?;
    let sup = construct_str(obj, "Subtype", &sub, "sup")?;
    Ok(SubtypeConstruct { sub, sup })
}

fn parse_clause(obj: &serde_json::Value) -> Result<ClauseConstruct, InterchangeError> {
    let id = construct_str(obj, "Clause", "?", "id")?;
    let request = construct_str(obj, "Clause", &id, "request")?;
    let body = construct_body(obj, "Clause", &id)?;
    let provenance = parse_provenance(obj);

    Ok(ClauseConstruct {
        id,
        request,
        body,
        provenance,
    })
}

fn parse_init(obj: &serde_json::Value) -> Result<InitConstruct, InterchangeError> {
    let body = construct_body(obj, "Init", "init")?;
    let provenance = parse_provenance(obj);
    Ok(InitConstruct { body, provenance })
}

fn parse_error_brand(obj: &serde_json::Value) -> Result<ErrorBrandConstruct, InterchangeError> {
    let brand = construct_str(obj, "ErrorBrand", "?", "brand")?;
    Ok(ErrorBrandConstruct { brand })
}
