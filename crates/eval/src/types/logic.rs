//! Compiled contract logic and expression-tree deserialization.

use super::{EvalError, Expr, MatchCase, Value};
use crate::primitives::Primitive;
use accord_interchange::Provenance;

// ──────────────────────────────────────────────
// Contract logic
// ──────────────────────────────────────────────

/// Contract logic deserialized from an interchange bundle.
#[derive(Debug, Clone)]
pub struct ContractLogic {
    pub id: String,
    /// Clauses in declaration order, which is also dispatch order.
    pub clauses: Vec<Clause>,
    pub init: Option<Expr>,
    /// Declared `(sub, sup)` brand edges.
    pub edges: Vec<(String, String)>,
    /// Error brand declared by the bundle, if any.
    pub error_brand: Option<String>,
}

/// One request brand and the body run when a request casts to it.
#[derive(Debug, Clone)]
pub struct Clause {
    pub id: String,
    pub request: String,
    pub body: Expr,
}

impl ContractLogic {
    /// Deserialize contract logic from an interchange JSON bundle.
    ///
    /// `accord_interchange::from_interchange()` handles the outer bundle
    /// and kind dispatch; clause and init bodies are deep-parsed here.
    pub fn from_interchange(bundle: &serde_json::Value) -> Result<ContractLogic, EvalError> {
        let parsed = accord_interchange::from_interchange(bundle).map_err(|e| {
            EvalError::DeserializeError {
                message: e.to_string(),
            }
        })?;

        let clauses = parsed
            .clauses()
            .map(|c| {
                let body = parse_expr(&c.body)
                    .map_err(|e| in_construct("Clause", &c.id, c.provenance.as_ref(), e))?;
                Ok(Clause {
                    id: c.id.clone(),
                    request: c.request.clone(),
                    body,
                })
            })
            .collect::<Result<Vec<_>, EvalError>>()?;

        let init = match parsed.init() {
            Some(i) => Some(
                parse_expr(&i.body)
                    .map_err(|e| in_construct("Init", "init", i.provenance.as_ref(), e))?,
            ),
            None => None,
        };

        let edges = parsed
            .subtypes()
            .map(|s| (s.sub.clone(), s.sup.clone()))
            .collect();

        Ok(ContractLogic {
            id: parsed.id.clone(),
            clauses,
            init,
            edges,
            error_brand: parsed.error_brand().map(str::to_string),
        })
    }
}

/// Prefix deserialize errors with the construct they came from.
/// Prefix a parse failure with the construct it came from and, when the
/// compiler recorded one, its source location.
fn in_construct(kind: &str, id: &str, at: Option<&Provenance>, err: EvalError) -> EvalError {
    let location = match at {
        Some(p) => format!(" ({})", p),
        None => String::new(),
    };
    match err {
        EvalError::DeserializeError { message } => EvalError::DeserializeError {
            message: format!("{} '{}'{}: {}", kind, id, location, message),
        },
        other => other,
    }
}

// ──────────────────────────────────────────────
// Expression parsing
// ──────────────────────────────────────────────

fn field<'a>(
    v: &'a serde_json::Value,
    node: &str,
    name: &str,
) -> Result<&'a serde_json::Value, EvalError> {
    v.get(name).ok_or_else(|| EvalError::DeserializeError {
        message: format!("{} missing '{}'", node, name),
    })
}

fn str_field(v: &serde_json::Value, node: &str, name: &str) -> Result<String, EvalError> {
    field(v, node, name)?
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| EvalError::DeserializeError {
            message: format!("{} '{}' must be a string", node, name),
        })
}

fn sub_expr(v: &serde_json::Value, node: &str, name: &str) -> Result<Box<Expr>, EvalError> {
    Ok(Box::new(parse_expr(field(v, node, name)?)?))
}

fn expr_list(v: &serde_json::Value, node: &str, name: &str) -> Result<Vec<Expr>, EvalError> {
    field(v, node, name)?
        .as_array()
        .ok_or_else(|| EvalError::DeserializeError {
            message: format!("{} '{}' must be an array", node, name),
        })?
        .iter()
        .map(parse_expr)
        .collect()
}

/// Brand targets: a single `"brand"` string or a `"brands"` array.
fn brand_list(v: &serde_json::Value, node: &str) -> Result<Vec<String>, EvalError> {
    if let Some(b) = v.get("brand") {
        let b = b.as_str().ok_or_else(|| EvalError::DeserializeError {
            message: format!("{} 'brand' must be a string", node),
        })?;
        return Ok(vec![b.to_string()]);
    }
    field(v, node, "brands")?
        .as_array()
        .and_then(|arr| {
            arr.iter()
                .map(|b| b.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| EvalError::DeserializeError {
            message: format!("{} 'brands' must be an array of strings", node),
        })
}

/// `{"var": name, "body": expr}` branch used by `either`.
fn branch(v: &serde_json::Value, node: &str, name: &str) -> Result<(String, Box<Expr>), EvalError> {
    let b = field(v, node, name)?;
    Ok((str_field(b, node, "var")?, sub_expr(b, node, "body")?))
}

/// Parse a compiled expression node.
///
/// Primitive names are resolved and their arity checked here, so a bundle
/// that loads never fails on an unknown operator at evaluation time.
pub fn parse_expr(v: &serde_json::Value) -> Result<Expr, EvalError> {
    let kind = v
        .get("expr")
        .and_then(|k| k.as_str())
        .ok_or_else(|| EvalError::DeserializeError {
            message: format!("expression node missing 'expr' tag: {}", v),
        })?;

    match kind {
        "const" => Ok(Expr::Const(Value::from_wire(field(v, "const", "value")?)?)),
        "var" => Ok(Expr::Var(str_field(v, "var", "name")?)),
        "let" => Ok(Expr::Let {
            name: str_field(v, "let", "name")?,
            value: sub_expr(v, "let", "value")?,
            body: sub_expr(v, "let", "body")?,
        }),
        "dot" => Ok(Expr::Dot {
            record: sub_expr(v, "dot", "record")?,
            field: str_field(v, "dot", "field")?,
        }),
        "record" => {
            let fields = field(v, "record", "fields")?
                .as_object()
                .ok_or_else(|| EvalError::DeserializeError {
                    message: "record 'fields' must be an object".to_string(),
                })?;
            let fields = fields
                .iter()
                .map(|(k, e)| Ok((k.clone(), parse_expr(e)?)))
                .collect::<Result<Vec<_>, EvalError>>()?;
            Ok(Expr::Record(fields))
        }
        "concat" => Ok(Expr::Concat {
            left: sub_expr(v, "concat", "left")?,
            right: sub_expr(v, "concat", "right")?,
        }),
        "brand" => Ok(Expr::Brand {
            brand: str_field(v, "brand", "brand")?,
            expr: sub_expr(v, "brand", "value")?,
        }),
        "unbrand" => Ok(Expr::Unbrand(sub_expr(v, "unbrand", "value")?)),
        "cast" => Ok(Expr::Cast {
            brands: brand_list(v, "cast")?,
            expr: sub_expr(v, "cast", "value")?,
        }),
        "left" => Ok(Expr::Left(sub_expr(v, "left", "value")?)),
        "right" => Ok(Expr::Right(sub_expr(v, "right", "value")?)),
        "either" => {
            let (left_var, left) = branch(v, "either", "left")?;
            let (right_var, right) = branch(v, "either", "right")?;
            Ok(Expr::Either {
                scrutinee: sub_expr(v, "either", "value")?,
                left_var,
                left,
                right_var,
                right,
            })
        }
        "if" => Ok(Expr::If {
            cond: sub_expr(v, "if", "cond")?,
            then: sub_expr(v, "if", "then")?,
            otherwise: sub_expr(v, "if", "else")?,
        }),
        "apply" => {
            let op = Primitive::from_name(&str_field(v, "apply", "op")?)?;
            let args = expr_list(v, "apply", "args")?;
            op.check_arity(args.len())?;
            Ok(Expr::Apply { op, args })
        }
        "seq" => Ok(Expr::Seq(expr_list(v, "seq", "items")?)),
        "map" => Ok(Expr::Map {
            var: str_field(v, "map", "var")?,
            over: sub_expr(v, "map", "over")?,
            body: sub_expr(v, "map", "body")?,
        }),
        "filter" => Ok(Expr::Filter {
            var: str_field(v, "filter", "var")?,
            over: sub_expr(v, "filter", "over")?,
            body: sub_expr(v, "filter", "body")?,
        }),
        "match" => {
            let cases = field(v, "match", "cases")?
                .as_array()
                .ok_or_else(|| EvalError::DeserializeError {
                    message: "match 'cases' must be an array".to_string(),
                })?
                .iter()
                .map(|c| {
                    Ok(MatchCase {
                        brands: brand_list(c, "match case")?,
                        var: str_field(c, "match case", "var")?,
                        body: parse_expr(field(c, "match case", "body")?)?,
                    })
                })
                .collect::<Result<Vec<_>, EvalError>>()?;
            Ok(Expr::Match {
                scrutinee: sub_expr(v, "match", "value")?,
                cases,
                otherwise: sub_expr(v, "match", "otherwise")?,
            })
        }
        other => Err(EvalError::DeserializeError {
            message: format!("unknown expression kind '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_apply_resolves_operator() {
        let e = parse_expr(&json!({
            "expr": "apply", "op": "nat_plus",
            "args": [
                {"expr": "const", "value": {"$nat": 1}},
                {"expr": "var", "name": "x"}
            ]
        }))
        .unwrap();
        match e {
            Expr::Apply { op, args } => {
                assert_eq!(op, Primitive::NatPlus);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Apply, got {:?}", other),
        }
    }

    #[test]
    fn parse_apply_checks_arity_at_load() {
        let err = parse_expr(&json!({
            "expr": "apply", "op": "not",
            "args": []
        }))
        .unwrap_err();
        assert!(matches!(err, EvalError::Arity { .. }));
    }

    #[test]
    fn parse_unknown_operator() {
        let err = parse_expr(&json!({"expr": "apply", "op": "teleport", "args": []})).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownPrimitive {
                name: "teleport".to_string()
            }
        );
    }

    #[test]
    fn parse_cast_accepts_brand_or_brands() {
        let single = parse_expr(&json!({
            "expr": "cast", "brand": "A", "value": {"expr": "var", "name": "v"}
        }))
        .unwrap();
        let multi = parse_expr(&json!({
            "expr": "cast", "brands": ["A", "B"], "value": {"expr": "var", "name": "v"}
        }))
        .unwrap();
        assert!(matches!(single, Expr::Cast { ref brands, .. } if brands.len() == 1));
        assert!(matches!(multi, Expr::Cast { ref brands, .. } if brands.len() == 2));
    }

    #[test]
    fn parse_either_and_match() {
        let e = parse_expr(&json!({
            "expr": "either",
            "value": {"expr": "var", "name": "r"},
            "left": {"var": "ok", "body": {"expr": "var", "name": "ok"}},
            "right": {"var": "err", "body": {"expr": "const", "value": null}}
        }))
        .unwrap();
        assert!(matches!(e, Expr::Either { ref left_var, .. } if left_var == "ok"));

        let m = parse_expr(&json!({
            "expr": "match",
            "value": {"expr": "var", "name": "request"},
            "cases": [{"brand": "A", "var": "a", "body": {"expr": "var", "name": "a"}}],
            "otherwise": {"expr": "const", "value": null}
        }))
        .unwrap();
        assert!(matches!(m, Expr::Match { ref cases, .. } if cases.len() == 1));
    }

    #[test]
    fn parse_rejects_unknown_kind_and_missing_fields() {
        assert!(parse_expr(&json!({"expr": "goto"})).is_err());
        assert!(parse_expr(&json!({"expr": "dot", "field": "x"})).is_err());
        assert!(parse_expr(&json!({"value": 1})).is_err());
    }

    #[test]
    fn from_interchange_keeps_clause_order_and_edges() {
        let bundle = json!({
            "id": "c",
            "constructs": [
                {"kind": "Subtype", "sub": "Req", "sup": "Base"},
                {"kind": "Clause", "id": "first", "request": "Req",
                 "body": {"expr": "const", "value": null}},
                {"kind": "Clause", "id": "second", "request": "Base",
                 "body": {"expr": "const", "value": null}},
                {"kind": "ErrorBrand", "brand": "my.Error"}
            ]
        });
        let logic = ContractLogic::from_interchange(&bundle).unwrap();
        let ids: Vec<_> = logic.clauses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(logic.edges, vec![("Req".to_string(), "Base".to_string())]);
        assert_eq!(logic.error_brand.as_deref(), Some("my.Error"));
        assert!(logic.init.is_none());
    }

    #[test]
    fn from_interchange_names_the_failing_clause() {
        let bundle = json!({
            "id": "c",
            "constructs": [
                {"kind": "Clause", "id": "broken", "request": "Req",
                 "body": {"expr": "let", "name": "x"}}
            ]
        });
        match ContractLogic::from_interchange(&bundle).unwrap_err() {
            EvalError::DeserializeError { message } => {
                assert!(message.starts_with("Clause 'broken'"), "{}", message)
            }
            other => panic!("expected DeserializeError, got {:?}", other),
        }
    }

    #[test]
    fn parse_errors_carry_source_location() {
        let bundle = json!({
            "id": "c",
            "constructs": [
                {"kind": "Init", "body": {"expr": "var"},
                 "provenance": {"file": "logic.ergo", "line": 7}}
            ]
        });
        match ContractLogic::from_interchange(&bundle).unwrap_err() {
            EvalError::DeserializeError { message } => {
                assert!(message.starts_with("Init 'init' (logic.ergo:7): "), "{}", message)
            }
            other => panic!("expected DeserializeError, got {:?}", other),
        }
    }
}
