//! Expression evaluator.
//!
//! Evaluates compiled expression trees against an environment of bound
//! variables. The root environment carries the invocation inputs
//! (`contract`, `state`, `request`, `now`, `emit`); binding forms extend
//! it by cloning, so caller-owned values are never mutated.
//!
//! Recursion depth is bounded by the engine's `max_depth`.

use std::collections::BTreeMap;

use crate::primitives::Primitive;
use crate::registry::BrandRegistry;
use crate::types::{EvalError, Expr, Value};

/// Variables in scope.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub bindings: BTreeMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            bindings: BTreeMap::new(),
        }
    }

    /// A new scope with `name` bound to `value`, shadowing any outer binding.
    pub fn bind(&self, name: &str, value: Value) -> EvalContext {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.to_string(), value);
        EvalContext { bindings }
    }

    pub fn lookup(&self, name: &str) -> Result<&Value, EvalError> {
        self.bindings
            .get(name)
            .ok_or_else(|| EvalError::UnboundVariable {
                name: name.to_string(),
            })
    }
}

/// Read-only state shared by one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    pub registry: &'a BrandRegistry,
    pub max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a BrandRegistry, max_depth: usize) -> Self {
        Evaluator {
            registry,
            max_depth,
        }
    }

    /// Evaluate `expr` in `ctx`.
    pub fn eval(&self, expr: &Expr, ctx: &EvalContext) -> Result<Value, EvalError> {
        self.eval_at(expr, ctx, 0)
    }

    fn eval_at(&self, expr: &Expr, ctx: &EvalContext, depth: usize) -> Result<Value, EvalError> {
        if depth >= self.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let next = depth + 1;

        match expr {
            Expr::Const(v) => Ok(v.clone()),

            Expr::Var(name) => ctx.lookup(name).cloned(),

            Expr::Let { name, value, body } => {
                let v = self.eval_at(value, ctx, next)?;
                self.eval_at(body, &ctx.bind(name, v), next)
            }

            Expr::Dot { record, field } => {
                let rec = self.eval_at(record, ctx, next)?;
                rec.dot(field).cloned()
            }

            Expr::Record(fields) => {
                let mut out = BTreeMap::new();
                for (name, e) in fields {
                    out.insert(name.clone(), self.eval_at(e, ctx, next)?);
                }
                Ok(Value::Record(out))
            }

            Expr::Concat { left, right } => {
                let l = self.eval_at(left, ctx, next)?;
                let r = self.eval_at(right, ctx, next)?;
                let mut fields = l.as_record()?.clone();
                for (k, v) in r.as_record()? {
                    fields.insert(k.clone(), v.clone());
                }
                Ok(Value::Record(fields))
            }

            Expr::Brand { brand, expr } => match self.eval_at(expr, ctx, next)? {
                Value::Record(fields) => Ok(Value::Branded {
                    brand: brand.clone(),
                    fields,
                }),
                other => Err(EvalError::NotARecord {
                    message: format!("cannot brand {} as '{}'", other.type_name(), brand),
                }),
            },

            Expr::Unbrand(inner) => match self.eval_at(inner, ctx, next)? {
                Value::Branded { fields, .. } => Ok(Value::Record(fields)),
                other => Err(EvalError::TypeError {
                    message: format!("unbrand expects a branded value, got {}", other.type_name()),
                }),
            },

            Expr::Cast { brands, expr } => {
                let v = self.eval_at(expr, ctx, next)?;
                self.registry.cast(brands, &v)
            }

            Expr::Left(inner) => Ok(Value::left(self.eval_at(inner, ctx, next)?)),
            Expr::Right(inner) => Ok(Value::right(self.eval_at(inner, ctx, next)?)),

            Expr::Either {
                scrutinee,
                left_var,
                left,
                right_var,
                right,
            } => match self.eval_at(scrutinee, ctx, next)? {
                Value::Left(v) => self.eval_at(left, &ctx.bind(left_var, *v), next),
                Value::Right(v) => self.eval_at(right, &ctx.bind(right_var, *v), next),
                other => Err(EvalError::TypeError {
                    message: format!("either expects Left or Right, got {}", other.type_name()),
                }),
            },

            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_at(cond, ctx, next)?.as_bool()? {
                    self.eval_at(then, ctx, next)
                } else {
                    self.eval_at(otherwise, ctx, next)
                }
            }

            // Short-circuit: the second operand is skipped once the first decides.
            Expr::Apply {
                op: op @ (Primitive::And | Primitive::Or),
                args,
            } => {
                op.check_arity(args.len())?;
                let first = self.eval_at(&args[0], ctx, next)?.as_bool()?;
                if first == (*op == Primitive::Or) {
                    return Ok(Value::Bool(first));
                }
                let second = self.eval_at(&args[1], ctx, next)?.as_bool()?;
                Ok(Value::Bool(second))
            }

            Expr::Apply { op, args } => {
                let values = args
                    .iter()
                    .map(|a| self.eval_at(a, ctx, next))
                    .collect::<Result<Vec<_>, _>>()?;
                op.apply(&values)
            }

            Expr::Seq(items) => Ok(Value::Seq(
                items
                    .iter()
                    .map(|e| self.eval_at(e, ctx, next))
                    .collect::<Result<_, _>>()?,
            )),

            Expr::Map { var, over, body } => {
                let items = self.eval_at(over, ctx, next)?.into_seq()?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_at(body, &ctx.bind(var, item), next)?);
                }
                Ok(Value::Seq(out))
            }

            Expr::Filter { var, over, body } => {
                let items = self.eval_at(over, ctx, next)?.into_seq()?;
                let mut out = Vec::new();
                for item in items {
                    let keep = self
                        .eval_at(body, &ctx.bind(var, item.clone()), next)?
                        .as_bool()?;
                    if keep {
                        out.push(item);
                    }
                }
                Ok(Value::Seq(out))
            }

            Expr::Match {
                scrutinee,
                cases,
                otherwise,
            } => {
                let v = self.eval_at(scrutinee, ctx, next)?;
                for case in cases {
                    if let Value::Left(matched) = self.registry.cast(&case.brands, &v)? {
                        return self.eval_at(&case.body, &ctx.bind(&case.var, *matched), next);
                    }
                }
                self.eval_at(otherwise, ctx, next)
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Subtyping;
    use crate::types::parse_expr;
    use serde_json::json;

    fn registry() -> BrandRegistry {
        BrandRegistry::new(
            vec![("Dog", "Animal"), ("Cat", "Animal")],
            Subtyping::Declared,
            false,
        )
    }

    fn run(expr: serde_json::Value, ctx: &EvalContext) -> Result<Value, EvalError> {
        let reg = registry();
        Evaluator::new(&reg, 64).eval(&parse_expr(&expr).unwrap(), ctx)
    }

    fn var(name: &str) -> serde_json::Value {
        json!({"expr": "var", "name": name})
    }

    fn nat(n: i64) -> serde_json::Value {
        json!({"expr": "const", "value": {"$nat": n}})
    }

    #[test]
    fn let_binds_and_shadows() {
        let e = json!({
            "expr": "let", "name": "x", "value": nat(1),
            "body": {
                "expr": "let", "name": "x",
                "value": {"expr": "apply", "op": "nat_plus", "args": [var("x"), nat(10)]},
                "body": var("x")
            }
        });
        assert_eq!(run(e, &EvalContext::new()).unwrap(), Value::Nat(11));
    }

    #[test]
    fn unbound_variable() {
        assert_eq!(
            run(var("ghost"), &EvalContext::new()),
            Err(EvalError::UnboundVariable {
                name: "ghost".to_string()
            })
        );
    }

    #[test]
    fn dot_on_branded_value_needs_unbrand() {
        let ctx = EvalContext::new().bind("d", Value::branded("Dog", [("name", Value::text("Rex"))]));
        let direct = json!({"expr": "dot", "record": var("d"), "field": "name"});
        assert!(matches!(
            run(direct, &ctx),
            Err(EvalError::NotARecord { .. })
        ));
        let unbranded = json!({
            "expr": "dot",
            "record": {"expr": "unbrand", "value": var("d")},
            "field": "name"
        });
        assert_eq!(run(unbranded, &ctx).unwrap(), Value::text("Rex"));
    }

    #[test]
    fn concat_right_fields_win() {
        let e = json!({
            "expr": "concat",
            "left": {"expr": "record", "fields": {"a": nat(1), "b": nat(2)}},
            "right": {"expr": "record", "fields": {"b": nat(3)}}
        });
        let r = run(e, &EvalContext::new()).unwrap();
        assert_eq!(r.dot("a").unwrap(), &Value::Nat(1));
        assert_eq!(r.dot("b").unwrap(), &Value::Nat(3));
    }

    #[test]
    fn brand_then_cast_through_declared_edge() {
        let e = json!({
            "expr": "cast", "brand": "Animal",
            "value": {"expr": "brand", "brand": "Dog", "value": {"expr": "record", "fields": {}}}
        });
        assert!(matches!(run(e, &EvalContext::new()).unwrap(), Value::Left(_)));
    }

    #[test]
    fn either_binds_branch_payload() {
        let e = json!({
            "expr": "either",
            "value": {"expr": "right", "value": nat(7)},
            "left": {"var": "l", "body": nat(0)},
            "right": {"var": "r", "body": {"expr": "apply", "op": "nat_mult", "args": [var("r"), nat(2)]}}
        });
        assert_eq!(run(e, &EvalContext::new()).unwrap(), Value::Nat(14));
    }

    #[test]
    fn and_short_circuits() {
        // The right operand would be a type error if evaluated.
        let e = json!({
            "expr": "apply", "op": "and",
            "args": [{"expr": "const", "value": false}, nat(1)]
        });
        assert_eq!(run(e, &EvalContext::new()).unwrap(), Value::Bool(false));
        let e = json!({
            "expr": "apply", "op": "or",
            "args": [{"expr": "const", "value": true}, nat(1)]
        });
        assert_eq!(run(e, &EvalContext::new()).unwrap(), Value::Bool(true));
        let e = json!({
            "expr": "apply", "op": "or",
            "args": [{"expr": "const", "value": false}, nat(1)]
        });
        assert!(run(e, &EvalContext::new()).is_err());
    }

    #[test]
    fn map_and_filter() {
        let ctx = EvalContext::new().bind(
            "xs",
            Value::Seq(vec![Value::Nat(1), Value::Nat(2), Value::Nat(3)]),
        );
        let e = json!({
            "expr": "map", "var": "x",
            "over": {
                "expr": "filter", "var": "x", "over": var("xs"),
                "body": {"expr": "apply", "op": "nat_gt", "args": [var("x"), nat(1)]}
            },
            "body": {"expr": "apply", "op": "nat_mult", "args": [var("x"), nat(10)]}
        });
        let r = run(e, &ctx).unwrap();
        let got: Vec<i64> = r.as_seq().unwrap().iter().map(|v| v.as_nat().unwrap()).collect();
        assert_eq!(got, vec![20, 30]);
        // The caller's binding is untouched.
        assert_eq!(ctx.lookup("xs").unwrap().as_seq().unwrap().len(), 3);
    }

    #[test]
    fn match_takes_first_castable_case() {
        let ctx = EvalContext::new().bind("pet", Value::branded("Cat", Vec::<(String, Value)>::new()));
        let e = json!({
            "expr": "match", "value": var("pet"),
            "cases": [
                {"brand": "Dog", "var": "d", "body": {"expr": "const", "value": "dog"}},
                {"brand": "Animal", "var": "a", "body": {"expr": "const", "value": "animal"}},
                {"brand": "Cat", "var": "c", "body": {"expr": "const", "value": "cat"}}
            ],
            "otherwise": {"expr": "const", "value": "unknown"}
        });
        assert_eq!(run(e, &ctx).unwrap(), Value::text("animal"));
    }

    #[test]
    fn match_falls_through_to_otherwise() {
        let ctx = EvalContext::new().bind("pet", Value::branded("Fish", Vec::<(String, Value)>::new()));
        let e = json!({
            "expr": "match", "value": var("pet"),
            "cases": [{"brand": "Animal", "var": "a", "body": {"expr": "const", "value": "animal"}}],
            "otherwise": {"expr": "const", "value": "unknown"}
        });
        assert_eq!(run(e, &ctx).unwrap(), Value::text("unknown"));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut e = nat(0);
        for _ in 0..100 {
            e = json!({"expr": "left", "value": e});
        }
        assert_eq!(
            run(e, &EvalContext::new()),
            Err(EvalError::DepthExceeded { limit: 64 })
        );
    }
}
