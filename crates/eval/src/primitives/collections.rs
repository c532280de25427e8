//! Sequence operators.
//!
//! `union` is concatenation: duplicates are kept. `minus`, `min` and `max`
//! are bag operations computed by a sorted merge under the structural
//! comparator, so they consume one occurrence per matching duplicate and
//! return their result in sorted order.

use std::cmp::Ordering;

use crate::compare::compare_values;
use crate::types::{EvalError, Value};

fn sorted(v: &Value) -> Result<Vec<Value>, EvalError> {
    let mut items = v.as_seq()?.to_vec();
    items.sort_by(compare_values);
    Ok(items)
}

pub fn union(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let mut items = a.as_seq()?.to_vec();
    items.extend_from_slice(b.as_seq()?);
    Ok(Value::Seq(items))
}

/// Bag difference.
pub fn minus(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (xs, ys) = (sorted(a)?, sorted(b)?);
    let mut result = Vec::new();
    let mut j = 0;
    for x in xs {
        while j < ys.len() && compare_values(&x, &ys[j]) == Ordering::Greater {
            j += 1;
        }
        if j < ys.len() && compare_values(&x, &ys[j]) == Ordering::Equal {
            j += 1;
        } else {
            result.push(x);
        }
    }
    Ok(Value::Seq(result))
}

/// Bag intersection (minimum multiplicity).
pub fn min(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (xs, ys) = (sorted(a)?, sorted(b)?);
    let mut result = Vec::new();
    let mut j = 0;
    for x in xs {
        while j < ys.len() && compare_values(&x, &ys[j]) == Ordering::Greater {
            j += 1;
        }
        if j < ys.len() && compare_values(&x, &ys[j]) == Ordering::Equal {
            j += 1;
            result.push(x);
        }
    }
    Ok(Value::Seq(result))
}

/// Bag union by maximum multiplicity.
pub fn max(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (xs, ys) = (sorted(a)?, sorted(b)?);
    let mut result = Vec::new();
    let mut j = 0;
    for x in xs {
        while j < ys.len() && compare_values(&x, &ys[j]) == Ordering::Greater {
            result.push(ys[j].clone());
            j += 1;
        }
        if j < ys.len() && compare_values(&x, &ys[j]) == Ordering::Equal {
            j += 1;
        }
        result.push(x);
    }
    result.extend_from_slice(&ys[j..]);
    Ok(Value::Seq(result))
}

/// Drop structural duplicates, keeping first-seen order.
pub fn distinct(a: &Value) -> Result<Value, EvalError> {
    let mut result: Vec<Value> = Vec::new();
    for x in a.as_seq()? {
        if !result.iter().any(|seen| compare_values(seen, x) == Ordering::Equal) {
            result.push(x.clone());
        }
    }
    Ok(Value::Seq(result))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Asc,
    Desc,
}

fn parse_criterion(c: &Value) -> Result<(String, Direction), EvalError> {
    let field = c.dot("field")?.as_str()?.to_string();
    let direction = match c.dot("order")?.as_str()? {
        "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        other => {
            return Err(EvalError::TypeError {
                message: format!("sort order must be 'asc' or 'desc', got '{}'", other),
            })
        }
    };
    Ok((field, direction))
}

fn sort_field<'a>(item: &'a Value, field: &str) -> Result<&'a Value, EvalError> {
    let fields = match item {
        Value::Record(fields) | Value::Branded { fields, .. } => fields,
        other => {
            return Err(EvalError::NotARecord {
                message: format!("cannot sort {} by field '{}'", other.type_name(), field),
            })
        }
    };
    fields.get(field).ok_or_else(|| EvalError::MissingField {
        field: field.to_string(),
    })
}

/// Stable sort of records by `[{field, order}]` criteria in priority order.
pub fn sort(criteria: &Value, seq: &Value) -> Result<Value, EvalError> {
    let criteria: Vec<(String, Direction)> = criteria
        .as_seq()?
        .iter()
        .map(parse_criterion)
        .collect::<Result<_, _>>()?;
    let items = seq.as_seq()?;

    // Extract keys up front so the comparator itself cannot fail.
    let mut keyed: Vec<(Vec<&Value>, &Value)> = Vec::with_capacity(items.len());
    for item in items {
        let keys = criteria
            .iter()
            .map(|(field, _)| sort_field(item, field))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.push((keys, item));
    }

    keyed.sort_by(|(ka, _), (kb, _)| {
        for (i, (_, direction)) in criteria.iter().enumerate() {
            let c = compare_values(ka[i], kb[i]);
            let c = match direction {
                Direction::Asc => c,
                Direction::Desc => c.reverse(),
            };
            if c != Ordering::Equal {
                return c;
            }
        }
        Ordering::Equal
    });
    Ok(Value::Seq(keyed.into_iter().map(|(_, v)| v.clone()).collect()))
}

pub fn flatten(a: &Value) -> Result<Value, EvalError> {
    let mut result = Vec::new();
    for inner in a.as_seq()? {
        result.extend_from_slice(inner.as_seq()?);
    }
    Ok(Value::Seq(result))
}

/// `Left(element)` at a zero-based index, `Right(Unit)` when out of range.
pub fn nth(seq: &Value, index: &Value) -> Result<Value, EvalError> {
    let items = seq.as_seq()?;
    let index = index.as_nat()?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .map(|v| Value::left(v.clone()))
        .unwrap_or_else(|| Value::right(Value::Unit)))
}

pub fn count(seq: &Value) -> Result<Value, EvalError> {
    Ok(Value::Nat(seq.as_seq()?.len() as i64))
}

pub fn contains(elem: &Value, seq: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(
        seq.as_seq()?
            .iter()
            .any(|x| compare_values(x, elem) == Ordering::Equal),
    ))
}

/// `Left(x)` for a one-element sequence, `Right(Unit)` otherwise.
pub fn singleton(seq: &Value) -> Result<Value, EvalError> {
    match seq.as_seq()? {
        [only] => Ok(Value::left(only.clone())),
        _ => Ok(Value::right(Value::Unit)),
    }
}
