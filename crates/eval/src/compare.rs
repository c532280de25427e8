//! Structural comparator: a total order over runtime values.
//!
//! Values of different kinds order by a fixed kind ranking. Within a kind:
//! scalars use their native order, sequences compare as sorted copies
//! (insertion order is never significant, at any nesting depth), records
//! walk the sorted union of their field names, and branded values compare
//! by brand and then by fields.
//!
//! `distinct`, the bag operators (`minus`, `min`, `max`) and `sort` all
//! rely on this order, and `Value`'s `Eq`/`Ord` impls delegate to it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::Value;

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Unit => 0,
        Value::Bool(_) => 1,
        Value::Nat(_) => 2,
        Value::Float(_) => 3,
        Value::Str(_) => 4,
        Value::DateTime(_) => 5,
        Value::Seq(_) => 6,
        Value::Record(_) => 7,
        Value::Left(_) => 8,
        Value::Right(_) => 9,
        Value::Branded { .. } => 10,
    }
}

/// Compare two values structurally.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (ra, rb) = (kind_rank(a), kind_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Value::Unit, Value::Unit) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Nat(x), Value::Nat(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => compare_floats(*x, *y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        // Instants compare regardless of their offsets.
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Seq(xs), Value::Seq(ys)) => compare_seqs(xs, ys),
        (Value::Record(x), Value::Record(y)) => compare_fields(x, y),
        (Value::Left(x), Value::Left(y)) | (Value::Right(x), Value::Right(y)) => {
            compare_values(x, y)
        }
        (
            Value::Branded {
                brand: ba,
                fields: fa,
            },
            Value::Branded {
                brand: bb,
                fields: fb,
            },
        ) => ba.cmp(bb).then_with(|| compare_fields(fa, fb)),
        // Equal ranks always mean equal variants.
        _ => Ordering::Equal,
    }
}

/// `compare_values(a, b) == Equal`.
pub fn equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// `-0.0` and `0.0` are equal; NaNs sit at the ends of the order.
fn compare_floats(x: f64, y: f64) -> Ordering {
    x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y))
}

fn compare_seqs(xs: &[Value], ys: &[Value]) -> Ordering {
    let mut xs = xs.to_vec();
    let mut ys = ys.to_vec();
    xs.sort_by(compare_values);
    ys.sort_by(compare_values);
    for (x, y) in xs.iter().zip(ys.iter()) {
        let c = compare_values(x, y);
        if c != Ordering::Equal {
            return c;
        }
    }
    xs.len().cmp(&ys.len())
}

fn compare_fields(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> Ordering {
    let names: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    for name in names {
        match (a.get(name), b.get(name)) {
            (Some(x), Some(y)) => {
                let c = compare_values(x, y);
                if c != Ordering::Equal {
                    return c;
                }
            }
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }
    }
    Ordering::Equal
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_values(self, other)
    }
}
