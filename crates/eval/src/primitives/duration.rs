//! Durations and temporal units.
//!
//! A duration is a branded record `{amount: Nat, unit: TemporalUnit}`.
//! A temporal unit travels as a nested sum: its ordinal is the number of
//! `Right` wrappers around a terminal `Left(name)`, so `seconds` is
//! `Left("seconds")` and `days` is `Right(Right(Right(Left("days"))))`.
//!
//! Unit conversion is one lookup in the seconds-per-unit table followed by
//! a single multiply (finer target) or floor division (coarser target).

use crate::primitives::ordering_to_nat;
use crate::types::{EvalError, Value};

pub const DURATION_BRAND: &str = "org.accordproject.time.Duration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemporalUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TemporalUnit {
    pub const ALL: [TemporalUnit; 5] = [
        TemporalUnit::Seconds,
        TemporalUnit::Minutes,
        TemporalUnit::Hours,
        TemporalUnit::Days,
        TemporalUnit::Weeks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemporalUnit::Seconds => "seconds",
            TemporalUnit::Minutes => "minutes",
            TemporalUnit::Hours => "hours",
            TemporalUnit::Days => "days",
            TemporalUnit::Weeks => "weeks",
        }
    }

    pub fn seconds(self) -> i64 {
        match self {
            TemporalUnit::Seconds => 1,
            TemporalUnit::Minutes => 60,
            TemporalUnit::Hours => 3_600,
            TemporalUnit::Days => 86_400,
            TemporalUnit::Weeks => 604_800,
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Result<TemporalUnit, EvalError> {
        TemporalUnit::ALL
            .iter()
            .copied()
            .find(|u| u.name() == name)
            .ok_or_else(|| EvalError::InvalidTemporalUnit {
                message: format!("unknown unit '{}'", name),
            })
    }

    /// Encode as nested sum.
    pub fn to_value(self) -> Value {
        let mut v = Value::left(Value::text(self.name()));
        for _ in 0..self.ordinal() {
            v = Value::right(v);
        }
        v
    }

    /// Decode from nested sum. A bare unit name is also accepted.
    pub fn from_value(v: &Value) -> Result<TemporalUnit, EvalError> {
        if let Value::Str(name) = v {
            return TemporalUnit::from_name(name);
        }
        let mut depth = 0;
        let mut cur = v;
        let terminal = loop {
            match cur {
                Value::Right(inner) => {
                    depth += 1;
                    cur = inner.as_ref();
                }
                Value::Left(payload) => break payload.as_ref(),
                // The last choice may drop its terminal Left.
                other if depth == TemporalUnit::ALL.len() - 1 => break other,
                other => {
                    return Err(EvalError::InvalidTemporalUnit {
                        message: format!("expected a nested sum, got {}", other.type_name()),
                    })
                }
            }
        };
        let unit = TemporalUnit::ALL
            .get(depth)
            .copied()
            .ok_or_else(|| EvalError::InvalidTemporalUnit {
                message: format!("ordinal {} out of range", depth),
            })?;
        // A named terminal must agree with its nesting depth.
        match terminal {
            Value::Str(name) if name != unit.name() => Err(EvalError::InvalidTemporalUnit {
                message: format!("'{}' encoded at the ordinal of '{}'", name, unit.name()),
            }),
            _ => Ok(unit),
        }
    }
}

/// Re-express `amount` of `from` in `to`: exact when `to` is finer,
/// floored when `to` is coarser.
pub fn convert_amount(amount: i64, from: TemporalUnit, to: TemporalUnit) -> Result<i64, EvalError> {
    let (f, t) = (from.seconds(), to.seconds());
    if f >= t {
        amount
            .checked_mul(f / t)
            .ok_or_else(|| EvalError::Overflow {
                message: format!("{} {} in {}", amount, from.name(), to.name()),
            })
    } else {
        Ok(amount.div_euclid(t / f))
    }
}

pub fn make_duration(amount: i64, unit: TemporalUnit) -> Value {
    Value::branded(
        DURATION_BRAND,
        [("amount", Value::Nat(amount)), ("unit", unit.to_value())],
    )
}

/// Read `(amount, unit)` from a branded or plain duration record.
pub fn read_duration(v: &Value) -> Result<(i64, TemporalUnit), EvalError> {
    let fields = match v {
        Value::Branded { fields, .. } | Value::Record(fields) => fields,
        other => {
            return Err(EvalError::TypeError {
                message: format!("expected Duration, got {}", other.type_name()),
            })
        }
    };
    let amount = fields
        .get("amount")
        .ok_or_else(|| EvalError::MissingField {
            field: "amount".to_string(),
        })?
        .as_nat()?;
    let unit = fields.get("unit").ok_or_else(|| EvalError::MissingField {
        field: "unit".to_string(),
    })?;
    Ok((amount, TemporalUnit::from_value(unit)?))
}

pub fn to_seconds(v: &Value) -> Result<i64, EvalError> {
    let (amount, unit) = read_duration(v)?;
    convert_amount(amount, unit, TemporalUnit::Seconds)
}

/// `duration_convert(unit, duration)`.
pub fn convert(unit: &Value, d: &Value) -> Result<Value, EvalError> {
    let to = TemporalUnit::from_value(unit)?;
    let (amount, from) = read_duration(d)?;
    Ok(make_duration(convert_amount(amount, from, to)?, to))
}

/// Both operands re-expressed in the finer of their two units.
fn aligned(a: &Value, b: &Value) -> Result<(i64, i64, TemporalUnit), EvalError> {
    let (xa, ua) = read_duration(a)?;
    let (xb, ub) = read_duration(b)?;
    let unit = ua.min(ub);
    Ok((
        convert_amount(xa, ua, unit)?,
        convert_amount(xb, ub, unit)?,
        unit,
    ))
}

pub fn add(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y, unit) = aligned(a, b)?;
    let sum = x.checked_add(y).ok_or_else(|| EvalError::Overflow {
        message: "duration_add".to_string(),
    })?;
    Ok(make_duration(sum, unit))
}

pub fn subtract(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y, unit) = aligned(a, b)?;
    let diff = x.checked_sub(y).ok_or_else(|| EvalError::Overflow {
        message: "duration_subtract".to_string(),
    })?;
    Ok(make_duration(diff, unit))
}

pub fn compare(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let (x, y, _) = aligned(a, b)?;
    Ok(Value::Nat(ordering_to_nat(x.cmp(&y))))
}
