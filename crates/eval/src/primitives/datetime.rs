//! Date-time operators.
//!
//! A date-time is an absolute instant carrying a fixed UTC offset.
//! Comparisons are by instant, so `2026-03-01T12:00:00Z` and
//! `2026-03-01T14:00:00+02:00` are the same moment.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::primitives::duration::{self, TemporalUnit};
use crate::types::{EvalError, Value};

/// Parse RFC 3339, a bare `YYYY-MM-DD` (midnight UTC) or a local
/// `YYYY-MM-DDTHH:MM:SS` (taken as UTC).
pub fn parse_date_time(s: &str) -> Result<OffsetDateTime, EvalError> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }
    if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        return Ok(date.midnight().assume_utc());
    }
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .map(PrimitiveDateTime::assume_utc)
    .map_err(|e| EvalError::InvalidDateTime {
        message: format!("'{}': {}", s, e),
    })
}

pub fn format_date_time(dt: OffsetDateTime) -> String {
    // Rfc3339 cannot express years outside 0..=9999.
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

pub fn parse(s: &Value) -> Result<Value, EvalError> {
    parse_date_time(s.as_str()?).map(Value::DateTime)
}

pub fn format(dt: &Value) -> Result<Value, EvalError> {
    Ok(Value::Str(format_date_time(dt.as_date_time()?)))
}

/// `a - b` as a duration in seconds.
pub fn diff(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let elapsed = a.as_date_time()? - b.as_date_time()?;
    Ok(duration::make_duration(
        elapsed.whole_seconds(),
        TemporalUnit::Seconds,
    ))
}

pub fn add(dt: &Value, d: &Value) -> Result<Value, EvalError> {
    let secs = duration::to_seconds(d)?;
    dt.as_date_time()?
        .checked_add(time::Duration::seconds(secs))
        .map(Value::DateTime)
        .ok_or_else(|| EvalError::Overflow {
            message: format!("date_time_add of {} seconds", secs),
        })
}

pub fn subtract(dt: &Value, d: &Value) -> Result<Value, EvalError> {
    let secs = duration::to_seconds(d)?;
    dt.as_date_time()?
        .checked_sub(time::Duration::seconds(secs))
        .map(Value::DateTime)
        .ok_or_else(|| EvalError::Overflow {
            message: format!("date_time_subtract of {} seconds", secs),
        })
}

pub fn is_before(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(a.as_date_time()? < b.as_date_time()?))
}

pub fn is_after(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(a.as_date_time()? > b.as_date_time()?))
}

pub fn is_same(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(a.as_date_time()? == b.as_date_time()?))
}

pub fn min(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::DateTime(a.as_date_time()?.min(b.as_date_time()?)))
}

pub fn max(a: &Value, b: &Value) -> Result<Value, EvalError> {
    Ok(Value::DateTime(a.as_date_time()?.max(b.as_date_time()?)))
}

pub fn year(dt: &Value) -> Result<Value, EvalError> {
    Ok(Value::Nat(i64::from(dt.as_date_time()?.year())))
}

pub fn month(dt: &Value) -> Result<Value, EvalError> {
    Ok(Value::Nat(i64::from(u8::from(dt.as_date_time()?.month()))))
}

pub fn day(dt: &Value) -> Result<Value, EvalError> {
    Ok(Value::Nat(i64::from(dt.as_date_time()?.day())))
}
