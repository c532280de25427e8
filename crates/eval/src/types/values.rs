//! Runtime value types and the JSON wire codec.

use std::collections::BTreeMap;
use std::fmt;

use time::OffsetDateTime;

use super::EvalError;
use crate::primitives::datetime;

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// Dynamically typed runtime value.
///
/// Naturals and floats are distinct kinds and are never coerced into each
/// other implicitly. Equality and ordering are structural (see
/// [`crate::compare`]): sequences compare as sorted multisets and record
/// field order is irrelevant.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    /// Boxed integer (`$nat` on the wire).
    Nat(i64),
    Float(f64),
    Str(String),
    /// Absolute instant with its fixed UTC offset.
    DateTime(OffsetDateTime),
    Seq(Vec<Value>),
    Record(BTreeMap<String, Value>),
    Left(Box<Value>),
    Right(Box<Value>),
    /// Record tagged with a nominal brand.
    Branded {
        brand: String,
        fields: BTreeMap<String, Value>,
    },
}

impl Value {
    /// Returns a human-readable kind name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Bool(_) => "Bool",
            Value::Nat(_) => "Nat",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::DateTime(_) => "DateTime",
            Value::Seq(_) => "Sequence",
            Value::Record(_) => "Record",
            Value::Left(_) => "Left",
            Value::Right(_) => "Right",
            Value::Branded { .. } => "Branded",
        }
    }

    pub fn text(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn left(v: Value) -> Value {
        Value::Left(Box::new(v))
    }

    pub fn right(v: Value) -> Value {
        Value::Right(Box::new(v))
    }

    /// Build a record from `(name, value)` pairs.
    pub fn record<K, I>(fields: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a branded record from `(name, value)` pairs.
    pub fn branded<K, I>(brand: impl Into<String>, fields: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Branded {
            brand: brand.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The brand of a branded value.
    pub fn brand(&self) -> Option<&str> {
        match self {
            Value::Branded { brand, .. } => Some(brand),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(type_error("Bool", other)),
        }
    }

    pub fn as_nat(&self) -> Result<i64, EvalError> {
        match self {
            Value::Nat(n) => Ok(*n),
            other => Err(type_error("Nat", other)),
        }
    }

    pub fn as_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Float(f) => Ok(*f),
            other => Err(type_error("Float", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(type_error("Str", other)),
        }
    }

    pub fn as_date_time(&self) -> Result<OffsetDateTime, EvalError> {
        match self {
            Value::DateTime(dt) => Ok(*dt),
            other => Err(type_error("DateTime", other)),
        }
    }

    pub fn as_seq(&self) -> Result<&[Value], EvalError> {
        match self {
            Value::Seq(items) => Ok(items),
            other => Err(type_error("Sequence", other)),
        }
    }

    pub fn into_seq(self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::Seq(items) => Ok(items),
            other => Err(type_error("Sequence", &other)),
        }
    }

    /// Fields of an unbranded record.
    pub fn as_record(&self) -> Result<&BTreeMap<String, Value>, EvalError> {
        match self {
            Value::Record(fields) => Ok(fields),
            other => Err(EvalError::NotARecord {
                message: format!("expected Record, got {}", other.type_name()),
            }),
        }
    }

    /// Field lookup on an unbranded record (`recDot`).
    pub fn dot(&self, field: &str) -> Result<&Value, EvalError> {
        self.as_record()?
            .get(field)
            .ok_or_else(|| EvalError::MissingField {
                field: field.to_string(),
            })
    }
}

pub(crate) fn type_error(expected: &str, got: &Value) -> EvalError {
    EvalError::TypeError {
        message: format!("expected {}, got {}", expected, got.type_name()),
    }
}

/// Structural text: the compact wire JSON of the value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", value_to_wire(self))
    }
}

// ──────────────────────────────────────────────
// Wire codec
// ──────────────────────────────────────────────

const NAT_TAG: &str = "$nat";
const LEFT_TAG: &str = "$left";
const RIGHT_TAG: &str = "$right";
const CLASS_TAG: &str = "$class";
const DATA_TAG: &str = "$data";
const DATETIME_TAG: &str = "$datetime";
const FLOAT_TAG: &str = "$float";
const RECORD_TAG: &str = "$record";

impl Value {
    /// Decode a value from its wire JSON.
    pub fn from_wire(v: &serde_json::Value) -> Result<Value, EvalError> {
        match v {
            serde_json::Value::Null => Ok(Value::Unit),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| EvalError::DeserializeError {
                        message: format!("number {} is not representable as a float", n),
                    })
            }
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Array(items) => {
                let items: Result<Vec<Value>, _> = items.iter().map(Value::from_wire).collect();
                Ok(Value::Seq(items?))
            }
            serde_json::Value::Object(obj) => {
                if obj.len() == 1 {
                    if let Some(n) = obj.get(NAT_TAG) {
                        let n = n.as_i64().ok_or_else(|| EvalError::DeserializeError {
                            message: format!("'$nat' must hold an integer, got {}", n),
                        })?;
                        return Ok(Value::Nat(n));
                    }
                    if let Some(inner) = obj.get(LEFT_TAG) {
                        return Ok(Value::left(Value::from_wire(inner)?));
                    }
                    if let Some(inner) = obj.get(RIGHT_TAG) {
                        return Ok(Value::right(Value::from_wire(inner)?));
                    }
                    if let Some(s) = obj.get(DATETIME_TAG) {
                        let s = s.as_str().ok_or_else(|| EvalError::DeserializeError {
                            message: "'$datetime' must hold a string".to_string(),
                        })?;
                        return datetime::parse_date_time(s).map(Value::DateTime);
                    }
                    if let Some(f) = obj.get(FLOAT_TAG) {
                        return parse_special_float(f);
                    }
                    if let Some(inner) = obj.get(RECORD_TAG) {
                        let inner = inner.as_object().ok_or_else(|| EvalError::DeserializeError {
                            message: "'$record' must hold an object".to_string(),
                        })?;
                        return fields_from_wire(inner).map(Value::Record);
                    }
                }
                if let Some(class) = obj.get(CLASS_TAG) {
                    return parse_branded(class, obj.get(DATA_TAG));
                }
                fields_from_wire(obj).map(Value::Record)
            }
        }
    }
}

fn fields_from_wire(
    obj: &serde_json::Map<String, serde_json::Value>,
) -> Result<BTreeMap<String, Value>, EvalError> {
    let mut fields = BTreeMap::new();
    for (k, fv) in obj {
        fields.insert(k.clone(), Value::from_wire(fv)?);
    }
    Ok(fields)
}

/// Non-finite floats: `{"$float": "inf" | "-inf" | "nan"}`.
fn parse_special_float(v: &serde_json::Value) -> Result<Value, EvalError> {
    match v.as_str() {
        Some("inf") => Ok(Value::Float(f64::INFINITY)),
        Some("-inf") => Ok(Value::Float(f64::NEG_INFINITY)),
        Some("nan") => Ok(Value::Float(f64::NAN)),
        _ => Err(EvalError::DeserializeError {
            message: format!("'$float' must be \"inf\", \"-inf\" or \"nan\", got {}", v),
        }),
    }
}

fn special_float_to_wire(f: f64) -> serde_json::Value {
    let name = if f.is_nan() {
        "nan"
    } else if f > 0.0 {
        "inf"
    } else {
        "-inf"
    };
    serde_json::json!({ FLOAT_TAG: name })
}

fn parse_branded(
    class: &serde_json::Value,
    data: Option<&serde_json::Value>,
) -> Result<Value, EvalError> {
    let brand = match class {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(brands) => match brands.as_slice() {
            [serde_json::Value::String(s)] => s.clone(),
            _ => {
                return Err(EvalError::DeserializeError {
                    message: format!("'$class' must name exactly one brand, got {}", class),
                })
            }
        },
        other => {
            return Err(EvalError::DeserializeError {
                message: format!("'$class' must be a string, got {}", other),
            })
        }
    };
    let data = data
        .and_then(|d| d.as_object())
        .ok_or_else(|| EvalError::DeserializeError {
            message: format!("branded value '{}' missing '$data' object", brand),
        })?;
    let fields = fields_from_wire(data)?;
    Ok(Value::Branded { brand, fields })
}

/// Encode a runtime value as wire JSON.
pub fn value_to_wire(v: &Value) -> serde_json::Value {
    match v {
        Value::Unit => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Nat(n) => serde_json::json!({ NAT_TAG: n }),
        // Non-finite floats have no JSON number form.
        Value::Float(f) => match serde_json::Number::from_f64(*f) {
            Some(n) => serde_json::Value::Number(n),
            None => special_float_to_wire(*f),
        },
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(dt) => serde_json::json!({ DATETIME_TAG: datetime::format_date_time(*dt) }),
        Value::Seq(items) => serde_json::Value::Array(items.iter().map(value_to_wire).collect()),
        Value::Record(fields) if fields.keys().any(|k| k.starts_with('$')) => {
            serde_json::json!({ RECORD_TAG: fields_to_wire(fields) })
        }
        Value::Record(fields) => fields_to_wire(fields),
        Value::Left(inner) => serde_json::json!({ LEFT_TAG: value_to_wire(inner) }),
        Value::Right(inner) => serde_json::json!({ RIGHT_TAG: value_to_wire(inner) }),
        Value::Branded { brand, fields } => serde_json::json!({
            CLASS_TAG: brand,
            DATA_TAG: fields_to_wire(fields),
        }),
    }
}

fn fields_to_wire(fields: &BTreeMap<String, Value>) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), value_to_wire(v)))
        .collect();
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nat_and_float_stay_distinct() {
        assert!(matches!(
            Value::from_wire(&json!({"$nat": 3})).unwrap(),
            Value::Nat(3)
        ));
        assert!(matches!(
            Value::from_wire(&json!(3)).unwrap(),
            Value::Float(f) if f == 3.0
        ));
    }

    #[test]
    fn nat_rejects_fraction() {
        assert!(Value::from_wire(&json!({"$nat": 1.5})).is_err());
    }

    #[test]
    fn branded_accepts_single_element_class_array() {
        let v = Value::from_wire(&json!({
            "$class": ["org.example.Request"],
            "$data": {"goodsValue": 10.0}
        }))
        .unwrap();
        assert_eq!(v.brand(), Some("org.example.Request"));
    }

    #[test]
    fn branded_rejects_multiple_brands() {
        let err = Value::from_wire(&json!({
            "$class": ["A", "B"],
            "$data": {}
        }))
        .unwrap_err();
        assert!(matches!(err, EvalError::DeserializeError { .. }));
    }

    #[test]
    fn branded_requires_data_object() {
        assert!(Value::from_wire(&json!({"$class": "A", "$data": 1})).is_err());
        assert!(Value::from_wire(&json!({"$class": "A"})).is_err());
    }

    #[test]
    fn tag_with_siblings_is_a_plain_record() {
        let v = Value::from_wire(&json!({"$left": 1, "other": 2})).unwrap();
        assert_eq!(v.as_record().unwrap().len(), 2);
    }

    #[test]
    fn sums_and_datetimes_decode() {
        let v = Value::from_wire(&json!({"$right": {"$left": "days"}})).unwrap();
        match v {
            Value::Right(inner) => assert!(matches!(*inner, Value::Left(_))),
            other => panic!("expected Right, got {:?}", other),
        }
        let dt = Value::from_wire(&json!({"$datetime": "2026-03-01T12:00:00Z"})).unwrap();
        assert_eq!(dt.type_name(), "DateTime");
    }

    #[test]
    fn wire_encoding_is_stable() {
        let v = Value::branded(
            "org.example.Response",
            [
                ("penalty", Value::Float(200.0)),
                ("count", Value::Nat(2)),
                ("maybe", Value::right(Value::Unit)),
            ],
        );
        assert_eq!(
            value_to_wire(&v),
            json!({
                "$class": "org.example.Response",
                "$data": {"count": {"$nat": 2}, "maybe": {"$right": null}, "penalty": 200.0}
            })
        );
    }

    #[test]
    fn non_finite_floats_keep_their_kind() {
        for f in [f64::INFINITY, f64::NEG_INFINITY] {
            let wire = value_to_wire(&Value::Float(f));
            assert_eq!(Value::from_wire(&wire).unwrap().as_float().unwrap(), f);
        }
        assert_eq!(
            value_to_wire(&Value::Float(f64::INFINITY)),
            json!({"$float": "inf"})
        );
        let nan = Value::from_wire(&value_to_wire(&Value::Float(f64::NAN))).unwrap();
        assert!(nan.as_float().unwrap().is_nan());
        assert!(Value::from_wire(&json!({"$float": "huge"})).is_err());
    }

    #[test]
    fn dollar_named_fields_stay_records() {
        let records = [
            Value::record([("$left", Value::Nat(1))]),
            Value::record([("$nat", Value::Nat(1))]),
            Value::record([("$datetime", Value::text("2026-03-01"))]),
            Value::record([("$record", Value::Unit)]),
            Value::record([
                ("$class", Value::text("A")),
                ("$data", Value::record([("x", Value::Unit)])),
            ]),
        ];
        for rec in records {
            let wire = value_to_wire(&rec);
            let back = Value::from_wire(&wire).unwrap();
            assert_eq!(back.type_name(), "Record", "{}", wire);
            assert_eq!(back, rec);
        }
        // Plain field names keep the bare object form.
        assert_eq!(
            value_to_wire(&Value::record([("a", Value::Bool(true))])),
            json!({"a": true})
        );
    }

    #[test]
    fn display_is_structural_json() {
        let v = Value::record([("message", Value::text("boom"))]);
        assert_eq!(v.to_string(), r#"{"message":"boom"}"#);
    }

    #[test]
    fn dot_requires_record() {
        let rec = Value::record([("a", Value::Bool(true))]);
        assert!(rec.dot("a").unwrap().as_bool().unwrap());
        assert!(matches!(
            rec.dot("b"),
            Err(EvalError::MissingField { .. })
        ));
        let branded = Value::branded("B", [("a", Value::Bool(true))]);
        assert!(matches!(
            branded.dot("a"),
            Err(EvalError::NotARecord { .. })
        ));
    }
}
