//! Primitive operator library.
//!
//! Compiled logic names operators by string; names are resolved to the
//! closed [`Primitive`] enum when the bundle is loaded, with arity checked
//! there too, so evaluation never dispatches on strings.

pub mod collections;
pub mod datetime;
pub mod duration;
pub mod either;
pub mod numeric;
pub mod strings;

use std::cmp::Ordering;

use crate::compare;
use crate::types::{EvalError, Value};

macro_rules! primitives {
    ($($variant:ident => $name:literal / $arity:literal,)+) => {
        /// A primitive operator and its fixed arity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Primitive {
            $($variant,)+
        }

        impl Primitive {
            pub const ALL: &'static [Primitive] = &[$(Primitive::$variant,)+];

            /// Name used in interchange JSON.
            pub fn name(self) -> &'static str {
                match self {
                    $(Primitive::$variant => $name,)+
                }
            }

            pub fn arity(self) -> usize {
                match self {
                    $(Primitive::$variant => $arity,)+
                }
            }
        }
    };
}

primitives! {
    // logic and equality
    And => "and" / 2,
    Or => "or" / 2,
    Not => "not" / 1,
    Equal => "equal" / 2,
    Compare => "compare" / 2,
    // naturals
    NatPlus => "nat_plus" / 2,
    NatMinus => "nat_minus" / 2,
    NatMult => "nat_mult" / 2,
    NatDiv => "nat_div" / 2,
    NatRem => "nat_rem" / 2,
    NatMin => "nat_min" / 2,
    NatMax => "nat_max" / 2,
    NatAbs => "nat_abs" / 1,
    NatLt => "nat_lt" / 2,
    NatLe => "nat_le" / 2,
    NatGt => "nat_gt" / 2,
    NatGe => "nat_ge" / 2,
    NatSum => "nat_sum" / 1,
    // floats
    FloatPlus => "float_plus" / 2,
    FloatMinus => "float_minus" / 2,
    FloatMult => "float_mult" / 2,
    FloatDiv => "float_div" / 2,
    FloatPow => "float_pow" / 2,
    FloatMin => "float_min" / 2,
    FloatMax => "float_max" / 2,
    FloatNeg => "float_neg" / 1,
    FloatAbs => "float_abs" / 1,
    FloatSqrt => "float_sqrt" / 1,
    FloatFloor => "float_floor" / 1,
    FloatCeil => "float_ceil" / 1,
    FloatLt => "float_lt" / 2,
    FloatLe => "float_le" / 2,
    FloatGt => "float_gt" / 2,
    FloatGe => "float_ge" / 2,
    FloatSum => "float_sum" / 1,
    FloatMean => "float_mean" / 1,
    FloatOfNat => "float_of_nat" / 1,
    NatOfFloat => "nat_of_float" / 1,
    // strings
    StrConcat => "str_concat" / 2,
    StrLength => "str_length" / 1,
    Substring => "substring" / 3,
    StrJoin => "str_join" / 2,
    StrContains => "str_contains" / 2,
    ToText => "to_string" / 1,
    // collections
    Union => "union" / 2,
    Minus => "minus" / 2,
    Min => "min" / 2,
    Max => "max" / 2,
    Distinct => "distinct" / 1,
    Sort => "sort" / 2,
    Flatten => "flatten" / 1,
    Nth => "nth" / 2,
    Count => "count" / 1,
    Contains => "contains" / 2,
    Singleton => "singleton" / 1,
    // date-times
    DateTimeParse => "date_time_parse" / 1,
    DateTimeFormat => "date_time_format" / 1,
    DateTimeDiff => "date_time_diff" / 2,
    DateTimeAdd => "date_time_add" / 2,
    DateTimeSubtract => "date_time_subtract" / 2,
    DateTimeIsBefore => "date_time_is_before" / 2,
    DateTimeIsAfter => "date_time_is_after" / 2,
    DateTimeIsSame => "date_time_is_same" / 2,
    DateTimeMin => "date_time_min" / 2,
    DateTimeMax => "date_time_max" / 2,
    DateTimeYear => "date_time_year" / 1,
    DateTimeMonth => "date_time_month" / 1,
    DateTimeDay => "date_time_day" / 1,
    // durations
    DurationSeconds => "duration_seconds" / 1,
    DurationAmount => "duration_amount" / 1,
    DurationUnit => "duration_unit" / 1,
    DurationConvert => "duration_convert" / 2,
    DurationAdd => "duration_add" / 2,
    DurationSubtract => "duration_subtract" / 2,
    DurationCompare => "duration_compare" / 2,
    // either / error helpers
    IsLeft => "is_left" / 1,
    UnwrapLeft => "unwrap_left" / 1,
    UnwrapRight => "unwrap_right" / 1,
    ErrorMessage => "error_message" / 1,
}

impl Primitive {
    /// Resolve an interchange operator name.
    pub fn from_name(name: &str) -> Result<Primitive, EvalError> {
        Primitive::ALL
            .iter()
            .copied()
            .find(|p| p.name() == name)
            .ok_or_else(|| EvalError::UnknownPrimitive {
                name: name.to_string(),
            })
    }

    pub fn check_arity(self, got: usize) -> Result<(), EvalError> {
        if got != self.arity() {
            return Err(EvalError::Arity {
                op: self.name().to_string(),
                expected: self.arity(),
                got,
            });
        }
        Ok(())
    }

    /// Apply the operator to already evaluated arguments.
    pub fn apply(self, args: &[Value]) -> Result<Value, EvalError> {
        self.check_arity(args.len())?;
        use Primitive::*;
        match self {
            And => Ok(Value::Bool(args[0].as_bool()? && args[1].as_bool()?)),
            Or => Ok(Value::Bool(args[0].as_bool()? || args[1].as_bool()?)),
            Not => Ok(Value::Bool(!args[0].as_bool()?)),
            Equal => Ok(Value::Bool(compare::equal(&args[0], &args[1]))),
            Compare => Ok(Value::Nat(ordering_to_nat(compare::compare_values(
                &args[0], &args[1],
            )))),

            NatPlus => numeric::nat_arith("nat_plus", &args[0], &args[1], i64::checked_add),
            NatMinus => numeric::nat_arith("nat_minus", &args[0], &args[1], i64::checked_sub),
            NatMult => numeric::nat_arith("nat_mult", &args[0], &args[1], i64::checked_mul),
            NatDiv => numeric::nat_div(&args[0], &args[1]),
            NatRem => numeric::nat_rem(&args[0], &args[1]),
            NatMin => Ok(Value::Nat(args[0].as_nat()?.min(args[1].as_nat()?))),
            NatMax => Ok(Value::Nat(args[0].as_nat()?.max(args[1].as_nat()?))),
            NatAbs => numeric::nat_abs(&args[0]),
            NatLt => numeric::nat_cmp(&args[0], &args[1], Ordering::is_lt),
            NatLe => numeric::nat_cmp(&args[0], &args[1], Ordering::is_le),
            NatGt => numeric::nat_cmp(&args[0], &args[1], Ordering::is_gt),
            NatGe => numeric::nat_cmp(&args[0], &args[1], Ordering::is_ge),
            NatSum => numeric::nat_sum(&args[0]),

            FloatPlus => numeric::float_arith(&args[0], &args[1], |a, b| a + b),
            FloatMinus => numeric::float_arith(&args[0], &args[1], |a, b| a - b),
            FloatMult => numeric::float_arith(&args[0], &args[1], |a, b| a * b),
            FloatDiv => numeric::float_arith(&args[0], &args[1], |a, b| a / b),
            FloatPow => numeric::float_arith(&args[0], &args[1], f64::powf),
            FloatMin => numeric::float_arith(&args[0], &args[1], f64::min),
            FloatMax => numeric::float_arith(&args[0], &args[1], f64::max),
            FloatNeg => numeric::float_unary(&args[0], |a| -a),
            FloatAbs => numeric::float_unary(&args[0], f64::abs),
            FloatSqrt => numeric::float_unary(&args[0], f64::sqrt),
            FloatFloor => numeric::float_unary(&args[0], f64::floor),
            FloatCeil => numeric::float_unary(&args[0], f64::ceil),
            FloatLt => numeric::float_cmp(&args[0], &args[1], |a, b| a < b),
            FloatLe => numeric::float_cmp(&args[0], &args[1], |a, b| a <= b),
            FloatGt => numeric::float_cmp(&args[0], &args[1], |a, b| a > b),
            FloatGe => numeric::float_cmp(&args[0], &args[1], |a, b| a >= b),
            FloatSum => numeric::float_sum(&args[0]),
            FloatMean => numeric::float_mean(&args[0]),
            FloatOfNat => Ok(Value::Float(args[0].as_nat()? as f64)),
            NatOfFloat => numeric::nat_of_float(&args[0]),

            StrConcat => strings::concat(&args[0], &args[1]),
            StrLength => strings::length(&args[0]),
            Substring => strings::substring(&args[0], &args[1], &args[2]),
            StrJoin => strings::join(&args[0], &args[1]),
            StrContains => strings::contains(&args[0], &args[1]),
            ToText => Ok(strings::to_string(&args[0])),

            Union => collections::union(&args[0], &args[1]),
            Minus => collections::minus(&args[0], &args[1]),
            Min => collections::min(&args[0], &args[1]),
            Max => collections::max(&args[0], &args[1]),
            Distinct => collections::distinct(&args[0]),
            Sort => collections::sort(&args[0], &args[1]),
            Flatten => collections::flatten(&args[0]),
            Nth => collections::nth(&args[0], &args[1]),
            Count => collections::count(&args[0]),
            Contains => collections::contains(&args[0], &args[1]),
            Singleton => collections::singleton(&args[0]),

            DateTimeParse => datetime::parse(&args[0]),
            DateTimeFormat => datetime::format(&args[0]),
            DateTimeDiff => datetime::diff(&args[0], &args[1]),
            DateTimeAdd => datetime::add(&args[0], &args[1]),
            DateTimeSubtract => datetime::subtract(&args[0], &args[1]),
            DateTimeIsBefore => datetime::is_before(&args[0], &args[1]),
            DateTimeIsAfter => datetime::is_after(&args[0], &args[1]),
            DateTimeIsSame => datetime::is_same(&args[0], &args[1]),
            DateTimeMin => datetime::min(&args[0], &args[1]),
            DateTimeMax => datetime::max(&args[0], &args[1]),
            DateTimeYear => datetime::year(&args[0]),
            DateTimeMonth => datetime::month(&args[0]),
            DateTimeDay => datetime::day(&args[0]),

            DurationSeconds => Ok(duration::make_duration(
                args[0].as_nat()?,
                duration::TemporalUnit::Seconds,
            )),
            DurationAmount => Ok(Value::Nat(duration::read_duration(&args[0])?.0)),
            DurationUnit => Ok(duration::read_duration(&args[0])?.1.to_value()),
            DurationConvert => duration::convert(&args[0], &args[1]),
            DurationAdd => duration::add(&args[0], &args[1]),
            DurationSubtract => duration::subtract(&args[0], &args[1]),
            DurationCompare => duration::compare(&args[0], &args[1]),

            IsLeft => either::is_left(&args[0]),
            UnwrapLeft => either::unwrap_left(&args[0]),
            UnwrapRight => either::unwrap_right(&args[0]),
            ErrorMessage => Ok(either::error_message(&args[0])),
        }
    }
}

pub(crate) fn ordering_to_nat(o: Ordering) -> i64 {
    match o {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}
