//! JSON value helpers shared by the canonicalizer and the mapper.
//!
//! The comparison here is a total order in which numbers are compared by
//! value, so `1` and `1.0` are the same enum choice and the same `required`
//! entry regardless of how the document spelled them.
use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde_json::{Map, Number, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// The seven JSON Schema instance types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Floor,
    Ceil,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl JsonType {
    pub const ALL: [JsonType; 7] = [
        JsonType::Null,
        JsonType::Boolean,
        JsonType::Object,
        JsonType::Array,
        JsonType::String,
        JsonType::Number,
        JsonType::Integer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        JsonType::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    /// Keywords that constrain numbers constrain integers too.
    pub fn widen(self) -> Self {
        match self {
            JsonType::Integer => JsonType::Number,
            other => other,
        }
    }
}

/// The most specific type of an instance; integral numbers report `Integer`.
pub fn type_of(value: &Value) -> JsonType {
    match value {
        Value::Null => JsonType::Null,
        Value::Bool(_) => JsonType::Boolean,
        Value::Number(_) if is_integral(value) => JsonType::Integer,
        Value::Number(_) => JsonType::Number,
        Value::String(_) => JsonType::String,
        Value::Array(_) => JsonType::Array,
        Value::Object(_) => JsonType::Object,
    }
}

/// Whether `value` validates against `{"type": ty}`.
pub fn is_instance_of(value: &Value, ty: JsonType) -> bool {
    match ty {
        JsonType::Integer => is_integral(value),
        JsonType::Number => value.is_number(),
        other => type_of(value) == other,
    }
}

pub fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

pub fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r),
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Array(l), Value::Array(r)) => {
            for (x, y) in l.iter().zip(r) {
                let ord = compare(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            l.len().cmp(&r.len())
        }
        (Value::Object(l), Value::Object(r)) => compare_objects(l, r),
        _ => rank(left).cmp(&rank(right)),
    }
}

pub fn equal(left: &Value, right: &Value) -> bool {
    compare(left, right) == Ordering::Equal
}

pub fn has_duplicates(values: &[Value]) -> bool {
    let mut sorted = values.iter().collect::<Vec<_>>();
    sorted.sort_by(|l, r| compare(l, r));
    sorted.windows(2).any(|pair| equal(pair[0], pair[1]))
}

/// Stable sort followed by removal of equal neighbours.
pub fn sort_unique(values: &[Value]) -> Vec<Value> {
    let mut out = values.to_vec();
    out.sort_by(compare);
    out.dedup_by(|l, r| equal(l, r));
    out
}

/// Round a JSON number to an integer JSON number. Integers pass through.
pub fn round(value: &Value, rounding: Rounding) -> Option<Value> {
    let Value::Number(n) = value else { return None };
    if n.is_i64() || n.is_u64() {
        return Some(value.clone());
    }
    let real = n.as_f64()?;
    let rounded = match rounding {
        Rounding::Floor => real.floor(),
        Rounding::Ceil => real.ceil(),
    };
    integer_value(rounded)
}

/// Integer view of a JSON number, rounding reals in the given direction.
/// `None` when the result does not fit an `i64`.
pub fn integer_bound(value: &Value, rounding: Rounding) -> Option<i64> {
    let Value::Number(n) = value else { return None };
    if let Some(exact) = n.as_i64() {
        return Some(exact);
    }
    if n.is_u64() {
        return None;
    }
    let real = n.as_f64()?;
    let rounded = match rounding {
        Rounding::Floor => real.floor(),
        Rounding::Ceil => real.ceil(),
    };
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Add `delta` to an integral JSON number.
pub fn offset(value: &Value, delta: i64) -> Option<Value> {
    if !is_integral(value) {
        return None;
    }
    integer_bound(value, Rounding::Floor)?
        .checked_add(delta)
        .map(Value::from)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    fn exact(n: &Number) -> Option<i128> {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    }
    match (exact(left), exact(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => {
            let l = OrderedFloat(left.as_f64().unwrap_or(f64::NAN));
            let r = OrderedFloat(right.as_f64().unwrap_or(f64::NAN));
            l.cmp(&r)
        }
    }
}

fn compare_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> Ordering {
    let mut l = left.iter().collect::<Vec<_>>();
    let mut r = right.iter().collect::<Vec<_>>();
    l.sort_by(|a, b| a.0.cmp(b.0));
    r.sort_by(|a, b| a.0.cmp(b.0));
    for ((lk, lv), (rk, rv)) in l.iter().zip(&r) {
        let ord = lk.cmp(rk).then_with(|| compare(lv, rv));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    l.len().cmp(&r.len())
}

fn integer_value(real: f64) -> Option<Value> {
    if !real.is_finite() {
        return None;
    }
    if real >= i64::MIN as f64 && real < i64::MAX as f64 {
        Some(Value::from(real as i64))
    } else if real >= 0.0 && real < u64::MAX as f64 {
        Some(Value::from(real as u64))
    } else {
        Number::from_f64(real).map(Value::Number)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
