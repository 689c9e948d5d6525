//! Finite integer domains implied by `minimum`, `maximum` and `multipleOf`.
use serde_json::Value;

use crate::json::{self, Rounding};
use crate::schema::{Vocabularies, vocabulary};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplier {
    Absent,
    /// Absolute value of an integral, non-zero `multipleOf`.
    Integral(u64),
    /// Real or zero `multipleOf`; no integer strategy handles these.
    Unsupported,
}

/// `minimum`, rounded up to the nearest integer.
pub fn integer_minimum(schema: &Value) -> Option<i64> {
    json::integer_bound(schema.get("minimum")?, Rounding::Ceil)
}

/// `maximum`, rounded down to the nearest integer.
pub fn integer_maximum(schema: &Value) -> Option<i64> {
    json::integer_bound(schema.get("maximum")?, Rounding::Floor)
}

pub fn multiplier(schema: &Value) -> Multiplier {
    match schema.get("multipleOf") {
        None => Multiplier::Absent,
        Some(value) if json::is_integral(value) => {
            match json::integer_bound(value, Rounding::Floor) {
                Some(m) if m != 0 => Multiplier::Integral(m.unsigned_abs()),
                _ => Multiplier::Unsupported,
            }
        }
        Some(_) => Multiplier::Unsupported,
    }
}

/// How many multiples of `multiplier` lie in `[minimum, maximum]`.
pub fn count_states(minimum: i64, maximum: i64, multiplier: u64) -> u128 {
    if multiplier == 0 || minimum > maximum {
        return 0;
    }
    let step = i128::from(multiplier);
    let first = i128::from(minimum).div_euclid(step)
        + i128::from(i128::from(minimum).rem_euclid(step) != 0);
    let last = i128::from(maximum).div_euclid(step);
    if last < first { 0 } else { (last - first + 1) as u128 }
}

/// Byte-fit: the largest state index, `states - 1`, fits in an unsigned byte.
pub fn fits_in_byte(states: u128) -> bool {
    states.saturating_sub(1) <= u128::from(u8::MAX)
}

/// Every integer admitted by the bounds and multiplier of `schema`, in
/// ascending order. `None` when either bound is missing, when the multiplier
/// is not an integer, or when the validation vocabulary is inactive.
///
/// The domain is materialized, so callers check [`count_states`] first when
/// the range may be wide.
pub fn states_integer(schema: &Value, vocabularies: &Vocabularies) -> Option<Vec<i64>> {
    if !vocabularies.contains(vocabulary::VALIDATION) {
        return None;
    }
    let minimum = integer_minimum(schema)?;
    let maximum = integer_maximum(schema)?;
    let step = match multiplier(schema) {
        Multiplier::Absent => 1,
        Multiplier::Integral(m) => m,
        Multiplier::Unsupported => return None,
    };
    if minimum > maximum {
        return Some(Vec::new());
    }
    let step = i128::from(step);
    let first = i128::from(minimum).div_euclid(step)
        + i128::from(i128::from(minimum).rem_euclid(step) != 0);
    let last = i128::from(maximum).div_euclid(step);
    Some(
        (first..=last)
            .filter_map(|k| i64::try_from(k * step).ok())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn validation() -> Vocabularies {
        Vocabularies::from_iter([vocabulary::CORE, vocabulary::VALIDATION])
    }

    #[test]
    fn plain_range() {
        let states = states_integer(&json!({"type": "integer", "minimum": 1, "maximum": 5}), &validation());
        assert_eq!(states, Some(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn real_bounds_shrink_inwards() {
        let states = states_integer(&json!({"minimum": 0.5, "maximum": 5.5}), &validation());
        assert_eq!(states, Some(vec![1, 2, 3, 4, 5]));
        let states = states_integer(&json!({"minimum": -2.5, "maximum": -0.2}), &validation());
        assert_eq!(states, Some(vec![-2, -1]));
    }

    #[test]
    fn multiplier_sign_is_ignored() {
        let schema = json!({"minimum": -10, "maximum": 12, "multipleOf": -5});
        assert_eq!(states_integer(&schema, &validation()), Some(vec![-10, -5, 0, 5, 10]));
        assert_eq!(multiplier(&schema), Multiplier::Integral(5));
    }

    #[test]
    fn unsupported_domains() {
        let vocabs = validation();
        assert_eq!(states_integer(&json!({"minimum": 1, "maximum": 10, "multipleOf": 2.5}), &vocabs), None);
        assert_eq!(states_integer(&json!({"minimum": 1}), &vocabs), None);
        assert_eq!(states_integer(&json!({"maximum": 1}), &vocabs), None);
        assert_eq!(states_integer(&json!({"minimum": 1, "maximum": 3, "multipleOf": 0}), &vocabs), None);
        let core = Vocabularies::from_iter([vocabulary::CORE]);
        assert_eq!(states_integer(&json!({"minimum": 1, "maximum": 3}), &core), None);
    }

    #[test]
    fn empty_domain() {
        assert_eq!(states_integer(&json!({"minimum": 5, "maximum": 3}), &validation()), Some(vec![]));
        assert_eq!(states_integer(&json!({"minimum": 1, "maximum": 4, "multipleOf": 5}), &validation()), Some(vec![]));
        assert_eq!(count_states(1, 4, 5), 0);
    }

    #[test]
    fn counting_agrees_with_enumeration() {
        for (minimum, maximum, step) in [(-7, 19, 3), (0, 0, 1), (-100, -1, 7), (3, 300, 2)] {
            let schema = json!({"minimum": minimum, "maximum": maximum, "multipleOf": step});
            let states = states_integer(&schema, &validation()).unwrap();
            assert_eq!(count_states(minimum, maximum, step as u64), states.len() as u128);
        }
    }

    #[test]
    fn byte_fit_boundary() {
        assert!(fits_in_byte(count_states(0, 255, 1)));
        assert!(!fits_in_byte(count_states(0, 256, 1)));
        assert!(fits_in_byte(count_states(0, 510, 2)));
        assert!(!fits_in_byte(count_states(0, 512, 2)));
        assert!(!fits_in_byte(count_states(i64::MIN, i64::MAX, 1)));
    }
}
