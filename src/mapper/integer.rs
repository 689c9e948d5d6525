//! Integer strategies, chosen by which bounds are known and whether the
//! bounded domain indexes into a single byte.
//!
//! Each strategy comes as a pair of rules, one for schemas without a
//! `multipleOf` and one for an integral `multipleOf`. A real or zero
//! `multipleOf` matches neither.
use serde_json::{Value, json};

use crate::encoding::make_encoding;
use crate::engine::Rule;
use crate::json::JsonType;
use crate::schema;
use crate::states::{self, Multiplier};

use super::is_mappable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    /// Both bounds, at most 256 states.
    Byte,
    /// Both bounds, more than 256 states.
    Wide,
    Lower,
    Upper,
    Unbound,
}

#[derive(Clone, Copy, Debug)]
struct Domain {
    minimum: Option<i64>,
    maximum: Option<i64>,
    multiplier: u64,
}

pub fn rules() -> Vec<Rule> {
    vec![
        integer_rule("integer_bounded_8_bit", Strategy::Byte, false),
        integer_rule("integer_bounded_multiplier_8_bit", Strategy::Byte, true),
        integer_rule("integer_bounded_greater_than_8_bit", Strategy::Wide, false),
        integer_rule("integer_bounded_multiplier_greater_than_8_bit", Strategy::Wide, true),
        integer_rule("integer_lower_bound", Strategy::Lower, false),
        integer_rule("integer_lower_bound_multiplier", Strategy::Lower, true),
        integer_rule("integer_upper_bound", Strategy::Upper, false),
        integer_rule("integer_upper_bound_multiplier", Strategy::Upper, true),
        integer_rule("integer_unbound", Strategy::Unbound, false),
        integer_rule("integer_unbound_multiplier", Strategy::Unbound, true),
    ]
}

impl Domain {
    /// `None` when the schema is not a plain integer schema, when the
    /// multiplier does not match `multiplied`, or when a present bound does
    /// not fit an `i64`.
    fn of(schema: &Value, multiplied: bool) -> Option<Self> {
        if !schema::type_is(schema, JsonType::Integer) || schema::defines(schema, "enum") {
            return None;
        }
        let multiplier = match (states::multiplier(schema), multiplied) {
            (Multiplier::Absent, false) => 1,
            (Multiplier::Integral(multiplier), true) => multiplier,
            _ => return None,
        };
        let minimum = match schema.get("minimum") {
            None => None,
            Some(_) => Some(states::integer_minimum(schema)?),
        };
        let maximum = match schema.get("maximum") {
            None => None,
            Some(_) => Some(states::integer_maximum(schema)?),
        };
        Some(Self { minimum, maximum, multiplier })
    }

    fn strategy(&self) -> Strategy {
        match (self.minimum, self.maximum) {
            (Some(minimum), Some(maximum)) => {
                if states::fits_in_byte(states::count_states(minimum, maximum, self.multiplier)) {
                    Strategy::Byte
                } else {
                    Strategy::Wide
                }
            }
            (Some(_), None) => Strategy::Lower,
            (None, Some(_)) => Strategy::Upper,
            (None, None) => Strategy::Unbound,
        }
    }

    fn encode(&self, schema: &mut Value) {
        let multiplier = self.multiplier;
        match (self.strategy(), self.minimum, self.maximum) {
            (Strategy::Byte, Some(minimum), Some(maximum)) => make_encoding(
                schema,
                "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
                json!({ "minimum": minimum, "maximum": maximum, "multiplier": multiplier }),
            ),
            (Strategy::Wide | Strategy::Lower, Some(minimum), _) => make_encoding(
                schema,
                "FLOOR_MULTIPLE_ENUM_VARINT",
                json!({ "minimum": minimum, "multiplier": multiplier }),
            ),
            (Strategy::Upper, None, Some(maximum)) => make_encoding(
                schema,
                "ROOF_MULTIPLE_MIRROR_ENUM_VARINT",
                json!({ "maximum": maximum, "multiplier": multiplier }),
            ),
            (Strategy::Unbound, None, None) => make_encoding(
                schema,
                "ARBITRARY_MULTIPLE_ZIGZAG_VARINT",
                json!({ "multiplier": multiplier }),
            ),
            _ => {}
        }
    }
}

fn integer_rule(name: &'static str, strategy: Strategy, multiplied: bool) -> Rule {
    Rule::new(
        name,
        move |schema, context| {
            is_mappable(schema, context)
                && Domain::of(schema, multiplied).is_some_and(|domain| domain.strategy() == strategy)
        },
        move |schema| {
            if let Some(domain) = Domain::of(schema, multiplied) {
                domain.encode(schema);
            }
        },
    )
}
