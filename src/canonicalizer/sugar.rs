//! Keywords rewritten into a simpler equivalent spelling.
use serde_json::{Map, Value, json};

use crate::engine::Rule;
use crate::json::{self, JsonType, Rounding};
use crate::schema::{self, vocabulary};

use super::number;

/// Kept on the `anyOf` wrapper when a `type` array is split; everything else
/// is copied into each branch.
const WRAPPER_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$anchor",
    "$dynamicAnchor",
    "$vocabulary",
    "$defs",
    "$comment",
];

pub fn rules() -> Vec<Rule> {
    vec![
        boolean_schema(),
        const_as_enum(),
        boolean_as_enum(),
        null_as_const(),
        type_union_anyof(),
        exclusive_maximum_integer_to_maximum(),
        exclusive_minimum_integer_to_minimum(),
    ]
}

fn boolean_schema() -> Rule {
    Rule::new(
        "boolean_schema",
        |schema, context| context.has_vocabulary(vocabulary::CORE) && schema.as_bool() == Some(true),
        |schema| *schema = Value::Object(Map::new()),
    )
}

fn const_as_enum() -> Rule {
    Rule::new(
        "const_as_enum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::defines(schema, "const")
                && !schema::defines(schema, "enum")
        },
        |schema| {
            let Some(map) = schema.as_object_mut() else { return };
            if let Some(value) = map.shift_remove("const") {
                map.insert("enum".to_string(), Value::Array(vec![value]));
            }
        },
    )
}

fn boolean_as_enum() -> Rule {
    Rule::new(
        "boolean_as_enum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Boolean)
                && !schema::defines_any(schema, &["enum", "const"])
        },
        |schema| {
            schema::erase(schema, "type");
            schema::assign(schema, "enum", json!([false, true]));
        },
    )
}

fn null_as_const() -> Rule {
    Rule::new(
        "null_as_const",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Null)
                && !schema::defines_any(schema, &["enum", "const"])
        },
        |schema| {
            schema::erase(schema, "type");
            schema::assign(schema, "const", Value::Null);
        },
    )
}

/// `{"type": [A, B], ...}` becomes `{"anyOf": [{"type": A, ...}, {"type": B, ...}]}`.
/// Keyword values are cloned into every branch.
fn type_union_anyof() -> Rule {
    Rule::new(
        "type_union_anyof",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && context.has_vocabulary(vocabulary::APPLICATOR)
                && schema
                    .get("type")
                    .and_then(Value::as_array)
                    .is_some_and(|types| types.len() > 1 && types.iter().all(Value::is_string))
        },
        |schema| {
            let Some(map) = schema.as_object() else { return };
            let Some(types) = map.get("type").and_then(Value::as_array) else { return };

            let mut wrapper = Map::new();
            let mut shared = Map::new();
            for (keyword, value) in map {
                if WRAPPER_KEYWORDS.contains(&keyword.as_str()) {
                    wrapper.insert(keyword.clone(), value.clone());
                } else if keyword != "type" {
                    shared.insert(keyword.clone(), value.clone());
                }
            }
            let branches = types
                .iter()
                .map(|ty| {
                    let mut branch = Map::new();
                    branch.insert("type".to_string(), ty.clone());
                    branch.extend(shared.clone());
                    Value::Object(branch)
                })
                .collect();
            wrapper.insert("anyOf".to_string(), Value::Array(branches));
            *schema = Value::Object(wrapper);
        },
    )
}

/// Inclusive equivalent of an exclusive integer ceiling.
fn inclusive_maximum(exclusive: &Value) -> Option<Value> {
    if json::is_integral(exclusive) {
        json::offset(exclusive, -1)
    } else {
        json::round(exclusive, Rounding::Floor)
    }
}

fn inclusive_minimum(exclusive: &Value) -> Option<Value> {
    if json::is_integral(exclusive) {
        json::offset(exclusive, 1)
    } else {
        json::round(exclusive, Rounding::Ceil)
    }
}

fn exclusive_maximum_integer_to_maximum() -> Rule {
    Rule::new(
        "exclusive_maximum_integer_to_maximum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Integer)
                && !schema::defines(schema, "maximum")
                && number(schema, "exclusiveMaximum").and_then(inclusive_maximum).is_some()
        },
        |schema| {
            let Some(maximum) = number(schema, "exclusiveMaximum").and_then(inclusive_maximum) else {
                return;
            };
            schema::erase(schema, "exclusiveMaximum");
            schema::assign(schema, "maximum", maximum);
        },
    )
}

fn exclusive_minimum_integer_to_minimum() -> Rule {
    Rule::new(
        "exclusive_minimum_integer_to_minimum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Integer)
                && !schema::defines(schema, "minimum")
                && number(schema, "exclusiveMinimum").and_then(inclusive_minimum).is_some()
        },
        |schema| {
            let Some(minimum) = number(schema, "exclusiveMinimum").and_then(inclusive_minimum) else {
                return;
            };
            schema::erase(schema, "exclusiveMinimum");
            schema::assign(schema, "minimum", minimum);
        },
    )
}
