//! Structural simplifications: duplicate removal, constant collapsing,
//! tautologies between object keywords, and integer bound tightening.
use serde_json::{Map, Value};

use crate::engine::Rule;
use crate::json::{self, JsonType, Rounding};
use crate::schema::{self, vocabulary};

use super::{absent_or_zero, array, number};

pub fn rules() -> Vec<Rule> {
    vec![
        single_type_array(),
        const_in_enum(),
        equal_numeric_bounds_as_const(),
        empty_string_as_const(),
        empty_array_as_const(),
        empty_object_as_const(),
        dependent_required_tautology(),
        min_properties_required_tautology(),
        duplicate_branches("duplicate_allof_branches", "allOf", vocabulary::APPLICATOR),
        duplicate_branches("duplicate_anyof_branches", "anyOf", vocabulary::APPLICATOR),
        duplicate_branches("duplicate_enum_values", "enum", vocabulary::VALIDATION),
        duplicate_branches("duplicate_required_values", "required", vocabulary::VALIDATION),
        maximum_real_for_integer(),
        minimum_real_for_integer(),
    ]
}

fn single_type_array() -> Rule {
    Rule::new(
        "single_type_array",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && array(schema, "type").is_some_and(|types| types.len() == 1 && types[0].is_string())
        },
        |schema| {
            let single = array(schema, "type").and_then(|types| types.first()).cloned();
            if let Some(single) = single {
                schema::assign(schema, "type", single);
            }
        },
    )
}

/// `const` alongside an `enum` that lists it leaves that one value.
fn const_in_enum() -> Rule {
    Rule::new(
        "const_in_enum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && match (schema.get("const"), array(schema, "enum")) {
                    (Some(value), Some(values)) => values.iter().any(|member| json::equal(member, value)),
                    _ => false,
                }
        },
        |schema| {
            let Some(map) = schema.as_object_mut() else { return };
            if let Some(value) = map.shift_remove("const") {
                map.insert("enum".to_string(), Value::Array(vec![value]));
            }
        },
    )
}

/// Whether a present `multipleOf` admits `value`. Only integral operands are
/// checked; anything else is treated as not admitted.
fn multiple_admits(schema: &Value, value: &Value) -> bool {
    let Some(multiple) = schema.get("multipleOf") else { return true };
    if !json::is_integral(multiple) || !json::is_integral(value) {
        return false;
    }
    match (
        json::integer_bound(multiple, Rounding::Floor),
        json::integer_bound(value, Rounding::Floor),
    ) {
        (Some(m), Some(v)) if m != 0 => v % m == 0,
        _ => false,
    }
}

/// `minimum == maximum` leaves a single admissible number.
fn equal_numeric_bounds_as_const() -> Rule {
    Rule::new(
        "equal_numeric_bounds_as_const",
        |schema, context| {
            if !context.has_vocabulary(vocabulary::VALIDATION)
                || schema::defines_any(schema, &["const", "enum", "exclusiveMinimum", "exclusiveMaximum"])
            {
                return false;
            }
            let integer = match schema::declared_type(schema) {
                Some(JsonType::Integer) => true,
                Some(JsonType::Number) => false,
                _ => return false,
            };
            match (number(schema, "minimum"), number(schema, "maximum")) {
                (Some(minimum), Some(maximum)) => {
                    json::equal(minimum, maximum)
                        && (!integer || json::is_integral(minimum))
                        && multiple_admits(schema, minimum)
                }
                _ => false,
            }
        },
        |schema| {
            let Some(value) = number(schema, "minimum").cloned() else { return };
            for keyword in ["type", "minimum", "maximum", "multipleOf"] {
                schema::erase(schema, keyword);
            }
            schema::assign(schema, "const", value);
        },
    )
}

fn empty_string_as_const() -> Rule {
    Rule::new(
        "empty_string_as_const",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::String)
                && number(schema, "maxLength").is_some_and(super::is_zero)
                && absent_or_zero(schema, "minLength")
                && !schema::defines_any(schema, &["const", "enum", "pattern"])
        },
        |schema| {
            schema::erase(schema, "maxLength");
            schema::erase(schema, "minLength");
            schema::assign(schema, "const", Value::String(String::new()));
        },
    )
}

fn empty_array_as_const() -> Rule {
    Rule::new(
        "empty_array_as_const",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Array)
                && number(schema, "maxItems").is_some_and(super::is_zero)
                && absent_or_zero(schema, "minItems")
                && !schema::defines_any(schema, &["const", "enum", "contains"])
        },
        |schema| {
            for keyword in ["maxItems", "minItems", "items", "prefixItems", "uniqueItems", "unevaluatedItems"] {
                schema::erase(schema, keyword);
            }
            schema::assign(schema, "const", Value::Array(Vec::new()));
        },
    )
}

fn empty_object_as_const() -> Rule {
    Rule::new(
        "empty_object_as_const",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Object)
                && number(schema, "maxProperties").is_some_and(super::is_zero)
                && absent_or_zero(schema, "minProperties")
                && schema.get("required").is_none_or(|required| {
                    required.as_array().is_some_and(Vec::is_empty)
                })
                && !schema::defines_any(schema, &["const", "enum"])
        },
        |schema| {
            for keyword in [
                "maxProperties",
                "minProperties",
                "required",
                "properties",
                "patternProperties",
                "additionalProperties",
                "propertyNames",
                "dependentRequired",
                "dependentSchemas",
                "unevaluatedProperties",
            ] {
                schema::erase(schema, keyword);
            }
            schema::assign(schema, "const", Value::Object(Map::new()));
        },
    )
}

/// A `dependentRequired` entry keyed by an already required property is
/// itself required.
fn dependent_required_tautology() -> Rule {
    Rule::new(
        "dependent_required_tautology",
        |schema, context| {
            if !context.has_vocabulary(vocabulary::VALIDATION) {
                return false;
            }
            let (Some(required), Some(dependent)) = (
                array(schema, "required"),
                schema.get("dependentRequired").and_then(Value::as_object),
            ) else {
                return false;
            };
            required
                .iter()
                .filter_map(Value::as_str)
                .any(|name| dependent.get(name).is_some_and(Value::is_array))
        },
        |schema| {
            let Some(map) = schema.as_object_mut() else { return };
            let mut required = match map.get("required") {
                Some(Value::Array(required)) => required.clone(),
                _ => return,
            };
            let Some(Value::Object(dependent)) = map.get_mut("dependentRequired") else { return };
            let mut index = 0;
            while index < required.len() {
                let dependencies = required[index]
                    .as_str()
                    .filter(|name| dependent.get(*name).is_some_and(Value::is_array))
                    .and_then(|name| dependent.shift_remove(name));
                if let Some(Value::Array(dependencies)) = dependencies {
                    for dependency in dependencies {
                        if dependency.is_string() && !required.contains(&dependency) {
                            required.push(dependency);
                        }
                    }
                }
                index += 1;
            }
            map.insert("required".to_string(), Value::Array(required));
        },
    )
}

/// Distinct required properties put a floor under `minProperties`.
fn min_properties_required_tautology() -> Rule {
    fn distinct_required(schema: &Value) -> Option<i64> {
        let required = array(schema, "required")?;
        if json::has_duplicates(required) {
            return None;
        }
        i64::try_from(required.len()).ok()
    }
    Rule::new(
        "min_properties_required_tautology",
        |schema, context| {
            if !context.has_vocabulary(vocabulary::VALIDATION) {
                return false;
            }
            let minimum = number(schema, "minProperties")
                .and_then(|value| json::integer_bound(value, Rounding::Ceil));
            match (minimum, distinct_required(schema)) {
                (Some(minimum), Some(count)) => count > minimum,
                _ => false,
            }
        },
        |schema| {
            if let Some(count) = distinct_required(schema) {
                schema::assign(schema, "minProperties", Value::from(count));
            }
        },
    )
}

/// Sort and deduplicate an array keyword, only when it has duplicates.
fn duplicate_branches(name: &'static str, keyword: &'static str, uri: &'static str) -> Rule {
    Rule::new(
        name,
        move |schema, context| {
            context.has_vocabulary(uri) && array(schema, keyword).is_some_and(|values| json::has_duplicates(values))
        },
        move |schema| {
            let unique = array(schema, keyword).map(|values| json::sort_unique(values));
            if let Some(unique) = unique {
                schema::assign(schema, keyword, Value::Array(unique));
            }
        },
    )
}

fn maximum_real_for_integer() -> Rule {
    real_bound_for_integer("maximum_real_for_integer", "maximum", Rounding::Floor)
}

fn minimum_real_for_integer() -> Rule {
    real_bound_for_integer("minimum_real_for_integer", "minimum", Rounding::Ceil)
}

fn real_bound_for_integer(name: &'static str, keyword: &'static str, rounding: Rounding) -> Rule {
    Rule::new(
        name,
        move |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::type_is(schema, JsonType::Integer)
                && number(schema, keyword)
                    .is_some_and(|value| !json::is_integral(value) && json::round(value, rounding).is_some())
        },
        move |schema| {
            if let Some(rounded) = number(schema, keyword).and_then(|value| json::round(value, rounding)) {
                schema::assign(schema, keyword, rounded);
            }
        },
    )
}
