//! Keywords that cannot change the outcome of validation where they sit.
use std::cmp::Ordering;

use serde_json::Value;

use crate::engine::Rule;
use crate::json::{self, JsonType};
use crate::schema::{self, KEYWORDS, vocabulary};

use super::{array, number};

pub fn rules() -> Vec<Rule> {
    vec![
        content_schema_without_content_media_type(),
        max_contains_without_contains(),
        min_contains_without_contains(),
        unsatisfiable_max_contains(),
        implied_array_unique_items(),
        if_without_then_else(),
        then_else_without_if(),
        empty_pattern_properties(),
        empty_dependent_required(),
        exclusive_maximum_number_and_maximum(),
        exclusive_minimum_number_and_minimum(),
        const_with_type(),
        enum_with_type(),
        non_applicable_enum_validation_keywords(),
    ]
}

fn content_schema_without_content_media_type() -> Rule {
    Rule::new(
        "content_schema_without_content_media_type",
        |schema, context| {
            context.has_vocabulary(vocabulary::CONTENT)
                && schema::defines(schema, "contentSchema")
                && !schema::defines(schema, "contentMediaType")
        },
        |schema| schema::erase(schema, "contentSchema"),
    )
}

fn max_contains_without_contains() -> Rule {
    Rule::new(
        "max_contains_without_contains",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::defines(schema, "maxContains")
                && !schema::defines(schema, "contains")
        },
        |schema| schema::erase(schema, "maxContains"),
    )
}

fn min_contains_without_contains() -> Rule {
    Rule::new(
        "min_contains_without_contains",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema::defines(schema, "minContains")
                && !schema::defines(schema, "contains")
        },
        |schema| schema::erase(schema, "minContains"),
    )
}

/// An array never holds more matches than items, so `maxItems` already caps
/// `maxContains` when the latter is not smaller.
fn unsatisfiable_max_contains() -> Rule {
    Rule::new(
        "unsatisfiable_max_contains",
        |schema, context| {
            if !context.has_vocabulary(vocabulary::VALIDATION) {
                return false;
            }
            match (number(schema, "maxContains"), number(schema, "maxItems")) {
                (Some(contains), Some(items)) => json::compare(contains, items) != Ordering::Less,
                _ => false,
            }
        },
        |schema| schema::erase(schema, "maxContains"),
    )
}

fn implied_array_unique_items() -> Rule {
    fn short(value: &Value) -> bool {
        value.as_array().is_none_or(|items| items.len() <= 1)
    }
    Rule::new(
        "implied_array_unique_items",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema.get("uniqueItems") == Some(&Value::Bool(true))
                && (super::at_most(schema, "maxItems", 1)
                    || schema.get("const").is_some_and(short)
                    || array(schema, "enum").is_some_and(|values| values.iter().all(short)))
        },
        |schema| schema::erase(schema, "uniqueItems"),
    )
}

fn if_without_then_else() -> Rule {
    Rule::new(
        "if_without_then_else",
        |schema, context| {
            context.has_vocabulary(vocabulary::APPLICATOR)
                && schema::defines(schema, "if")
                && !schema::defines_any(schema, &["then", "else"])
        },
        |schema| schema::erase(schema, "if"),
    )
}

fn then_else_without_if() -> Rule {
    Rule::new(
        "then_else_without_if",
        |schema, context| {
            context.has_vocabulary(vocabulary::APPLICATOR)
                && !schema::defines(schema, "if")
                && schema::defines_any(schema, &["then", "else"])
        },
        |schema| {
            schema::erase(schema, "then");
            schema::erase(schema, "else");
        },
    )
}

fn empty_pattern_properties() -> Rule {
    Rule::new(
        "empty_pattern_properties",
        |schema, context| {
            context.has_vocabulary(vocabulary::APPLICATOR)
                && schema
                    .get("patternProperties")
                    .and_then(Value::as_object)
                    .is_some_and(|map| map.is_empty())
        },
        |schema| schema::erase(schema, "patternProperties"),
    )
}

fn empty_dependent_required() -> Rule {
    Rule::new(
        "empty_dependent_required",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema
                    .get("dependentRequired")
                    .and_then(Value::as_object)
                    .is_some_and(|map| map.is_empty())
        },
        |schema| schema::erase(schema, "dependentRequired"),
    )
}

/// With both ceilings present only the tighter one matters.
fn exclusive_maximum_number_and_maximum() -> Rule {
    Rule::new(
        "exclusive_maximum_number_and_maximum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && number(schema, "maximum").is_some()
                && number(schema, "exclusiveMaximum").is_some()
        },
        |schema| {
            let (Some(inclusive), Some(exclusive)) =
                (number(schema, "maximum"), number(schema, "exclusiveMaximum"))
            else {
                return;
            };
            if json::compare(inclusive, exclusive) == Ordering::Less {
                schema::erase(schema, "exclusiveMaximum");
            } else {
                schema::erase(schema, "maximum");
            }
        },
    )
}

fn exclusive_minimum_number_and_minimum() -> Rule {
    Rule::new(
        "exclusive_minimum_number_and_minimum",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && number(schema, "minimum").is_some()
                && number(schema, "exclusiveMinimum").is_some()
        },
        |schema| {
            let (Some(inclusive), Some(exclusive)) =
                (number(schema, "minimum"), number(schema, "exclusiveMinimum"))
            else {
                return;
            };
            if json::compare(inclusive, exclusive) == Ordering::Greater {
                schema::erase(schema, "exclusiveMinimum");
            } else {
                schema::erase(schema, "minimum");
            }
        },
    )
}

fn const_with_type() -> Rule {
    Rule::new(
        "const_with_type",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && match (schema::declared_type(schema), schema.get("const")) {
                    (Some(ty), Some(value)) => json::is_instance_of(value, ty),
                    _ => false,
                }
        },
        |schema| schema::erase(schema, "type"),
    )
}

fn enum_with_type() -> Rule {
    Rule::new(
        "enum_with_type",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && match (schema::declared_type(schema), array(schema, "enum")) {
                    (Some(ty), Some(values)) => {
                        !values.is_empty() && values.iter().all(|value| json::is_instance_of(value, ty))
                    }
                    _ => false,
                }
        },
        |schema| schema::erase(schema, "type"),
    )
}

/// Validation keywords that constrain none of the enum members' types.
fn non_applicable_to_enum(schema: &Value) -> Vec<&'static str> {
    let Some(values) = array(schema, "enum").filter(|values| !values.is_empty()) else {
        return Vec::new();
    };
    if schema::defines(schema, "type") {
        return Vec::new();
    }
    let types = values.iter().map(json::type_of).collect::<Vec<JsonType>>();
    KEYWORDS
        .iter()
        .filter(|info| info.vocabulary == vocabulary::VALIDATION)
        .filter(|info| schema::defines(schema, info.keyword))
        .filter(|info| !types.iter().any(|ty| info.applies_to(*ty)))
        .map(|info| info.keyword)
        .collect()
}

fn non_applicable_enum_validation_keywords() -> Rule {
    Rule::new(
        "non_applicable_enum_validation_keywords",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION) && !non_applicable_to_enum(schema).is_empty()
        },
        |schema| {
            for keyword in non_applicable_to_enum(schema) {
                schema::erase(schema, keyword);
            }
        },
    )
}
