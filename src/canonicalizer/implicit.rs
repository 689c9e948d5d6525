//! Defaults that validation assumes silently, written out explicitly.
use serde_json::{Map, Value, json};

use crate::engine::Rule;
use crate::json::JsonType;
use crate::schema::{self, vocabulary};

/// Keywords that already constrain the type of an instance, one way or another.
const TYPE_CONSTRAINING_KEYWORDS: &[&str] = &[
    "type", "const", "enum", "$ref", "$dynamicRef", "anyOf", "allOf", "oneOf", "not", "if", "then", "else",
];

pub fn rules() -> Vec<Rule> {
    vec![
        implicit_type_union(),
        implicit_unit_multiple_of(),
        implicit_array_lower_bound(),
        implicit_string_lower_bound(),
        implicit_object_lower_bound(),
        implicit_object_required(),
        implicit_object_properties(),
    ]
}

fn implicit_type_union() -> Rule {
    Rule::new(
        "implicit_type_union",
        |schema, context| {
            context.has_vocabulary(vocabulary::VALIDATION)
                && schema.is_object()
                && !schema::defines_any(schema, TYPE_CONSTRAINING_KEYWORDS)
        },
        |schema| {
            let types = JsonType::ALL.iter().map(|ty| Value::from(ty.as_str())).collect();
            schema::assign(schema, "type", Value::Array(types));
        },
    )
}

/// A defaulted keyword for schemas pinned to `ty` that carry no `enum` or
/// `const` of their own.
fn implicit_default(
    name: &'static str,
    ty: JsonType,
    uri: &'static str,
    keyword: &'static str,
    default: fn() -> Value,
) -> Rule {
    Rule::new(
        name,
        move |schema, context| {
            context.has_vocabulary(uri)
                && schema::type_is(schema, ty)
                && !schema::defines_any(schema, &["enum", "const", keyword])
        },
        move |schema| schema::assign(schema, keyword, default()),
    )
}

fn implicit_unit_multiple_of() -> Rule {
    implicit_default(
        "implicit_unit_multiple_of",
        JsonType::Integer,
        vocabulary::VALIDATION,
        "multipleOf",
        || json!(1),
    )
}

fn implicit_array_lower_bound() -> Rule {
    implicit_default(
        "implicit_array_lower_bound",
        JsonType::Array,
        vocabulary::VALIDATION,
        "minItems",
        || json!(0),
    )
}

fn implicit_string_lower_bound() -> Rule {
    implicit_default(
        "implicit_string_lower_bound",
        JsonType::String,
        vocabulary::VALIDATION,
        "minLength",
        || json!(0),
    )
}

fn implicit_object_lower_bound() -> Rule {
    implicit_default(
        "implicit_object_lower_bound",
        JsonType::Object,
        vocabulary::VALIDATION,
        "minProperties",
        || json!(0),
    )
}

fn implicit_object_required() -> Rule {
    implicit_default(
        "implicit_object_required",
        JsonType::Object,
        vocabulary::VALIDATION,
        "required",
        || json!([]),
    )
}

fn implicit_object_properties() -> Rule {
    implicit_default(
        "implicit_object_properties",
        JsonType::Object,
        vocabulary::APPLICATOR,
        "properties",
        || Value::Object(Map::new()),
    )
}
