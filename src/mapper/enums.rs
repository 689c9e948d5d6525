//! Enumerations are encoded as an index into their choices.
use serde_json::{Value, json};

use crate::encoding::make_encoding;
use crate::engine::{Rule, RuleContext};

use super::is_mappable;

/// Largest choice count whose highest index still fits in one byte.
const BYTE_CHOICES: usize = 256;

pub fn rules() -> Vec<Rule> {
    vec![enum_singleton(), enum_8_bit_top_level(), enum_8_bit(), enum_arbitrary()]
}

fn choices(schema: &Value) -> Option<&Vec<Value>> {
    schema.get("enum").and_then(Value::as_array)
}

fn choice_count(schema: &Value, context: &RuleContext<'_>) -> Option<usize> {
    if !is_mappable(schema, context) {
        return None;
    }
    choices(schema).map(Vec::len)
}

fn encode_choices(schema: &mut Value, name: &str) {
    let Some(choices) = choices(schema).cloned() else { return };
    make_encoding(schema, name, json!({ "choices": choices }));
}

fn enum_singleton() -> Rule {
    Rule::new(
        "enum_singleton",
        |schema, context| choice_count(schema, context) == Some(1),
        |schema| {
            let Some(value) = choices(schema).and_then(|choices| choices.first()).cloned() else {
                return;
            };
            make_encoding(schema, "CONST_NONE", json!({ "value": value }));
        },
    )
}

/// The root has no enclosing structure to share a length prefix with.
fn enum_8_bit_top_level() -> Rule {
    Rule::new(
        "enum_8_bit_top_level",
        |schema, context| {
            context.pointer.is_root()
                && choice_count(schema, context).is_some_and(|n| (2..=BYTE_CHOICES).contains(&n))
        },
        |schema| encode_choices(schema, "TOP_LEVEL_BYTE_CHOICE_INDEX"),
    )
}

fn enum_8_bit() -> Rule {
    Rule::new(
        "enum_8_bit",
        |schema, context| {
            !context.pointer.is_root()
                && choice_count(schema, context).is_some_and(|n| (2..=BYTE_CHOICES).contains(&n))
        },
        |schema| encode_choices(schema, "BYTE_CHOICE_INDEX"),
    )
}

fn enum_arbitrary() -> Rule {
    Rule::new(
        "enum_arbitrary",
        |schema, context| choice_count(schema, context).is_some_and(|n| n > BYTE_CHOICES),
        |schema| encode_choices(schema, "LARGE_CHOICE_INDEX"),
    )
}
