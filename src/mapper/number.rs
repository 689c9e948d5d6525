use serde_json::json;

use crate::encoding::make_encoding;
use crate::engine::Rule;
use crate::json::JsonType;
use crate::schema;

use super::is_mappable;

pub fn rules() -> Vec<Rule> {
    vec![number_arbitrary()]
}

/// Reals carry no bound-based strategy; any number packs as a
/// mantissa/exponent varint pair.
fn number_arbitrary() -> Rule {
    Rule::new(
        "number_arbitrary",
        |schema, context| {
            is_mappable(schema, context)
                && schema::type_is(schema, JsonType::Number)
                && !schema::defines(schema, "enum")
        },
        |schema| make_encoding(schema, "DOUBLE_VARINT_TUPLE", json!({})),
    )
}
