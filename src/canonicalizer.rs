//! Canonicalizer: rewrites a 2020-12 schema into an equivalent form free of
//! sugar, redundant keywords and cross-type leftovers, with every default
//! bound spelled out.
//!
//! Families are registered in a fixed order, and the first matching rule wins
//! at each node. The order matters in one place: implicit bounds come last,
//! so a node that collapses into a constant does so before defaults are
//! added to it.
pub mod heterogeneous;
pub mod implicit;
pub mod simplify;
pub mod sugar;
pub mod superfluous;

use serde_json::Value;

use crate::encoding::EncodingResolver;
use crate::engine::RuleSet;
use crate::error::Result;
use crate::json::{self, Rounding};
use crate::schema::{SchemaResolver, SchemaWalker};

pub struct Canonicalizer {
    rules: RuleSet,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Canonicalizer {
    pub fn new() -> Self {
        let mut rules = RuleSet::new();
        rules.extend(superfluous::rules());
        rules.extend(sugar::rules());
        rules.extend(simplify::rules());
        rules.extend(heterogeneous::rules());
        rules.extend(implicit::rules());
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn apply(
        &self,
        schema: &mut Value,
        walker: SchemaWalker,
        resolver: &dyn SchemaResolver,
        default_dialect: Option<&str>,
    ) -> Result<()> {
        let resolver = EncodingResolver::new(resolver);
        self.rules.apply(schema, walker, &resolver, default_dialect)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SHARED PREDICATES
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn number<'a>(schema: &'a Value, keyword: &str) -> Option<&'a Value> {
    schema.get(keyword).filter(|value| value.is_number())
}

pub(crate) fn array<'a>(schema: &'a Value, keyword: &str) -> Option<&'a Vec<Value>> {
    schema.get(keyword).and_then(Value::as_array)
}

/// Absent, or a number equal to zero.
pub(crate) fn absent_or_zero(schema: &Value, keyword: &str) -> bool {
    match schema.get(keyword) {
        None => true,
        Some(value) => is_zero(value),
    }
}

pub(crate) fn is_zero(value: &Value) -> bool {
    value.is_number() && json::equal(value, &Value::from(0))
}

/// The keyword is an integral number no larger than `limit`.
pub(crate) fn at_most(schema: &Value, keyword: &str, limit: i64) -> bool {
    number(schema, keyword)
        .filter(|value| json::is_integral(value))
        .and_then(|value| json::integer_bound(value, Rounding::Floor))
        .is_some_and(|value| value <= limit)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DRAFT_2020_12, default_schema_walker, official_resolver};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn canonical(mut schema: Value) -> Value {
        Canonicalizer::new()
            .apply(&mut schema, default_schema_walker, &official_resolver, Some(DRAFT_2020_12))
            .unwrap();
        schema
    }

    #[test]
    fn bounded_integer_gains_unit_multiplier() {
        assert_eq!(
            canonical(json!({"type": "integer", "minimum": 1, "maximum": 3})),
            json!({"type": "integer", "minimum": 1, "maximum": 3, "multipleOf": 1})
        );
    }

    #[test]
    fn empty_string_becomes_singleton_enum() {
        assert_eq!(canonical(json!({"type": "string", "maxLength": 0})), json!({"enum": [""]}));
    }

    #[test]
    fn boolean_and_null_become_enums() {
        assert_eq!(canonical(json!({"type": "boolean"})), json!({"enum": [false, true]}));
        assert_eq!(canonical(json!({"type": "null"})), json!({"enum": [null]}));
        assert_eq!(canonical(json!({"type": "string", "const": "foo"})), json!({"enum": ["foo"]}));
    }

    #[test]
    fn type_array_splits_into_branches() {
        assert_eq!(
            canonical(json!({"type": ["string", "integer"]})),
            json!({"anyOf": [
                {"type": "string", "minLength": 0},
                {"type": "integer", "multipleOf": 1}
            ]})
        );
    }

    #[test]
    fn type_array_branches_are_pruned_per_type() {
        assert_eq!(
            canonical(json!({
                "$schema": DRAFT_2020_12,
                "$id": "https://example.com/name",
                "type": ["string", "null"],
                "minLength": 2
            })),
            json!({
                "$schema": DRAFT_2020_12,
                "$id": "https://example.com/name",
                "anyOf": [
                    {"type": "string", "minLength": 2},
                    {"enum": [null]}
                ]
            })
        );
    }

    #[test]
    fn true_schema_expands_to_every_type() {
        assert_eq!(
            canonical(json!(true)),
            json!({"anyOf": [
                {"enum": [null]},
                {"enum": [false, true]},
                {"type": "object", "minProperties": 0, "required": [], "properties": {}},
                {"type": "array", "minItems": 0},
                {"type": "string", "minLength": 0},
                {"type": "number"},
                {"type": "integer", "multipleOf": 1}
            ]})
        );
        assert_eq!(canonical(json!(false)), json!(false));
    }

    #[test]
    fn exclusive_maximum_under_integer() {
        let cases = [
            (json!({"exclusiveMaximum": 5}), json!(4)),
            (json!({"exclusiveMaximum": 5.1}), json!(5)),
            (json!({"exclusiveMaximum": 5, "maximum": 3}), json!(3)),
            (json!({"exclusiveMaximum": 5, "maximum": 5}), json!(4)),
            (json!({"exclusiveMaximum": 5.1, "maximum": 5}), json!(5)),
            (json!({"exclusiveMaximum": 5, "maximum": 5.1}), json!(4)),
            (json!({"exclusiveMaximum": 5.1, "maximum": 3.2}), json!(3)),
        ];
        for (mut input, expected) in cases {
            input["type"] = json!("integer");
            let output = canonical(input.clone());
            assert_eq!(output["maximum"], expected, "{input}");
            assert!(output.get("exclusiveMaximum").is_none(), "{input}");
            assert_eq!(output["multipleOf"], json!(1));
        }
    }

    #[test]
    fn exclusive_minimum_under_integer() {
        let cases = [
            (json!({"exclusiveMinimum": 5}), json!(6)),
            (json!({"exclusiveMinimum": 5.1}), json!(6)),
            (json!({"exclusiveMinimum": 5, "minimum": 7.2}), json!(8)),
            (json!({"exclusiveMinimum": 5, "minimum": 4}), json!(6)),
        ];
        for (mut input, expected) in cases {
            input["type"] = json!("integer");
            let output = canonical(input.clone());
            assert_eq!(output["minimum"], expected, "{input}");
            assert!(output.get("exclusiveMinimum").is_none(), "{input}");
        }
    }

    #[test]
    fn exclusive_bounds_stay_on_numbers() {
        assert_eq!(
            canonical(json!({"type": "number", "exclusiveMaximum": 5, "maximum": 7})),
            json!({"type": "number", "exclusiveMaximum": 5})
        );
    }

    #[test]
    fn real_bounds_under_integer() {
        assert_eq!(
            canonical(json!({"type": "integer", "minimum": 1.5, "maximum": 9.9})),
            json!({"type": "integer", "minimum": 2, "maximum": 9, "multipleOf": 1})
        );
    }

    #[test]
    fn equal_bounds_collapse_to_const() {
        assert_eq!(canonical(json!({"type": "integer", "minimum": 5, "maximum": 5})), json!({"enum": [5]}));
        assert_eq!(canonical(json!({"type": "number", "minimum": 1.5, "maximum": 1.5})), json!({"enum": [1.5]}));
    }

    #[test]
    fn duplicates_are_removed() {
        assert_eq!(canonical(json!({"enum": [3, 1, 3]})), json!({"enum": [1, 3]}));
        assert_eq!(canonical(json!({"enum": [3, 1]})), json!({"enum": [3, 1]}));
        assert_eq!(
            canonical(json!({"anyOf": [{"type": "number"}, {"type": "string"}, {"type": "number"}]})),
            json!({"anyOf": [{"type": "number"}, {"type": "string", "minLength": 0}]})
        );
        assert_eq!(
            canonical(json!({"type": "object", "required": ["b", "a", "b"]})),
            json!({"type": "object", "required": ["a", "b"], "minProperties": 2, "properties": {}})
        );
    }

    #[test]
    fn object_requirements_fold_together() {
        assert_eq!(
            canonical(json!({
                "type": "object",
                "required": ["a"],
                "dependentRequired": {"a": ["b"], "c": ["d"]}
            })),
            json!({
                "type": "object",
                "required": ["a", "b"],
                "dependentRequired": {"c": ["d"]},
                "minProperties": 2,
                "properties": {}
            })
        );
        assert_eq!(
            canonical(json!({"type": "object", "required": ["a"], "dependentRequired": {"a": ["b"]}})),
            json!({"type": "object", "required": ["a", "b"], "minProperties": 2, "properties": {}})
        );
    }

    #[test]
    fn empty_containers_become_constants() {
        assert_eq!(canonical(json!({"type": "object", "maxProperties": 0})), json!({"enum": [{}]}));
        assert_eq!(canonical(json!({"type": "array", "maxItems": 0, "items": {"type": "string"}})), json!({"enum": [[]]}));
    }

    #[test]
    fn foreign_keywords_are_pruned() {
        assert_eq!(
            canonical(json!({"type": "string", "minimum": 3, "items": {"type": "string"}, "format": "email"})),
            json!({"type": "string", "format": "email", "minLength": 0})
        );
        assert_eq!(
            canonical(json!({"type": "number", "format": "email", "contentMediaType": "text/plain"})),
            json!({"type": "number"})
        );
        assert_eq!(
            canonical(json!({"enum": [1, 2], "minLength": 3, "maximum": 10})),
            json!({"enum": [1, 2], "maximum": 10})
        );
    }

    #[test]
    fn superfluous_array_keywords() {
        assert_eq!(
            canonical(json!({
                "type": "array",
                "contains": {"type": "string"},
                "maxContains": 3,
                "maxItems": 2
            })),
            json!({
                "type": "array",
                "contains": {"type": "string", "minLength": 0},
                "maxItems": 2,
                "minItems": 0
            })
        );
        assert_eq!(
            canonical(json!({"type": "array", "maxItems": 1, "uniqueItems": true, "minContains": 1})),
            json!({"type": "array", "maxItems": 1, "minItems": 0})
        );
    }

    #[test]
    fn keywords_without_their_companions() {
        assert_eq!(
            canonical(json!({"type": "string", "contentSchema": {"type": "integer"}})),
            json!({"type": "string", "minLength": 0})
        );
        assert_eq!(
            canonical(json!({"type": "array", "maxContains": 2})),
            json!({"type": "array", "minItems": 0})
        );
        assert_eq!(
            canonical(json!({"type": "object", "patternProperties": {}})),
            json!({"type": "object", "minProperties": 0, "required": [], "properties": {}})
        );
    }

    #[test]
    fn unique_items_implied_by_enum_and_const() {
        assert_eq!(canonical(json!({"enum": [[1], []], "uniqueItems": true})), json!({"enum": [[1], []]}));
        assert_eq!(canonical(json!({"const": [1], "uniqueItems": true})), json!({"enum": [[1]]}));
        assert_eq!(
            canonical(json!({"enum": [[1, 2]], "uniqueItems": true})),
            json!({"enum": [[1, 2]], "uniqueItems": true})
        );
    }

    #[test]
    fn enum_members_already_carry_the_type() {
        assert_eq!(canonical(json!({"type": "integer", "enum": [1, 2]})), json!({"enum": [1, 2]}));
        assert_eq!(
            canonical(json!({"type": "integer", "enum": [1, "a"]})),
            json!({"type": "integer", "enum": [1, "a"]})
        );
    }

    #[test]
    fn const_narrows_enum() {
        assert_eq!(canonical(json!({"const": 1, "enum": [1, 2]})), json!({"enum": [1]}));
        assert_eq!(canonical(json!({"const": 2, "enum": [1, 2.0]})), json!({"enum": [2]}));
    }

    #[test]
    fn tighter_number_minimum_wins() {
        assert_eq!(
            canonical(json!({"type": "number", "minimum": 3, "exclusiveMinimum": 1})),
            json!({"type": "number", "minimum": 3})
        );
        assert_eq!(
            canonical(json!({"type": "number", "minimum": 1, "exclusiveMinimum": 1})),
            json!({"type": "number", "exclusiveMinimum": 1})
        );
    }

    #[test]
    fn dangling_conditionals_are_removed() {
        assert_eq!(canonical(json!({"type": "number", "if": {"type": "string"}})), json!({"type": "number"}));
        assert_eq!(
            canonical(json!({"type": "number", "then": {"minimum": 1}, "else": {"maximum": 1}})),
            json!({"type": "number"})
        );
    }

    #[test]
    fn legacy_dialects_pass_through() {
        let schema = json!({"$schema": "http://json-schema.org/draft-07/schema#", "type": "boolean"});
        assert_eq!(canonical(schema.clone()), schema);
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        let corpus = [
            json!(true),
            json!({"type": ["string", "integer", "null"], "minimum": 2, "maxLength": 4}),
            json!({"type": "object", "properties": {"a": {"type": "boolean"}, "b": {}}, "required": ["a"]}),
            json!({"type": "array", "items": {"type": "integer", "exclusiveMinimum": 0.5}, "maxItems": 0}),
            json!({"anyOf": [{"const": 1}, {"const": 1.0}, {"type": "string", "maxLength": 0}]}),
            json!({"type": "integer", "minimum": 5, "maximum": 5, "multipleOf": 5}),
            json!({"const": "a", "enum": ["a", "b"], "maxLength": 3}),
        ];
        for schema in corpus {
            let once = canonical(schema.clone());
            let twice = canonical(once.clone());
            assert_eq!(once, twice, "{schema}");
        }
    }
}
