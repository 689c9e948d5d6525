//! Compiles JSON Schema 2020-12 documents into JSON BinPack encoding plans.
//!
//! Compilation is two in-place passes over the caller's document:
//!
//! 1. [`canonicalize`] rewrites the schema into canonical form, a fixed point
//!    of the canonicalizer rules.
//! 2. [`plan`] replaces canonical subschemas with encoding nodes, so that the
//!    root ends up as an encoding document.
//!
//! ```
//! use json_binpack::schema::{DRAFT_2020_12, default_schema_walker, official_resolver};
//! use serde_json::json;
//!
//! let mut schema = json!({"type": "integer", "minimum": 1, "maximum": 3});
//! json_binpack::compile(&mut schema, default_schema_walker, &official_resolver, Some(DRAFT_2020_12)).unwrap();
//! assert_eq!(schema["name"], "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED");
//! ```
pub mod canonicalizer;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod json;
pub mod mapper;
pub mod path_de;
pub mod schema;
pub mod states;

use serde_json::Value;

pub use canonicalizer::Canonicalizer;
pub use encoding::Encoding;
pub use error::{Error, Result};
pub use mapper::Mapper;
use schema::{SchemaResolver, SchemaWalker};

/// Both rule sets, built once. Shareable across threads.
#[derive(Default)]
pub struct Compiler {
    canonicalizer: Canonicalizer,
    mapper: Mapper,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonicalize(
        &self,
        schema: &mut Value,
        walker: SchemaWalker,
        resolver: &dyn SchemaResolver,
        default_dialect: Option<&str>,
    ) -> Result<()> {
        self.canonicalizer.apply(schema, walker, resolver, default_dialect)
    }

    pub fn plan(
        &self,
        schema: &mut Value,
        walker: SchemaWalker,
        resolver: &dyn SchemaResolver,
        default_dialect: Option<&str>,
    ) -> Result<()> {
        self.mapper.apply(schema, walker, resolver, default_dialect)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile(
        &self,
        schema: &mut Value,
        walker: SchemaWalker,
        resolver: &dyn SchemaResolver,
        default_dialect: Option<&str>,
    ) -> Result<()> {
        self.canonicalize(schema, walker, resolver, default_dialect)?;
        self.plan(schema, walker, resolver, default_dialect)
    }
}

/// Rewrite `schema` into canonical form.
pub fn canonicalize(
    schema: &mut Value,
    walker: SchemaWalker,
    resolver: &dyn SchemaResolver,
    default_dialect: Option<&str>,
) -> Result<()> {
    Canonicalizer::new().apply(schema, walker, resolver, default_dialect)
}

/// Replace a canonical `schema` with its encoding plan.
pub fn plan(
    schema: &mut Value,
    walker: SchemaWalker,
    resolver: &dyn SchemaResolver,
    default_dialect: Option<&str>,
) -> Result<()> {
    Mapper::new().apply(schema, walker, resolver, default_dialect)
}

pub use plan as map;

/// [`canonicalize`] followed by [`plan`].
pub fn compile(
    schema: &mut Value,
    walker: SchemaWalker,
    resolver: &dyn SchemaResolver,
    default_dialect: Option<&str>,
) -> Result<()> {
    Compiler::new().compile(schema, walker, resolver, default_dialect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ENCODING_V1;
    use crate::schema::{DRAFT_2020_12, MapResolver, default_schema_walker, official_resolver};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compiled(mut schema: Value) -> Value {
        compile(&mut schema, default_schema_walker, &official_resolver, Some(DRAFT_2020_12)).unwrap();
        schema
    }

    fn encoding(name: &str, options: Value) -> Value {
        json!({"$schema": ENCODING_V1, "name": name, "options": options})
    }

    #[test]
    fn small_bounded_integer() {
        assert_eq!(
            compiled(json!({"type": "integer", "minimum": 1, "maximum": 3})),
            encoding(
                "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
                json!({"minimum": 1, "maximum": 3, "multiplier": 1})
            )
        );
    }

    #[test]
    fn empty_string_is_constant() {
        assert_eq!(
            compiled(json!({"type": "string", "maxLength": 0})),
            encoding("CONST_NONE", json!({"value": ""}))
        );
    }

    #[test]
    fn boolean_root_is_a_top_level_choice() {
        assert_eq!(
            compiled(json!({"type": "boolean"})),
            encoding("TOP_LEVEL_BYTE_CHOICE_INDEX", json!({"choices": [false, true]}))
        );
    }

    #[test]
    fn const_inside_enum_is_constant() {
        assert_eq!(
            compiled(json!({"const": 1, "enum": [1, 2]})),
            encoding("CONST_NONE", json!({"value": 1}))
        );
    }

    #[test]
    fn unbounded_integer() {
        assert_eq!(
            compiled(json!({"type": "integer"})),
            encoding("ARBITRARY_MULTIPLE_ZIGZAG_VARINT", json!({"multiplier": 1}))
        );
    }

    #[test]
    fn byte_fit_boundary() {
        assert_eq!(
            compiled(json!({"type": "integer", "minimum": 10, "maximum": 265}))["name"],
            "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED"
        );
        assert_eq!(
            compiled(json!({"type": "integer", "minimum": 10, "maximum": 266}))["name"],
            "FLOOR_MULTIPLE_ENUM_VARINT"
        );
    }

    #[test]
    fn exclusive_bounds_compile_inclusive() {
        assert_eq!(
            compiled(json!({"type": "integer", "exclusiveMinimum": 0, "exclusiveMaximum": 10.5})),
            encoding(
                "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
                json!({"minimum": 1, "maximum": 10, "multiplier": 1})
            )
        );
    }

    #[test]
    fn type_unions_fall_back_to_any() {
        assert_eq!(
            compiled(json!({"type": ["string", "integer"]})),
            encoding("ANY_PACKED_TYPE_TAG_BYTE_PREFIX", json!({}))
        );
        assert_eq!(compiled(json!(true)), encoding("ANY_PACKED_TYPE_TAG_BYTE_PREFIX", json!({})));
    }

    #[test]
    fn compiler_is_reusable() {
        let compiler = Compiler::new();
        for (schema, name) in [
            (json!({"type": "number"}), "DOUBLE_VARINT_TUPLE"),
            (json!({"const": 42}), "CONST_NONE"),
            (json!({"type": "integer", "maximum": 0}), "ROOF_MULTIPLE_MIRROR_ENUM_VARINT"),
        ] {
            let mut schema = schema;
            compiler
                .compile(&mut schema, default_schema_walker, &official_resolver, Some(DRAFT_2020_12))
                .unwrap();
            assert_eq!(schema["name"], name);
        }
    }

    #[test]
    fn custom_dialects_resolve_through_the_caller() {
        let mut resolver = MapResolver::new();
        resolver.add(json!({
            "$id": "https://example.com/meta",
            "$schema": DRAFT_2020_12,
            "$vocabulary": {
                "https://json-schema.org/draft/2020-12/vocab/core": true,
                "https://json-schema.org/draft/2020-12/vocab/validation": true
            }
        }));
        let mut schema = json!({"$schema": "https://example.com/meta", "type": "integer", "minimum": 0});
        compile(&mut schema, default_schema_walker, &resolver, None).unwrap();
        assert_eq!(schema, encoding("FLOOR_MULTIPLE_ENUM_VARINT", json!({"minimum": 0, "multiplier": 1})));
    }

    #[test]
    fn missing_dialect_is_an_error() {
        let mut schema = json!({"type": "integer"});
        let error = compile(&mut schema, default_schema_walker, &official_resolver, None).unwrap_err();
        assert!(matches!(error, Error::UnknownDialect));
    }

    #[test]
    fn map_is_plan() {
        let mut schema = json!({"enum": [1]});
        map(&mut schema, default_schema_walker, &official_resolver, Some(DRAFT_2020_12)).unwrap();
        assert_eq!(schema, encoding("CONST_NONE", json!({"value": 1})));
    }
}
