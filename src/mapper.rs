//! Mapper: replaces canonical subschemas with encoding nodes.
//!
//! Only scalar and enumeration shapes have a dedicated rule. Anything the
//! rules leave untouched at the root is wrapped in the self-describing
//! `ANY_PACKED_TYPE_TAG_BYTE_PREFIX` encoding, so planning always yields an
//! encoding document.
pub mod enums;
pub mod integer;
pub mod number;

use serde_json::{Value, json};

use crate::encoding::{EncodingResolver, is_encoding, make_encoding};
use crate::engine::{RuleContext, RuleSet};
use crate::error::{Error, Result};
use crate::schema::{self, DRAFT_2020_12, SchemaResolver, SchemaWalker, vocabulary};

pub struct Mapper {
    rules: RuleSet,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    pub fn new() -> Self {
        let mut rules = RuleSet::new();
        rules.extend(enums::rules());
        rules.extend(integer::rules());
        rules.extend(number::rules());
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Plan `schema` in place. The schema is expected to be canonical.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn apply(
        &self,
        schema: &mut Value,
        walker: SchemaWalker,
        resolver: &dyn SchemaResolver,
        default_dialect: Option<&str>,
    ) -> Result<()> {
        let resolver = EncodingResolver::new(resolver);
        let dialect = schema::root_dialect(schema, default_dialect)?;
        let base_dialect = schema::base_dialect(&dialect, &resolver)?;
        if base_dialect != DRAFT_2020_12 {
            return Err(Error::UnsupportedDialect(base_dialect));
        }

        self.rules.apply(schema, walker, &resolver, default_dialect)?;

        let dialect = schema::root_dialect(schema, default_dialect)?;
        if !is_encoding(&dialect, schema) {
            tracing::debug!("no rule matched the root, falling back to a packed type tag");
            make_encoding(schema, "ANY_PACKED_TYPE_TAG_BYTE_PREFIX", json!({}));
        }
        debug_assert!(is_encoding(
            &schema::root_dialect(schema, default_dialect).unwrap_or_default(),
            schema
        ));
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SHARED PREDICATES
// ————————————————————————————————————————————————————————————————————————————

/// A 2020-12 schema node with validation semantics that is not an encoding
/// yet. Every mapper rule starts from here.
pub(crate) fn is_mappable(schema: &Value, context: &RuleContext<'_>) -> bool {
    context.is_base(DRAFT_2020_12)
        && context.has_vocabulary(vocabulary::VALIDATION)
        && !is_encoding(context.dialect, schema)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
