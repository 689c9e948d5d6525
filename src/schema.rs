//! The JSON Schema object model the two passes stand on: dialect and
//! vocabulary detection, the keyword walker, metaschema resolution, and a
//! handful of node accessors that every rule uses.
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::json::{self, JsonType};

pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";
pub const DRAFT_2019_09: &str = "https://json-schema.org/draft/2019-09/schema";
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema";
pub const DRAFT_06: &str = "http://json-schema.org/draft-06/schema";
pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema";

/// Metaschema chains longer than this are treated as unresolvable.
const MAX_METASCHEMA_DEPTH: usize = 16;

pub mod vocabulary {
    pub const CORE: &str = "https://json-schema.org/draft/2020-12/vocab/core";
    pub const APPLICATOR: &str = "https://json-schema.org/draft/2020-12/vocab/applicator";
    pub const UNEVALUATED: &str = "https://json-schema.org/draft/2020-12/vocab/unevaluated";
    pub const VALIDATION: &str = "https://json-schema.org/draft/2020-12/vocab/validation";
    pub const META_DATA: &str = "https://json-schema.org/draft/2020-12/vocab/meta-data";
    pub const FORMAT_ANNOTATION: &str = "https://json-schema.org/draft/2020-12/vocab/format-annotation";
    pub const FORMAT_ASSERTION: &str = "https://json-schema.org/draft/2020-12/vocab/format-assertion";
    pub const CONTENT: &str = "https://json-schema.org/draft/2020-12/vocab/content";
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Active vocabulary URIs for a dialect, in metaschema order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabularies(IndexSet<String>);

/// RFC 6901 pointer to a subschema, relative to the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pointer(Vec<String>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordRole {
    Unknown,
    Identity,
    Reference,
    Comment,
    Assertion,
    Annotation,
    /// The keyword's value is a single subschema.
    SubschemaValue,
    /// The keyword's value is an array of subschemas.
    SubschemaElements,
    /// The keyword's value is an object whose values are subschemas.
    SubschemaMembers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordInfo {
    pub keyword: &'static str,
    pub vocabulary: &'static str,
    pub role: KeywordRole,
    pub dependencies: &'static [&'static str],
    /// Empty means every instance type.
    pub instance_types: &'static [JsonType],
}

/// Classifies a keyword given the vocabularies active where it appears.
pub type SchemaWalker = fn(&str, &Vocabularies) -> KeywordInfo;

pub trait SchemaResolver {
    fn resolve(&self, identifier: &str) -> Result<Option<Value>>;
}

/// Metaschemas registered by `$id`, backed by the official ones.
#[derive(Clone, Debug, Default)]
pub struct MapResolver {
    schemas: IndexMap<String, Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// KEYWORD TABLE (2020-12)
// ————————————————————————————————————————————————————————————————————————————

const NUMERIC: &[JsonType] = &[JsonType::Number];
const STRING: &[JsonType] = &[JsonType::String];
const ARRAY: &[JsonType] = &[JsonType::Array];
const OBJECT: &[JsonType] = &[JsonType::Object];
const ANY: &[JsonType] = &[];

const fn keyword(
    keyword: &'static str,
    vocabulary: &'static str,
    role: KeywordRole,
    dependencies: &'static [&'static str],
    instance_types: &'static [JsonType],
) -> KeywordInfo {
    KeywordInfo { keyword, vocabulary, role, dependencies, instance_types }
}

use KeywordRole::*;
use vocabulary::*;

pub const KEYWORDS: &[KeywordInfo] = &[
    keyword("$schema", CORE, Identity, &[], ANY),
    keyword("$id", CORE, Identity, &[], ANY),
    keyword("$anchor", CORE, Identity, &[], ANY),
    keyword("$dynamicAnchor", CORE, Identity, &[], ANY),
    keyword("$vocabulary", CORE, Identity, &[], ANY),
    keyword("$ref", CORE, Reference, &[], ANY),
    keyword("$dynamicRef", CORE, Reference, &[], ANY),
    keyword("$comment", CORE, Comment, &[], ANY),
    keyword("$defs", CORE, SubschemaMembers, &[], ANY),
    // applicator
    keyword("allOf", APPLICATOR, SubschemaElements, &[], ANY),
    keyword("anyOf", APPLICATOR, SubschemaElements, &[], ANY),
    keyword("oneOf", APPLICATOR, SubschemaElements, &[], ANY),
    keyword("not", APPLICATOR, SubschemaValue, &[], ANY),
    keyword("if", APPLICATOR, SubschemaValue, &[], ANY),
    keyword("then", APPLICATOR, SubschemaValue, &["if"], ANY),
    keyword("else", APPLICATOR, SubschemaValue, &["if"], ANY),
    keyword("dependentSchemas", APPLICATOR, SubschemaMembers, &[], OBJECT),
    keyword("prefixItems", APPLICATOR, SubschemaElements, &[], ARRAY),
    keyword("items", APPLICATOR, SubschemaValue, &["prefixItems"], ARRAY),
    keyword("contains", APPLICATOR, SubschemaValue, &[], ARRAY),
    keyword("properties", APPLICATOR, SubschemaMembers, &[], OBJECT),
    keyword("patternProperties", APPLICATOR, SubschemaMembers, &[], OBJECT),
    keyword("additionalProperties", APPLICATOR, SubschemaValue, &["properties", "patternProperties"], OBJECT),
    keyword("propertyNames", APPLICATOR, SubschemaValue, &[], OBJECT),
    // unevaluated
    keyword("unevaluatedItems", UNEVALUATED, SubschemaValue, &["prefixItems", "items", "contains"], ARRAY),
    keyword("unevaluatedProperties", UNEVALUATED, SubschemaValue, &["properties", "patternProperties", "additionalProperties"], OBJECT),
    // validation
    keyword("type", VALIDATION, Assertion, &[], ANY),
    keyword("enum", VALIDATION, Assertion, &[], ANY),
    keyword("const", VALIDATION, Assertion, &[], ANY),
    keyword("multipleOf", VALIDATION, Assertion, &[], NUMERIC),
    keyword("maximum", VALIDATION, Assertion, &[], NUMERIC),
    keyword("exclusiveMaximum", VALIDATION, Assertion, &[], NUMERIC),
    keyword("minimum", VALIDATION, Assertion, &[], NUMERIC),
    keyword("exclusiveMinimum", VALIDATION, Assertion, &[], NUMERIC),
    keyword("maxLength", VALIDATION, Assertion, &[], STRING),
    keyword("minLength", VALIDATION, Assertion, &[], STRING),
    keyword("pattern", VALIDATION, Assertion, &[], STRING),
    keyword("maxItems", VALIDATION, Assertion, &[], ARRAY),
    keyword("minItems", VALIDATION, Assertion, &[], ARRAY),
    keyword("uniqueItems", VALIDATION, Assertion, &[], ARRAY),
    keyword("maxContains", VALIDATION, Assertion, &["contains"], ARRAY),
    keyword("minContains", VALIDATION, Assertion, &["contains"], ARRAY),
    keyword("maxProperties", VALIDATION, Assertion, &[], OBJECT),
    keyword("minProperties", VALIDATION, Assertion, &[], OBJECT),
    keyword("required", VALIDATION, Assertion, &[], OBJECT),
    keyword("dependentRequired", VALIDATION, Assertion, &[], OBJECT),
    // meta-data
    keyword("title", META_DATA, Annotation, &[], ANY),
    keyword("description", META_DATA, Annotation, &[], ANY),
    keyword("default", META_DATA, Annotation, &[], ANY),
    keyword("deprecated", META_DATA, Annotation, &[], ANY),
    keyword("readOnly", META_DATA, Annotation, &[], ANY),
    keyword("writeOnly", META_DATA, Annotation, &[], ANY),
    keyword("examples", META_DATA, Annotation, &[], ANY),
    // format
    keyword("format", FORMAT_ANNOTATION, Annotation, &[], STRING),
    keyword("format", FORMAT_ASSERTION, Assertion, &[], STRING),
    // content
    keyword("contentEncoding", CONTENT, Annotation, &[], STRING),
    keyword("contentMediaType", CONTENT, Annotation, &[], STRING),
    keyword("contentSchema", CONTENT, SubschemaValue, &["contentMediaType"], STRING),
];

// ————————————————————————————————————————————————————————————————————————————
// OFFICIAL METASCHEMAS
// ————————————————————————————————————————————————————————————————————————————

static OFFICIAL_METASCHEMAS: Lazy<IndexMap<&'static str, Value>> = Lazy::new(|| {
    let mut out = IndexMap::new();
    out.insert(DRAFT_2020_12, json!({
        "$schema": DRAFT_2020_12,
        "$id": DRAFT_2020_12,
        "$vocabulary": {
            CORE: true,
            APPLICATOR: true,
            UNEVALUATED: true,
            VALIDATION: true,
            META_DATA: true,
            FORMAT_ANNOTATION: true,
            CONTENT: true
        },
        "$dynamicAnchor": "meta",
        "title": "Core and Validation specifications meta-schema"
    }));
    out.insert(DRAFT_2019_09, json!({
        "$schema": DRAFT_2019_09,
        "$id": DRAFT_2019_09,
        "$vocabulary": {
            "https://json-schema.org/draft/2019-09/vocab/core": true,
            "https://json-schema.org/draft/2019-09/vocab/applicator": true,
            "https://json-schema.org/draft/2019-09/vocab/validation": true,
            "https://json-schema.org/draft/2019-09/vocab/meta-data": true,
            "https://json-schema.org/draft/2019-09/vocab/format": false,
            "https://json-schema.org/draft/2019-09/vocab/content": true
        },
        "$recursiveAnchor": true
    }));
    out.insert(DRAFT_07, json!({ "$schema": "http://json-schema.org/draft-07/schema#", "$id": "http://json-schema.org/draft-07/schema#" }));
    out.insert(DRAFT_06, json!({ "$schema": "http://json-schema.org/draft-06/schema#", "$id": "http://json-schema.org/draft-06/schema#" }));
    out.insert(DRAFT_04, json!({ "$schema": "http://json-schema.org/draft-04/schema#", "id": "http://json-schema.org/draft-04/schema#" }));
    out
});

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Vocabularies {
    pub fn contains(&self, uri: &str) -> bool {
        self.0.contains(uri)
    }
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabularies {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Pointer {
    pub fn root() -> Self {
        Self::default()
    }
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
    pub fn join(&self, token: impl ToString) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(token.to_string());
        Self(tokens)
    }
    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl KeywordInfo {
    pub const fn unknown() -> Self {
        keyword("", "", KeywordRole::Unknown, &[], ANY)
    }

    pub fn applies_to(&self, ty: JsonType) -> bool {
        self.instance_types.is_empty() || self.instance_types.contains(&ty.widen())
    }
}

/// Walker for JSON Schema 2020-12. Keywords from inactive vocabularies are
/// reported as unknown, so nothing descends into them.
pub fn default_schema_walker(keyword: &str, vocabularies: &Vocabularies) -> KeywordInfo {
    KEYWORDS
        .iter()
        .find(|info| info.keyword == keyword && vocabularies.contains(info.vocabulary))
        .copied()
        .unwrap_or(KeywordInfo::unknown())
}

impl<F> SchemaResolver for F
where
    F: Fn(&str) -> Result<Option<Value>>,
{
    fn resolve(&self, identifier: &str) -> Result<Option<Value>> {
        self(identifier)
    }
}

/// Resolves the official JSON Schema metaschemas.
pub fn official_resolver(identifier: &str) -> Result<Option<Value>> {
    Ok(OFFICIAL_METASCHEMAS.get(normalize_id(identifier)).cloned())
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its `$id`. Returns `false` when it has none.
    pub fn add(&mut self, schema: Value) -> bool {
        let Some(id) = schema.get("$id").and_then(Value::as_str) else {
            return false;
        };
        self.schemas.insert(normalize_id(id).to_string(), schema);
        true
    }
}

impl SchemaResolver for MapResolver {
    fn resolve(&self, identifier: &str) -> Result<Option<Value>> {
        match self.schemas.get(normalize_id(identifier)) {
            Some(schema) => Ok(Some(schema.clone())),
            None => official_resolver(identifier),
        }
    }
}

/// Dialect identifiers compare without an empty trailing fragment.
pub fn normalize_id(identifier: &str) -> &str {
    identifier.strip_suffix('#').unwrap_or(identifier)
}

pub fn declared_dialect(schema: &Value) -> Option<&str> {
    schema.get("$schema").and_then(Value::as_str)
}

/// Dialect of the document root, falling back to the caller's default.
pub fn root_dialect(schema: &Value, default_dialect: Option<&str>) -> Result<String> {
    declared_dialect(schema)
        .or(default_dialect)
        .map(|dialect| normalize_id(dialect).to_string())
        .ok_or(Error::UnknownDialect)
}

/// The metaschema of `dialect`. Resolvers must answer with a JSON object.
pub fn metaschema(dialect: &str, resolver: &dyn SchemaResolver) -> Result<Value> {
    let meta = resolver
        .resolve(normalize_id(dialect))?
        .ok_or_else(|| Error::UnresolvedMetaschema(dialect.to_string()))?;
    if !meta.is_object() {
        return Err(Error::Resolver {
            id: dialect.to_string(),
            message: format!("expected a metaschema object, got {}", json::type_of(&meta).as_str()),
        });
    }
    Ok(meta)
}

/// Follow `$schema` links until a metaschema describes itself.
pub fn base_dialect(dialect: &str, resolver: &dyn SchemaResolver) -> Result<String> {
    let mut current = normalize_id(dialect).to_string();
    for _ in 0..MAX_METASCHEMA_DEPTH {
        let meta = metaschema(&current, resolver)?;
        match declared_dialect(&meta).map(normalize_id) {
            Some(parent) if parent != current => current = parent.to_string(),
            _ => return Ok(current),
        }
    }
    Err(Error::UnresolvedMetaschema(dialect.to_string()))
}

/// Vocabularies declared by the nearest metaschema that has `$vocabulary`.
/// Dialects that predate vocabularies report themselves as the only one.
pub fn vocabularies(dialect: &str, resolver: &dyn SchemaResolver) -> Result<Vocabularies> {
    let mut current = normalize_id(dialect).to_string();
    for _ in 0..MAX_METASCHEMA_DEPTH {
        let meta = metaschema(&current, resolver)?;
        if let Some(Value::Object(declared)) = meta.get("$vocabulary") {
            return Ok(declared.keys().cloned().collect());
        }
        match declared_dialect(&meta).map(normalize_id) {
            Some(parent) if parent != current => current = parent.to_string(),
            _ => return Ok(Vocabularies::from_iter([current])),
        }
    }
    Err(Error::UnresolvedMetaschema(dialect.to_string()))
}

// ————————————————————————————————————————————————————————————————————————————
// NODE ACCESSORS
// ————————————————————————————————————————————————————————————————————————————

pub fn defines(schema: &Value, keyword: &str) -> bool {
    schema.as_object().is_some_and(|map| map.contains_key(keyword))
}

pub fn defines_any(schema: &Value, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| defines(schema, keyword))
}

/// The single type named by a string `type`.
pub fn declared_type(schema: &Value) -> Option<JsonType> {
    schema.get("type").and_then(Value::as_str).and_then(JsonType::parse)
}

pub fn type_is(schema: &Value, ty: JsonType) -> bool {
    declared_type(schema) == Some(ty)
}

pub fn erase(schema: &mut Value, keyword: &str) {
    if let Some(map) = schema.as_object_mut() {
        map.shift_remove(keyword);
    }
}

pub fn assign(schema: &mut Value, keyword: &str, value: Value) {
    if let Some(map) = schema.as_object_mut() {
        map.insert(keyword.to_string(), value);
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vocabularies_of_2020_12() {
        let vocabs = vocabularies(DRAFT_2020_12, &official_resolver).unwrap();
        assert_eq!(vocabs.len(), 7);
        assert!(vocabs.contains(VALIDATION));
        assert!(!vocabs.contains(FORMAT_ASSERTION));
    }

    #[test]
    fn legacy_dialects_name_themselves() {
        let vocabs = vocabularies("http://json-schema.org/draft-07/schema#", &official_resolver).unwrap();
        assert_eq!(vocabs.iter().collect::<Vec<_>>(), vec![DRAFT_07]);
        assert_eq!(base_dialect(DRAFT_04, &official_resolver).unwrap(), DRAFT_04);
    }

    #[test]
    fn custom_metaschema_inherits() {
        let mut resolver = MapResolver::new();
        assert!(resolver.add(json!({
            "$id": "https://example.com/meta",
            "$schema": DRAFT_2020_12
        })));
        assert_eq!(base_dialect("https://example.com/meta", &resolver).unwrap(), DRAFT_2020_12);
        let vocabs = vocabularies("https://example.com/meta", &resolver).unwrap();
        assert!(vocabs.contains(APPLICATOR));
    }

    #[test]
    fn unresolvable_metaschema() {
        let err = base_dialect("https://example.com/nope", &official_resolver).unwrap_err();
        assert!(matches!(err, Error::UnresolvedMetaschema(_)));
        let err = root_dialect(&json!({"type": "string"}), None).unwrap_err();
        assert!(matches!(err, Error::UnknownDialect));
    }

    #[test]
    fn non_object_metaschemas_are_rejected() {
        let resolver = |identifier: &str| -> Result<Option<Value>> {
            match identifier {
                "https://example.com/broken" => Ok(Some(json!(["not", "a", "schema"]))),
                _ => official_resolver(identifier),
            }
        };
        let err = vocabularies("https://example.com/broken#", &resolver).unwrap_err();
        assert!(matches!(err, Error::Resolver { ref id, .. } if id == "https://example.com/broken"));
        assert_eq!(
            err.to_string(),
            "resolver failed for https://example.com/broken: expected a metaschema object, got array"
        );
        assert!(vocabularies(DRAFT_2020_12, &resolver).is_ok());
    }

    #[test]
    fn walker_roles_follow_vocabularies() {
        let vocabs = vocabularies(DRAFT_2020_12, &official_resolver).unwrap();
        assert_eq!(default_schema_walker("properties", &vocabs).role, SubschemaMembers);
        assert_eq!(default_schema_walker("anyOf", &vocabs).role, SubschemaElements);
        assert_eq!(default_schema_walker("then", &vocabs).dependencies, &["if"]);
        assert_eq!(default_schema_walker("x-custom", &vocabs).role, Unknown);
        let core_only = Vocabularies::from_iter([CORE]);
        assert_eq!(default_schema_walker("items", &core_only).role, Unknown);
        assert_eq!(default_schema_walker("$defs", &core_only).role, SubschemaMembers);
    }

    #[test]
    fn keyword_applicability() {
        let vocabs = vocabularies(DRAFT_2020_12, &official_resolver).unwrap();
        let multiple_of = default_schema_walker("multipleOf", &vocabs);
        assert!(multiple_of.applies_to(JsonType::Integer));
        assert!(!multiple_of.applies_to(JsonType::String));
        assert!(default_schema_walker("enum", &vocabs).applies_to(JsonType::Null));
    }

    #[test]
    fn pointer_escaping() {
        let pointer = Pointer::root().join("properties").join("a/b~c").join(0);
        assert_eq!(pointer.to_string(), "/properties/a~1b~0c/0");
        assert!(Pointer::root().is_root());
    }

    #[test]
    fn erase_keeps_keyword_order() {
        let mut schema = json!({"a": 1, "b": 2, "c": 3});
        erase(&mut schema, "a");
        assign(&mut schema, "d", json!(4));
        assert_eq!(schema.as_object().unwrap().keys().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }
}
