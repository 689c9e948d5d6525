//! Encoding documents: the mapper's output and the codec runtime's input.
//!
//! On the wire an encoding is `{"$schema": ENCODING_V1, "name": KIND,
//! "options": {...}}`. Inside the compiler it is just JSON (see
//! [`make_encoding`]); [`Encoding`] is the typed view used to validate and
//! round-trip finished plans.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::path_de;
use crate::schema::{self, DRAFT_2020_12, SchemaResolver, vocabulary};

pub const ENCODING_V1: &str = "https://jsonbinpack.sourcemeta.com/schemas/encoding/v1.json";

static ENCODING_METASCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$id": ENCODING_V1,
        "$schema": DRAFT_2020_12,
        "$vocabulary": { vocabulary::CORE: true },
        "type": "object",
        "required": [ "name", "options" ],
        "properties": {
            "name": { "type": "string" },
            "options": { "type": "object" }
        }
    })
});

/// Every kind name the runtime knows how to load.
pub const ENCODING_KINDS: &[&str] = &[
    "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
    "FLOOR_MULTIPLE_ENUM_VARINT",
    "ROOF_MULTIPLE_MIRROR_ENUM_VARINT",
    "ARBITRARY_MULTIPLE_ZIGZAG_VARINT",
    "DOUBLE_VARINT_TUPLE",
    "BYTE_CHOICE_INDEX",
    "LARGE_CHOICE_INDEX",
    "TOP_LEVEL_BYTE_CHOICE_INDEX",
    "CONST_NONE",
    "ANY_PACKED_TYPE_TAG_BYTE_PREFIX",
    "UTF8_STRING_NO_LENGTH",
    "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED",
    "ROOF_VARINT_PREFIX_UTF8_STRING_SHARED",
    "BOUNDED_8BIT_PREFIX_UTF8_STRING_SHARED",
    "RFC3339_DATE_INTEGER_TRIPLET",
    "PREFIX_VARINT_LENGTH_STRING_SHARED",
    "FIXED_TYPED_ARRAY",
    "BOUNDED_8BITS_TYPED_ARRAY",
    "FLOOR_TYPED_ARRAY",
    "ROOF_TYPED_ARRAY",
];

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "options")]
pub enum Encoding {
    // integers
    #[serde(rename = "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED")]
    BoundedMultiple8BitsEnumFixed { minimum: i64, maximum: i64, multiplier: u64 },
    #[serde(rename = "FLOOR_MULTIPLE_ENUM_VARINT")]
    FloorMultipleEnumVarint { minimum: i64, multiplier: u64 },
    #[serde(rename = "ROOF_MULTIPLE_MIRROR_ENUM_VARINT")]
    RoofMultipleMirrorEnumVarint { maximum: i64, multiplier: u64 },
    #[serde(rename = "ARBITRARY_MULTIPLE_ZIGZAG_VARINT")]
    ArbitraryMultipleZigzagVarint { multiplier: u64 },

    // numbers
    #[serde(rename = "DOUBLE_VARINT_TUPLE")]
    DoubleVarintTuple {},

    // enumerations
    #[serde(rename = "BYTE_CHOICE_INDEX")]
    ByteChoiceIndex { choices: Vec<Value> },
    #[serde(rename = "LARGE_CHOICE_INDEX")]
    LargeChoiceIndex { choices: Vec<Value> },
    #[serde(rename = "TOP_LEVEL_BYTE_CHOICE_INDEX")]
    TopLevelByteChoiceIndex { choices: Vec<Value> },
    #[serde(rename = "CONST_NONE")]
    ConstNone { value: Value },

    // any
    #[serde(rename = "ANY_PACKED_TYPE_TAG_BYTE_PREFIX")]
    AnyPackedTypeTagBytePrefix {},

    // strings
    #[serde(rename = "UTF8_STRING_NO_LENGTH")]
    Utf8StringNoLength { size: u64 },
    #[serde(rename = "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED")]
    FloorVarintPrefixUtf8StringShared { minimum: u64 },
    #[serde(rename = "ROOF_VARINT_PREFIX_UTF8_STRING_SHARED")]
    RoofVarintPrefixUtf8StringShared { maximum: u64 },
    #[serde(rename = "BOUNDED_8BIT_PREFIX_UTF8_STRING_SHARED")]
    Bounded8BitPrefixUtf8StringShared { minimum: u64, maximum: u64 },
    #[serde(rename = "RFC3339_DATE_INTEGER_TRIPLET")]
    Rfc3339DateIntegerTriplet {},
    #[serde(rename = "PREFIX_VARINT_LENGTH_STRING_SHARED")]
    PrefixVarintLengthStringShared {},

    // arrays
    #[serde(rename = "FIXED_TYPED_ARRAY")]
    FixedTypedArray {
        size: u64,
        encoding: Box<Encoding>,
        #[serde(rename = "prefixEncodings")]
        prefix_encodings: Vec<Encoding>,
    },
    #[serde(rename = "BOUNDED_8BITS_TYPED_ARRAY")]
    Bounded8BitsTypedArray {
        minimum: u64,
        maximum: u64,
        encoding: Box<Encoding>,
        #[serde(rename = "prefixEncodings")]
        prefix_encodings: Vec<Encoding>,
    },
    #[serde(rename = "FLOOR_TYPED_ARRAY")]
    FloorTypedArray {
        minimum: u64,
        encoding: Box<Encoding>,
        #[serde(rename = "prefixEncodings")]
        prefix_encodings: Vec<Encoding>,
    },
    #[serde(rename = "ROOF_TYPED_ARRAY")]
    RoofTypedArray {
        maximum: u64,
        encoding: Box<Encoding>,
        #[serde(rename = "prefixEncodings")]
        prefix_encodings: Vec<Encoding>,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::BoundedMultiple8BitsEnumFixed { .. } => "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
            Encoding::FloorMultipleEnumVarint { .. } => "FLOOR_MULTIPLE_ENUM_VARINT",
            Encoding::RoofMultipleMirrorEnumVarint { .. } => "ROOF_MULTIPLE_MIRROR_ENUM_VARINT",
            Encoding::ArbitraryMultipleZigzagVarint { .. } => "ARBITRARY_MULTIPLE_ZIGZAG_VARINT",
            Encoding::DoubleVarintTuple {} => "DOUBLE_VARINT_TUPLE",
            Encoding::ByteChoiceIndex { .. } => "BYTE_CHOICE_INDEX",
            Encoding::LargeChoiceIndex { .. } => "LARGE_CHOICE_INDEX",
            Encoding::TopLevelByteChoiceIndex { .. } => "TOP_LEVEL_BYTE_CHOICE_INDEX",
            Encoding::ConstNone { .. } => "CONST_NONE",
            Encoding::AnyPackedTypeTagBytePrefix {} => "ANY_PACKED_TYPE_TAG_BYTE_PREFIX",
            Encoding::Utf8StringNoLength { .. } => "UTF8_STRING_NO_LENGTH",
            Encoding::FloorVarintPrefixUtf8StringShared { .. } => "FLOOR_VARINT_PREFIX_UTF8_STRING_SHARED",
            Encoding::RoofVarintPrefixUtf8StringShared { .. } => "ROOF_VARINT_PREFIX_UTF8_STRING_SHARED",
            Encoding::Bounded8BitPrefixUtf8StringShared { .. } => "BOUNDED_8BIT_PREFIX_UTF8_STRING_SHARED",
            Encoding::Rfc3339DateIntegerTriplet {} => "RFC3339_DATE_INTEGER_TRIPLET",
            Encoding::PrefixVarintLengthStringShared {} => "PREFIX_VARINT_LENGTH_STRING_SHARED",
            Encoding::FixedTypedArray { .. } => "FIXED_TYPED_ARRAY",
            Encoding::Bounded8BitsTypedArray { .. } => "BOUNDED_8BITS_TYPED_ARRAY",
            Encoding::FloorTypedArray { .. } => "FLOOR_TYPED_ARRAY",
            Encoding::RoofTypedArray { .. } => "ROOF_TYPED_ARRAY",
        }
    }

    /// Parse a full encoding document, `$schema` included.
    pub fn from_value(document: &Value) -> Result<Self> {
        let dialect = schema::declared_dialect(document).map(schema::normalize_id);
        if dialect != Some(ENCODING_V1) {
            return Err(Error::InvalidEncoding {
                path: "$schema".to_string(),
                message: format!("expected {ENCODING_V1}"),
            });
        }
        Self::from_node(document)
    }

    /// Parse `{"name", "options"}`; any `$schema` is ignored.
    pub fn from_node(node: &Value) -> Result<Self> {
        let name = node
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidEncoding {
                path: "name".to_string(),
                message: "missing encoding name".to_string(),
            })?;
        if !ENCODING_KINDS.contains(&name) {
            return Err(Error::UnrecognizedEncoding(name.to_string()));
        }
        Ok(path_de::from_value_with_path(node.clone())?)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let document = path_de::from_str_with_path::<Value>(source)?;
        Self::from_value(&document)
    }

    /// The wire form, `$schema` first.
    pub fn to_value(&self) -> Value {
        let mut document = Map::new();
        document.insert("$schema".to_string(), Value::from(ENCODING_V1));
        document.insert("name".to_string(), Value::from(self.name()));
        let options = serde_json::to_value(self)
            .ok()
            .and_then(|mut tagged| tagged.get_mut("options").map(Value::take))
            .unwrap_or_else(|| Value::Object(Map::new()));
        document.insert("options".to_string(), options);
        Value::Object(document)
    }
}

/// Answers the encoding metaschema itself and delegates everything else.
pub struct EncodingResolver<'a> {
    inner: &'a dyn SchemaResolver,
}

impl<'a> EncodingResolver<'a> {
    pub fn new(inner: &'a dyn SchemaResolver) -> Self {
        Self { inner }
    }
}

impl SchemaResolver for EncodingResolver<'_> {
    fn resolve(&self, identifier: &str) -> Result<Option<Value>> {
        if schema::normalize_id(identifier) == ENCODING_V1 {
            return Ok(Some(encoding_metaschema()));
        }
        self.inner.resolve(identifier)
    }
}

/// The metaschema every encoding node declares. Only the core vocabulary is
/// active, so no schema rule ever matches an encoding.
pub fn encoding_metaschema() -> Value {
    ENCODING_METASCHEMA.clone()
}

pub fn is_encoding(dialect: &str, node: &Value) -> bool {
    dialect == ENCODING_V1 && schema::defines(node, "name") && schema::defines(node, "options")
}

/// Replace `node` wholesale with an encoding of the given kind.
pub fn make_encoding(node: &mut Value, name: &str, options: Value) {
    *node = json!({
        "$schema": ENCODING_V1,
        "name": name,
        "options": options
    });
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(document: Value) {
        let parsed = Encoding::from_value(&document).unwrap();
        assert!(crate::json::equal(&parsed.to_value(), &document), "{document}");
    }

    #[test]
    fn integer_and_enum_documents_roundtrip() {
        roundtrip(json!({
            "$schema": ENCODING_V1,
            "name": "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
            "options": { "minimum": -3, "maximum": 250, "multiplier": 1 }
        }));
        roundtrip(json!({
            "$schema": ENCODING_V1,
            "name": "TOP_LEVEL_BYTE_CHOICE_INDEX",
            "options": { "choices": [ false, true ] }
        }));
        roundtrip(json!({
            "$schema": ENCODING_V1,
            "name": "CONST_NONE",
            "options": { "value": { "nested": [ 1, "two" ] } }
        }));
        roundtrip(json!({
            "$schema": ENCODING_V1,
            "name": "DOUBLE_VARINT_TUPLE",
            "options": {}
        }));
    }

    #[test]
    fn nested_array_encoding_roundtrips() {
        let document = json!({
            "$schema": ENCODING_V1,
            "name": "FIXED_TYPED_ARRAY",
            "options": {
                "size": 2,
                "encoding": { "name": "ANY_PACKED_TYPE_TAG_BYTE_PREFIX", "options": {} },
                "prefixEncodings": [
                    { "name": "UTF8_STRING_NO_LENGTH", "options": { "size": 4 } }
                ]
            }
        });
        let parsed = Encoding::from_value(&document).unwrap();
        assert_eq!(parsed, Encoding::FixedTypedArray {
            size: 2,
            encoding: Box::new(Encoding::AnyPackedTypeTagBytePrefix {}),
            prefix_encodings: vec![Encoding::Utf8StringNoLength { size: 4 }],
        });
        roundtrip(document);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Encoding::from_value(&json!({
            "$schema": ENCODING_V1,
            "name": "ZSTD_EVERYTHING",
            "options": {}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedEncoding(name) if name == "ZSTD_EVERYTHING"));
    }

    #[test]
    fn bad_options_report_their_path() {
        let err = Encoding::parse(
            r#"{"$schema": "https://jsonbinpack.sourcemeta.com/schemas/encoding/v1.json",
                "name": "FLOOR_MULTIPLE_ENUM_VARINT",
                "options": {"minimum": "zero", "multiplier": 1}}"#,
        )
        .unwrap_err();
        match err {
            Error::InvalidEncoding { path, .. } => assert_eq!(path, "options.minimum"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn foreign_dialect_is_not_an_encoding() {
        let node = json!({ "name": "CONST_NONE", "options": { "value": 1 } });
        assert!(is_encoding(ENCODING_V1, &node));
        assert!(!is_encoding(DRAFT_2020_12, &node));
        assert!(Encoding::from_value(&node).is_err());
    }

    #[test]
    fn resolver_serves_the_encoding_metaschema() {
        let resolver = EncodingResolver::new(&schema::official_resolver);
        let vocabs = schema::vocabularies(ENCODING_V1, &resolver).unwrap();
        assert_eq!(vocabs.iter().collect::<Vec<_>>(), vec![vocabulary::CORE]);
        assert_eq!(schema::base_dialect(ENCODING_V1, &resolver).unwrap(), DRAFT_2020_12);
        assert!(schema::vocabularies(ENCODING_V1, &schema::official_resolver).is_err());
        assert!(resolver.resolve(DRAFT_2020_12).unwrap().is_some());
    }

    #[test]
    fn make_encoding_replaces_the_node() {
        let mut node = json!({ "type": "number" });
        make_encoding(&mut node, "DOUBLE_VARINT_TUPLE", json!({}));
        assert_eq!(Encoding::from_value(&node).unwrap(), Encoding::DoubleVarintTuple {});
    }
}
