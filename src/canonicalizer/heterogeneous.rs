//! Once a schema is pinned to one instance type, keywords that only apply to
//! other types are dead weight. There is one rule per (type, keyword family)
//! pair; the keyword lists come from the walker's table.
use serde_json::Value;

use crate::engine::Rule;
use crate::json::JsonType;
use crate::schema::{self, KEYWORDS, vocabulary};

const FAMILIES: &[(&str, &[&str])] = &[
    ("applicator", &[vocabulary::APPLICATOR]),
    ("validation", &[vocabulary::VALIDATION]),
    ("unevaluated", &[vocabulary::UNEVALUATED]),
    ("content", &[vocabulary::CONTENT]),
    ("format", &[vocabulary::FORMAT_ANNOTATION, vocabulary::FORMAT_ASSERTION]),
];

pub fn rules() -> Vec<Rule> {
    let mut rules = Vec::new();
    for ty in JsonType::ALL {
        for &(family, vocabularies) in FAMILIES {
            let blacklist = blacklist(ty, vocabularies);
            if !blacklist.is_empty() {
                rules.push(drop_non_type_keywords(ty, family, vocabularies, blacklist));
            }
        }
    }
    rules
}

/// Keywords of the given vocabularies that never apply to `ty`.
pub fn blacklist(ty: JsonType, vocabularies: &[&str]) -> Vec<&'static str> {
    let mut keywords = KEYWORDS
        .iter()
        .filter(|info| vocabularies.contains(&info.vocabulary) && !info.applies_to(ty))
        .map(|info| info.keyword)
        .collect::<Vec<_>>();
    keywords.dedup();
    keywords
}

/// The single type a schema admits. `null` and `boolean` are recognised
/// from their enum spelling too, since sugar rewrites their `type` away.
fn pinned_type(schema: &Value) -> Option<JsonType> {
    if let Some(ty) = schema::declared_type(schema) {
        return Some(ty);
    }
    if schema::defines(schema, "type") {
        return None;
    }
    let values = schema.get("enum")?.as_array()?;
    if values.is_empty() {
        None
    } else if values.iter().all(Value::is_null) {
        Some(JsonType::Null)
    } else if values.iter().all(Value::is_boolean) {
        Some(JsonType::Boolean)
    } else {
        None
    }
}

fn drop_non_type_keywords(
    ty: JsonType,
    family: &str,
    vocabularies: &'static [&'static str],
    blacklist: Vec<&'static str>,
) -> Rule {
    let condition_blacklist = blacklist.clone();
    Rule::new(
        format!("drop_non_{}_{}_keywords", ty.as_str(), family),
        move |schema, context| {
            vocabularies.iter().any(|uri| context.has_vocabulary(uri))
                && pinned_type(schema) == Some(ty)
                && schema::defines_any(schema, &condition_blacklist)
        },
        move |schema| {
            for keyword in &blacklist {
                schema::erase(schema, keyword);
            }
        },
    )
}
