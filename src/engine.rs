//! Fixed-point rule engine shared by the canonicalizer and the mapper.
//!
//! A [`RuleSet`] is walked over every subschema in pre-order. At each node the
//! first rule whose condition holds is applied, repeatedly, until none holds;
//! then the walk descends. Any mutation makes the whole tree dirty and the
//! walk starts over, so the result is a fixed point of the set.
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::schema::{
    self, KeywordRole, Pointer, SchemaResolver, SchemaWalker, Vocabularies,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// What a rule condition gets to see besides the node itself.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    pub dialect: &'a str,
    pub base_dialect: &'a str,
    pub vocabularies: &'a Vocabularies,
    pub pointer: &'a Pointer,
}

type Condition = Box<dyn Fn(&Value, &RuleContext<'_>) -> bool + Send + Sync>;
type Transform = Box<dyn Fn(&mut Value) + Send + Sync>;

pub struct Rule {
    name: String,
    condition: Condition,
    transform: Transform,
}

/// Ordered rule registry. Order decides which rule wins at a node when
/// several match.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

struct Frame {
    base_dialect: String,
    vocabularies: Vocabularies,
}

struct Session<'a> {
    walker: SchemaWalker,
    resolver: &'a dyn SchemaResolver,
    frames: HashMap<String, Rc<Frame>>,
    applied: usize,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RuleContext<'_> {
    pub fn has_vocabulary(&self, uri: &str) -> bool {
        self.vocabularies.contains(uri)
    }

    pub fn is_base(&self, dialect: &str) -> bool {
        self.base_dialect == dialect
    }
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        condition: impl Fn(&Value, &RuleContext<'_>) -> bool + Send + Sync + 'static,
        transform: impl Fn(&mut Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            condition: Box::new(condition),
            transform: Box::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn condition(&self, schema: &Value, context: &RuleContext<'_>) -> bool {
        (self.condition)(schema, context)
    }

    pub fn transform(&self, schema: &mut Value) {
        (self.transform)(schema)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish_non_exhaustive()
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(Rule::name)
    }

    /// Rewrite `schema` in place until no rule matches anywhere.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn apply(
        &self,
        schema: &mut Value,
        walker: SchemaWalker,
        resolver: &dyn SchemaResolver,
        default_dialect: Option<&str>,
    ) -> Result<()> {
        let root_dialect = schema::root_dialect(schema, default_dialect)?;
        let mut session = Session {
            walker,
            resolver,
            frames: HashMap::new(),
            applied: 0,
        };
        let mut passes = 0usize;
        loop {
            passes += 1;
            let changed = self.visit(schema, &root_dialect, &Pointer::root(), &mut session)?;
            tracing::trace!(passes, changed, "rule pass finished");
            if !changed {
                tracing::debug!(passes, applied = session.applied, "fixed point reached");
                return Ok(());
            }
        }
    }

    fn visit(
        &self,
        schema: &mut Value,
        inherited_dialect: &str,
        pointer: &Pointer,
        session: &mut Session<'_>,
    ) -> Result<bool> {
        let mut changed = false;
        let (dialect, frame) = loop {
            let dialect = schema::declared_dialect(schema)
                .map(schema::normalize_id)
                .unwrap_or(inherited_dialect)
                .to_string();
            let frame = session.frame(&dialect)?;
            let context = RuleContext {
                dialect: &dialect,
                base_dialect: &frame.base_dialect,
                vocabularies: &frame.vocabularies,
                pointer,
            };
            let Some(rule) = self.rules.iter().find(|rule| rule.condition(schema, &context)) else {
                break (dialect, frame);
            };
            tracing::debug!(rule = rule.name(), pointer = %pointer, "applying rule");
            rule.transform(schema);
            session.applied += 1;
            changed = true;
        };

        let Value::Object(map) = schema else {
            return Ok(changed);
        };
        for (keyword, child) in map.iter_mut() {
            let info = (session.walker)(keyword, &frame.vocabularies);
            match (info.role, child) {
                (KeywordRole::SubschemaValue, child) => {
                    changed |= self.visit(child, &dialect, &pointer.join(keyword), session)?;
                }
                (KeywordRole::SubschemaElements, Value::Array(items)) => {
                    let base = pointer.join(keyword);
                    for (index, item) in items.iter_mut().enumerate() {
                        changed |= self.visit(item, &dialect, &base.join(index), session)?;
                    }
                }
                (KeywordRole::SubschemaMembers, Value::Object(members)) => {
                    let base = pointer.join(keyword);
                    for (name, member) in members.iter_mut() {
                        changed |= self.visit(member, &dialect, &base.join(name), session)?;
                    }
                }
                _ => {}
            }
        }
        Ok(changed)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self { rules: iter.into_iter().collect() }
    }
}

impl Extend<Rule> for RuleSet {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        self.rules.extend(iter)
    }
}

impl Session<'_> {
    fn frame(&mut self, dialect: &str) -> Result<Rc<Frame>> {
        if let Some(frame) = self.frames.get(dialect) {
            return Ok(Rc::clone(frame));
        }
        let frame = Rc::new(Frame {
            base_dialect: schema::base_dialect(dialect, self.resolver)?,
            vocabularies: schema::vocabularies(dialect, self.resolver)?,
        });
        self.frames.insert(dialect.to_string(), Rc::clone(&frame));
        Ok(frame)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
