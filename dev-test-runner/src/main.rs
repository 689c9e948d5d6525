//! Fixture runner: compiles every `fixtures/*.json` case end to end.
//!
//! A case is `{"description", "schema", "canonical"?, "encoding"}`. The
//! schema is canonicalized and compared against `canonical` when given, then
//! planned and compared against `encoding`. Comparisons are numeric-aware and
//! ignore key order.
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use json_binpack::schema::{DRAFT_2020_12, default_schema_walker, official_resolver};
use json_binpack::{Compiler, json};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static DEFAULT_FIXTURES: Lazy<PathBuf> =
    Lazy::new(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("fixtures"));

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// run the JSON BinPack compiler fixtures
#[derive(Parser, Debug)]
struct Settings {
    /// fixture directory (defaults to the workspace `fixtures/`)
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// only run cases whose file name or description matches this regex
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    description: String,
    schema: Value,
    #[serde(default)]
    canonical: Option<Value>,
    encoding: Value,
}

enum Outcome {
    Pass,
    Fail(String),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Case {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let de = &mut serde_json::Deserializer::from_str(&source);
        serde_path_to_error::deserialize(de).with_context(|| format!("failed to parse fixture {}", path.display()))
    }

    fn run(&self, compiler: &Compiler) -> Outcome {
        let default_dialect = Some(DRAFT_2020_12);
        let mut schema = self.schema.clone();
        if let Err(error) = compiler.canonicalize(&mut schema, default_schema_walker, &official_resolver, default_dialect) {
            return Outcome::Fail(format!("canonicalize: {error}"));
        }
        if let Some(expected) = self.canonical.as_ref()
            && !json::equal(&schema, expected)
        {
            return Outcome::Fail(mismatch("canonical form", expected, &schema));
        }
        if let Err(error) = compiler.plan(&mut schema, default_schema_walker, &official_resolver, default_dialect) {
            return Outcome::Fail(format!("plan: {error}"));
        }
        if !json::equal(&schema, &self.encoding) {
            return Outcome::Fail(mismatch("encoding", &self.encoding, &schema));
        }
        Outcome::Pass
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    let filter = settings
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --filter regex")?;
    let directory = settings.fixtures.clone().unwrap_or_else(|| DEFAULT_FIXTURES.clone());
    let pattern = directory.join("*.json");
    let mut paths = glob::glob(&pattern.to_string_lossy())?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    if paths.is_empty() {
        bail!("no fixtures found in {}", directory.display());
    }

    let compiler = Compiler::new();
    let (mut passed, mut failed) = (0usize, 0usize);
    for path in &paths {
        let name = path.file_stem().map(|stem| stem.to_string_lossy().to_string()).unwrap_or_default();
        let case = Case::load(path)?;
        if let Some(filter) = filter.as_ref()
            && !filter.is_match(&name)
            && !filter.is_match(&case.description)
        {
            continue;
        }
        match case.run(&compiler) {
            Outcome::Pass => {
                passed += 1;
                eprintln!("{} {name}: {}", "PASS".green().bold(), case.description.dimmed());
            }
            Outcome::Fail(reason) => {
                failed += 1;
                eprintln!("{} {name}: {}", "FAIL".red().bold(), case.description);
                eprintln!("{reason}");
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if failed > 0 {
        bail!("{failed} fixture(s) failed");
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn mismatch(what: &str, expected: &Value, actual: &Value) -> String {
    let pretty = |value: &Value| serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!(
        "  {what} mismatch\n  {}\n{}\n  {}\n{}",
        "expected:".yellow(),
        pretty(expected),
        "actual:".yellow(),
        pretty(actual)
    )
}
