//! Command line: compile | canonicalize | plan | inspect
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use json_binpack::schema::{DRAFT_2020_12, MapResolver, SchemaResolver, default_schema_walker};
use json_binpack::{Compiler, Encoding, path_de};
use rayon::prelude::*;
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON Schema 2020-12 documents into JSON BinPack encoding plans
#[derive(Parser, Debug)]
#[command(name = "json-binpack", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// canonicalize, then plan, every input schema
    Compile(SchemaOut),
    /// rewrite every input schema into canonical form
    Canonicalize(SchemaOut),
    /// plan every input schema; inputs are expected to be canonical already
    Plan(SchemaOut),
    /// parse encoding documents and print them back
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select the schema in each document (e.g. /components/schemas/Item)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// dialect assumed for schemas without `$schema`
    #[arg(long, default_value = DRAFT_2020_12)]
    default_dialect: String,

    /// extra metaschemas, registered under their `$id`
    #[arg(long, num_args = 1..)]
    metaschema: Vec<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file for a single result, or a directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    /// encoding documents; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(Clone, Copy, Debug)]
enum Stage {
    Compile,
    Canonicalize,
    Plan,
}

/// One schema read from an input; `index` is set when a source yields several.
#[derive(Debug, Clone)]
struct Document {
    source: PathBuf,
    index: Option<usize>,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> anyhow::Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let parsed = self
                .parse_source(&source)
                .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;
            let mut values = Vec::new();
            for json_value in parsed {
                let json_value = self.select(json_value)?;
                match self.jq_expr.as_ref() {
                    None => values.push(json_value),
                    Some(jq_expr) => {
                        let result = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                            format!("failed to apply jq expression to source file {}", source_path.display())
                        })?;
                        values.extend(result);
                    }
                }
            }
            let many = values.len() > 1;
            documents.extend(values.into_iter().enumerate().map(|(index, value)| Document {
                source: source_path.clone(),
                index: many.then_some(index),
                value,
            }));
        }
        Ok(documents)
    }

    fn parse_source(&self, source: &str) -> anyhow::Result<Vec<Value>> {
        if !self.ndjson {
            return Ok(vec![serde_json::from_str(source)?]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| serde_json::from_str(line).with_context(|| format!("line {}", number + 1)))
            .collect()
    }

    fn select(&self, value: Value) -> anyhow::Result<Value> {
        match self.json_pointer.as_deref() {
            None => Ok(value),
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing")),
        }
    }

    fn resolver(&self) -> anyhow::Result<MapResolver> {
        let mut resolver = MapResolver::new();
        if self.metaschema.is_empty() {
            return Ok(resolver);
        }
        for path in resolve_file_path_patterns(&self.metaschema).context("failed to resolve metaschema paths")? {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read metaschema {}", path.display()))?;
            let metaschema = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse metaschema {}", path.display()))?;
            if !resolver.add(metaschema) {
                bail!("metaschema {} has no $id", path.display());
            }
        }
        Ok(resolver)
    }
}

impl Stage {
    fn run(
        self,
        compiler: &Compiler,
        schema: &mut Value,
        resolver: &dyn SchemaResolver,
        default_dialect: &str,
    ) -> json_binpack::Result<()> {
        let default_dialect = Some(default_dialect);
        match self {
            Stage::Compile => compiler.compile(schema, default_schema_walker, resolver, default_dialect),
            Stage::Canonicalize => compiler.canonicalize(schema, default_schema_walker, resolver, default_dialect),
            Stage::Plan => compiler.plan(schema, default_schema_walker, resolver, default_dialect),
        }
    }
}

impl Document {
    fn label(&self) -> String {
        match self.index {
            Some(index) => format!("{}#{index}", self.source.display()),
            None => self.source.display().to_string(),
        }
    }

    fn file_name(&self) -> String {
        let stem = self
            .source
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "schema".to_string());
        match self.index {
            Some(index) => format!("{stem}-{index}.json"),
            None => format!("{stem}.json"),
        }
    }
}

impl SchemaOut {
    fn run(&self, stage: Stage) -> anyhow::Result<()> {
        let settings = &self.input_settings;
        let documents = settings.load_documents()?;
        let resolver = settings.resolver()?;
        let compiler = Compiler::new();

        let results = documents
            .par_iter()
            .map(|document| {
                let mut schema = document.value.clone();
                stage
                    .run(&compiler, &mut schema, &resolver, &settings.default_dialect)
                    .map(|()| schema)
            })
            .collect::<Vec<_>>();

        let mut outputs = Vec::new();
        let mut failed = 0usize;
        for (document, result) in documents.iter().zip(results) {
            match result {
                Ok(schema) => {
                    eprintln!("{} {}", "ok".green().bold(), document.label());
                    outputs.push((document, schema));
                }
                Err(error) => {
                    failed += 1;
                    eprintln!("{} {}: {error}", "failed".red().bold(), document.label());
                }
            }
        }
        write_outputs(self.out.as_deref(), &outputs)?;
        if failed > 0 {
            bail!("{failed} of {} inputs failed", documents.len());
        }
        Ok(())
    }
}

impl InspectOut {
    fn run(&self) -> anyhow::Result<()> {
        let paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut failed = 0usize;
        for path in &paths {
            let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let parsed = path_de::from_slice_with_path::<Value>(&bytes)
                .map_err(json_binpack::Error::from)
                .and_then(|document| Encoding::from_value(&document));
            match parsed {
                Ok(encoding) => {
                    eprintln!("{} {} {}", "ok".green().bold(), path.display(), encoding.name().cyan());
                    println!("{}", serde_json::to_string_pretty(&encoding.to_value())?);
                }
                Err(error) => {
                    failed += 1;
                    eprintln!("{} {}: {error}", "failed".red().bold(), path.display());
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} encoding documents are invalid", paths.len());
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        // debug path
        let no_op = match &self.cmd {
            Command::Compile(target) | Command::Canonicalize(target) | Command::Plan(target) => target.no_op,
            Command::Inspect(target) => target.no_op,
        };
        if no_op {
            eprintln!("{self:#?}");
            return Ok(());
        }
        match &self.cmd {
            Command::Compile(target) => target.run(Stage::Compile),
            Command::Canonicalize(target) => target.run(Stage::Canonicalize),
            Command::Plan(target) => target.run(Stage::Plan),
            Command::Inspect(target) => target.run(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_outputs(out: Option<&Path>, outputs: &[(&Document, Value)]) -> anyhow::Result<()> {
    let Some(out) = out else {
        for (_, schema) in outputs {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
        return Ok(());
    };
    if let [(_, schema)] = outputs
        && !out.is_dir()
    {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out, serde_json::to_string_pretty(schema)?)
            .with_context(|| format!("failed to write {}", out.display()))?;
        return Ok(());
    }
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    for (document, schema) in outputs {
        let target = out.join(document.file_name());
        std::fs::write(&target, serde_json::to_string_pretty(schema)?)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
