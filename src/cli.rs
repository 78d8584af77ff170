//! Minimal CLI: compile → (schema | rust | ir)
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::compiler::Compiler;
use crate::ir::Ty;
use crate::loader::{DefaultLoader, Location};
use crate::registry::Registry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON Schema documents into a typed model and print it as a normalized schema, Rust source, or raw IR
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log reference resolution and loader activity to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile and print the normalized, reference-free JSON Schema
    Schema(JsonSchemaOut),
    /// compile and emit a Rust data model
    Rust(RustOut),
    /// compile and print the raw compiled IR as JSON
    Ir(JsonSchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to compile a subnode of each document (e.g. /definitions/item)
    #[arg(long)]
    json_pointer: Option<String>,

    /// network fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// One or more inputs. May be literal paths, quoted glob patterns or URLs
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct JsonSchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// top-level Rust type name (single input only; otherwise the file stem is used)
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Compile every input independently and in parallel, each with its own
    /// registry. Results keep input order.
    fn compile_all(&self) -> Result<Vec<(String, Ty)>> {
        let sources = resolve_inputs(&self.input)?;
        let compiler = Compiler::with_loader(DefaultLoader::with_timeout(Duration::from_secs(
            self.timeout_secs,
        )));
        sources
            .par_iter()
            .map(|source| {
                info!(%source, "compiling");
                let reference = match &self.json_pointer {
                    Some(pointer) => format!("{source}#{pointer}"),
                    None => source.clone(),
                };
                let ty = compiler
                    .compile(json!({ "$ref": reference }), &Registry::new())
                    .with_context(|| format!("failed to compile {source}"))?;
                Ok((source.clone(), ty))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let compiled = target.input_settings.compile_all()?;
                let doc = keyed(compiled, crate::emit::schema_from_ty);
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&doc)?)
            }
            Command::Ir(target) => {
                let compiled = target.input_settings.compile_all()?;
                let mut values = Vec::with_capacity(compiled.len());
                for (source, ty) in compiled {
                    values.push((source, serde_json::to_value(&ty)?));
                }
                let doc = keyed(values, |value| value.clone());
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&doc)?)
            }
            Command::Rust(target) => {
                let compiled = target.input_settings.compile_all()?;
                let single = compiled.len() == 1;
                let mut cg = crate::codegen::Codegen::new();
                for (source, ty) in &compiled {
                    let root = if single { target.root_type.clone() } else { file_stem(source) };
                    cg.emit(ty, &root);
                }
                write_output(target.out.as_deref(), &cg.into_string())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// One input prints bare; several print as an object keyed by input.
fn keyed<T>(compiled: Vec<(String, T)>, render: impl Fn(&T) -> Value) -> Value {
    if compiled.len() == 1 {
        return render(&compiled[0].1);
    }
    let mut map = Map::new();
    for (source, item) in &compiled {
        map.insert(source.clone(), render(item));
    }
    Value::Object(map)
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn file_stem(source: &str) -> String {
    let stem = match Location::parse(source) {
        Location::Url(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default(),
        Location::Path(path) => path.to_string_lossy().to_string(),
    };
    let name = Path::new(&stem).file_name().map(|s| s.to_string_lossy().to_string());
    let stem = name.unwrap_or(stem);
    // strip every extension: `item.schema.json` → `item`
    stem.split('.').next().unwrap_or_default().to_string()
}

fn resolve_inputs<I>(patterns: I) -> Result<Vec<String>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<String>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if matches!(Location::parse(pattern), Location::Url(_)) || !has_glob_chars(pattern) {
            // URLs and literal paths pass through untouched
            out.push(pattern.to_string());
            continue;
        }

        let mut matched_any = false;
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
            let path = entry?;
            matched_any = true;
            out.push(path.to_string_lossy().to_string());
        }
        if !matched_any {
            // Pattern was explicitly a glob but matched nothing -> surface as an error
            bail!("glob pattern matched no files: {pattern}");
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems() {
        assert_eq!(file_stem("schemas/item.schema.json"), "item");
        assert_eq!(file_stem("https://example.com/s/links.json"), "links");
        assert_eq!(file_stem("plain"), "plain");
    }

    #[test]
    fn literal_inputs_pass_through() {
        let inputs = resolve_inputs(["a.json", "https://example.com/x?.json"]).unwrap();
        assert_eq!(inputs, vec!["a.json", "https://example.com/x?.json"]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        assert!(resolve_inputs(["/definitely/not/here/*.json"]).is_err());
    }

    #[test]
    fn parses_subcommands() {
        let cli = CommandLineInterface::try_parse_from([
            "json-model", "-v", "rust", "--root-type", "Item", "-i", "a.json", "b.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.cmd {
            Command::Rust(target) => {
                assert_eq!(target.root_type, "Item");
                assert_eq!(target.input_settings.input, vec!["a.json", "b.json"]);
                assert_eq!(target.input_settings.timeout_secs, 30);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
