//! Compile every schema under a fixtures directory and report pass/fail.
//!
//! `*.fail.json` fixtures are expected to be rejected; everything else must
//! compile. Exits non-zero on any mismatch.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use json_model::{Registry, compile};

const DEFAULT_FIXTURES: &str = "tests/fixtures";

fn expects_failure(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".fail.json"))
}

fn fixtures(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.json");
    let pattern = pattern.to_string_lossy();
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("bad fixture pattern: {pattern}"))? {
        paths.push(entry?);
    }
    if paths.is_empty() {
        bail!("no fixtures found under {}", dir.display());
    }
    Ok(paths)
}

fn main() -> Result<()> {
    let dir = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_FIXTURES.to_string());
    let paths = fixtures(Path::new(&dir))?;

    let mut mismatches = 0usize;
    for path in &paths {
        let outcome = compile(path.as_path(), &Registry::new());
        let label = path.display();
        match (outcome, expects_failure(path)) {
            (Ok(ty), false) => {
                let rendered = serde_json::to_string(&json_model::emit::schema_from_ty(&ty))?;
                println!("{} {label}", "pass".green().bold());
                println!("     {}", rendered.dimmed());
            }
            (Err(error), true) => {
                println!("{} {label}", "pass".green().bold());
                println!("     rejected: {}", error.to_string().dimmed());
            }
            (Ok(_), true) => {
                mismatches += 1;
                println!("{} {label}", "FAIL".red().bold());
                println!("     expected an error, but the schema compiled");
            }
            (Err(error), false) => {
                mismatches += 1;
                println!("{} {label}", "FAIL".red().bold());
                println!("     {error}");
            }
        }
    }

    println!();
    if mismatches > 0 {
        bail!("{mismatches} of {} fixtures did not behave as expected", paths.len());
    }
    println!("{}", format!("all {} fixtures behaved as expected", paths.len()).green());
    Ok(())
}
