//! Fixture-driven end-to-end runs: schema + class + input → expected JSON.
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;

use json_bind::path_de::from_str_with_path;
use json_bind::{ObjectParser, ParseOptions, PresencePolicy, SchemaDocument};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    schema: SchemaDocument,
    class: String,
    #[serde(default)]
    options: CaseOptions,
    input: Value,
    /// `null` means the parse is expected to come back absent.
    expect: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct CaseOptions {
    assign_missing: bool,
    typed_sequences: bool,
    loose_numbers: bool,
}

impl CaseOptions {
    fn to_parse_options(&self) -> ParseOptions {
        ParseOptions {
            presence: if self.assign_missing {
                PresencePolicy::AssignAll
            } else {
                PresencePolicy::SkipMissing
            },
            typed_sequences: self.typed_sequences,
            loose_numbers: self.loose_numbers,
            ..ParseOptions::default()
        }
    }
}

fn run_case(case: &Case) -> Result<Option<String>> {
    let registry = case.schema.build().context("schema rejected")?;
    let parser = ObjectParser::with_options(&registry, case.options.to_parse_options());
    let actual = serde_json::to_value(parser.parse(&case.class, &case.input))?;
    if actual == case.expect {
        Ok(None)
    } else {
        Ok(Some(format!(
            "expected {}\n     got {}",
            serde_json::to_string(&case.expect)?,
            serde_json::to_string(&actual)?
        )))
    }
}

fn fixture_paths() -> Result<Vec<PathBuf>> {
    let pattern = std::env::args()
        .nth(1)
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/*.json").to_owned());
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        paths.push(entry?);
    }
    Ok(paths)
}

fn main() -> Result<()> {
    let mut failed = 0usize;
    let mut total = 0usize;
    for path in fixture_paths()? {
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cases: Vec<Case> = from_str_with_path(&source)
            .with_context(|| format!("bad fixture file {}", path.display()))?;
        for case in &cases {
            total += 1;
            match run_case(case) {
                Ok(None) => eprintln!("✅ {}", case.name),
                Ok(Some(diff)) => {
                    failed += 1;
                    eprintln!("❌ {}\n     {}", case.name.red(), diff);
                }
                Err(error) => {
                    failed += 1;
                    eprintln!("❌ {}: {error:#}", case.name.red());
                }
            }
        }
    }
    eprintln!("{} / {} passed", total - failed, total);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
