//! Minimal CLI: schema + JSON/NDJSON → typed instances (or a schema description)
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use json_bind::parser::DEFAULT_MAX_DEPTH;
use json_bind::{ObjectParser, ParseOptions, PresencePolicy, Registry};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse JSON/NDJSON documents into instances of classes declared in a schema file
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// debug-level logging (RUST_LOG overrides)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse each input document as an instance of `--class` and print it as JSON
    Parse(ParseOut),
    /// print each class's ancestors and effective fields
    Describe(DescribeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document declaring classes, parents, field types and defaults
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct ParseOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// class each document is parsed as
    #[arg(long, short)]
    class: String,

    /// assign every declared field, even when the input lacks it
    #[arg(long, default_value_t = false)]
    assign_missing: bool,

    /// coerce sequence elements with their declared element type
    #[arg(long, default_value_t = false)]
    typed_sequences: bool,

    /// number fields also read numeric strings, booleans and singleton arrays
    #[arg(long, default_value_t = false)]
    loose_numbers: bool,

    /// nested classes deeper than this are left unset
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// only this class
    #[arg(long, short)]
    class: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Value>> {
        if let Some(jq_expr) = self.jq_expr.as_ref() {
            crate::jq_exec::check_filter(jq_expr).context("invalid --jq-expr")?;
        }
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let values = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(ix, line)| {
                        serde_json::from_str::<Value>(line).with_context(|| {
                            format!("failed to parse NDJSON line {} ({source_path_str})", ix + 1)
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str::<Value>(&source).with_context(|| {
                    format!("failed to parse JSON source file ({source_path_str})")
                })?;
                vec![value]
            };
            for value in values {
                self.select(value, &source_path_str, &mut documents)?;
            }
        }
        tracing::debug!(documents = documents.len(), "loaded input documents");
        Ok(documents)
    }

    fn select(&self, value: Value, source_path_str: &str, out: &mut Vec<Value>) -> Result<()> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => match value.pointer(pointer) {
                Some(node) => node.clone(),
                None => {
                    tracing::warn!(
                        pointer,
                        source = source_path_str,
                        "JSON pointer matched nothing, skipping"
                    );
                    return Ok(());
                }
            },
        };
        match self.jq_expr.as_ref() {
            None => out.push(value),
            Some(jq_expr) => {
                let results = crate::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                    format!("failed to apply jq expression to source file ({source_path_str})")
                })?;
                out.extend(results);
            }
        }
        Ok(())
    }
}

impl ParseOut {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            presence: if self.assign_missing {
                PresencePolicy::AssignAll
            } else {
                PresencePolicy::SkipMissing
            },
            typed_sequences: self.typed_sequences,
            loose_numbers: self.loose_numbers,
            max_depth: self.max_depth,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if self.verbose {
                EnvFilter::new("json_bind=debug,info")
            } else {
                EnvFilter::new("warn")
            }
        });
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Parse(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) registry
                let registry = load_registry(&target.schema_settings)?;
                if registry.lookup(&target.class).is_none() {
                    tracing::warn!(
                        class = target.class.as_str(),
                        "class is not registered, every result will be null"
                    );
                }

                // 2) documents
                let documents = target.input_settings.load_documents()?;

                // 3) parse
                let parser = ObjectParser::with_options(&registry, target.options());
                let results = parser.parse_all(&target.class, &documents);

                // 4) output
                let rendered = if target.input_settings.ndjson {
                    let mut lines = String::new();
                    for result in &results {
                        lines.push_str(&serde_json::to_string(result)?);
                        lines.push('\n');
                    }
                    lines
                } else if results.len() == 1 {
                    serde_json::to_string_pretty(&results[0])?
                } else {
                    serde_json::to_string_pretty(&results)?
                };
                write_output(target.out.as_ref(), rendered.trim_end())
            }
            Command::Describe(target) => {
                let registry = load_registry(&target.schema_settings)?;
                let classes: Vec<&str> = match target.class.as_deref() {
                    Some(class) => {
                        if registry.lookup(class).is_none() {
                            bail!("class `{class}` has no registered fields");
                        }
                        vec![class]
                    }
                    None => registry.classes().map(|c| c.as_str()).collect(),
                };
                for class in classes {
                    print!("{}", describe_class(&registry, class));
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_registry(settings: &SchemaSettings) -> Result<Registry> {
    json_bind::schema_file::load_registry(&settings.schema)
        .with_context(|| format!("failed to load schema {}", settings.schema.display()))
}

fn write_output(out: Option<&PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn describe_class(registry: &Registry, class: &str) -> String {
    let mut s = String::new();
    let ancestors = registry.ancestors_of(class);
    s.push_str(&class.bold().to_string());
    if !ancestors.is_empty() {
        let chain: Vec<&str> = ancestors.iter().map(|c| c.as_str()).collect();
        s.push_str(&format!(" {} {}", "extends".dimmed(), chain.join(" → ")));
    }
    s.push('\n');
    for field in registry.effective_fields(class).unwrap_or_default() {
        let owner = if field.owner.as_str() == class {
            String::new()
        } else {
            format!(" (from {})", field.owner).dimmed().to_string()
        };
        s.push_str(&format!("  {}: {}{owner}\n", field.name, field.declared.to_string().cyan()));
    }
    s
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_bind::TypeTag;

    #[test]
    fn flags_map_to_parse_options() {
        let cli = CommandLineInterface::try_parse_from([
            "json-bind", "parse", "--schema", "s.json", "--class", "Me", "--input", "a.json",
            "--assign-missing", "--typed-sequences", "--max-depth", "4",
        ])
        .unwrap();
        let Command::Parse(target) = &cli.cmd else {
            panic!("expected parse");
        };
        let options = target.options();
        assert_eq!(options.presence, PresencePolicy::AssignAll);
        assert!(options.typed_sequences);
        assert!(!options.loose_numbers);
        assert_eq!(options.max_depth, 4);
    }

    #[test]
    fn numbers_are_strict_unless_asked() {
        let parse = |extra: &[&str]| {
            let mut args = vec!["json-bind", "parse", "-s", "s.json", "-c", "Geo", "-i", "a.json"];
            args.extend_from_slice(extra);
            let cli = CommandLineInterface::try_parse_from(args).unwrap();
            match cli.cmd {
                Command::Parse(target) => target.options(),
                Command::Describe(_) => panic!("expected parse"),
            }
        };
        let strict = parse(&[]);
        assert!(!strict.loose_numbers);
        assert_eq!(strict.presence, PresencePolicy::SkipMissing);
        assert!(parse(&["--loose-numbers"]).loose_numbers);
    }

    #[test]
    fn describe_lists_inherited_fields() {
        colored::control::set_override(false);
        let mut b = Registry::builder();
        b.declare_class("Me", Some("User")).unwrap();
        b.register("User", "name", TypeTag::String).register("User", "surname", TypeTag::String);
        b.register("Me", "name", TypeTag::String);
        let registry = b.freeze().unwrap();

        let text = describe_class(&registry, "Me");
        assert_eq!(text, "Me extends User\n  name: string\n  surname: string (from User)\n");
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }
}
