//! Minimal CLI: schema dictionaries in, TypeScript modules out.
//!
//! Each input file is one module: a JSON object mapping definition names
//! to JTD schemas. The module id used for cross-module linking is the
//! file path as given (extension-agnostic).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;

use crate::codegen::naming::DefaultNaming;
use crate::codegen::{EnumValueStyle, Options};
use crate::runtime;
use crate::schema::SchemaDef;

// ----------------------------- Types -------------------------------------- //

/// compile JSON Type Definition schemas into TypeScript types and validators
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile schema dictionaries into .ts modules
    Generate(GenerateOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted; only valid for one input)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// prefix folded into every generated type name
    #[arg(long)]
    prefix: Option<String>,

    /// number enum and discriminator members by position instead of
    /// carrying the literal strings
    #[arg(long, default_value_t = false)]
    ordinal_enums: bool,

    /// emit type declarations only, no validator functions
    #[arg(long, default_value_t = false)]
    no_validators: bool,

    /// skip the boolean type-guard wrappers
    #[arg(long, default_value_t = false)]
    no_guards: bool,

    /// import path generated modules use for the runtime helpers
    #[arg(long, default_value = "./runtime")]
    runtime_path: String,

    /// do not copy the runtime helper library into the output directory
    #[arg(long, default_value_t = false)]
    no_runtime: bool,
}

// ------------------------- Implementation --------------------------------- //

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) {
        let result = match &self.cmd {
            Command::Generate(target) => generate(target),
        };
        if let Err(error) = result {
            eprintln!("{} {error:#}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

fn generate(target: &GenerateOut) -> anyhow::Result<()> {
    let source_paths = resolve_file_path_patterns(&target.input_settings.input)?;
    if source_paths.is_empty() {
        bail!("no input files");
    }

    let mut modules: IndexMap<String, IndexMap<String, SchemaDef>> = IndexMap::new();
    for source_path in &source_paths {
        let module_id = source_path.to_string_lossy().replace('\\', "/");
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read schema file `{}`", source_path.display()))?;
        let mut de = serde_json::Deserializer::from_str(&source);
        let defs: IndexMap<String, SchemaDef> = serde_path_to_error::deserialize(&mut de)
            .with_context(|| format!("failed to parse schema file `{}`", source_path.display()))?;
        modules.insert(module_id, defs);
    }

    let options = Options {
        naming: Box::new(DefaultNaming {
            prefix: target.prefix.clone(),
        }),
        enum_values: if target.ordinal_enums {
            EnumValueStyle::Ordinal
        } else {
            EnumValueStyle::Literal
        },
        validators: !target.no_validators,
        guards: !target.no_validators && !target.no_guards,
        runtime_path: target.runtime_path.clone(),
        ..Options::default()
    };

    let sources = crate::link::compile(&modules, &options)?;

    match &target.out {
        None => {
            if sources.len() > 1 {
                bail!("--out is required when compiling more than one module");
            }
            for (_, source) in &sources {
                println!("{source}");
            }
        }
        Some(out_dir) => {
            for (id, source) in &sources {
                let file = out_dir.join(output_file_name(id));
                if let Some(parent) = file.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create output directory `{}`", parent.display())
                    })?;
                }
                std::fs::write(&file, source)
                    .with_context(|| format!("failed to write `{}`", file.display()))?;
                eprintln!("{} {}", "wrote".green(), file.display());
            }
            if options.validators && !target.no_runtime {
                let file = out_dir.join(runtime::RUNTIME_FILE);
                std::fs::write(&file, runtime::RUNTIME_SOURCE)
                    .with_context(|| format!("failed to write `{}`", file.display()))?;
                eprintln!("{} {}", "wrote".green(), file.display());
            }
        }
    }
    Ok(())
}

/// Module id → output path relative to the output directory, swapping the
/// source extension for `.ts` and keeping subdirectories.
fn output_file_name(id: &str) -> PathBuf {
    let trimmed = id.trim_start_matches("./");
    let path = Path::new(trimmed);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "module".to_string());
    match path.parent() {
        Some(parent) if parent != Path::new("") => parent.join(format!("{stem}.ts")),
        _ => PathBuf::from(format!("{stem}.ts")),
    }
}

// ------------------------- Internal helpers ------------------------------- //

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
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // An explicit glob that matches nothing is an input error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_keep_subdirectories_and_swap_extensions() {
        assert_eq!(
            output_file_name("./models/user.json"),
            PathBuf::from("models/user.ts")
        );
        assert_eq!(
            output_file_name("./user.jtd.json"),
            PathBuf::from("user.jtd.ts")
        );
        assert_eq!(output_file_name("plain"), PathBuf::from("plain.ts"));
    }
}
