//! OpenAPIA CLI - validate, inspect and merge layered specifications

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use openapia::config::{Config, OutputFormat};
use openapia::error::{FixSuggestion, Result, SpecError};
use openapia::hierarchy::{describe, NodeStatus};
use openapia::merge::merge_all;
use openapia::store::{DocumentSource, Format, FsStore};
use openapia::{Diagnostics, Validator};

#[derive(Parser)]
#[command(name = "openapia")]
#[command(about = "OpenAPIA - compose and validate layered AI specifications")]
#[command(version)]
struct Cli {
    /// Config file (default: nearest openapia.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a specification file
    Validate {
        /// Path to a .yaml/.yml/.json specification
        path: PathBuf,

        /// Resolve `inherits` and validate the merged document
        #[arg(long)]
        hierarchical: bool,

        /// Report format (text, json)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Only report errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the inheritance tree of a specification
    Tree {
        /// Path to a .yaml/.yml/.json specification
        path: PathBuf,
    },

    /// Merge specifications left to right (later files win)
    Merge {
        /// Output file; .json writes JSON, anything else the configured format
        output: PathBuf,

        /// Input specifications
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format, overriding the extension
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate {
            path,
            hierarchical,
            format,
            quiet,
        } => validate(&config, &path, hierarchical, format, quiet),
        Commands::Tree { path } => Ok(tree(&path)),
        Commands::Merge {
            output,
            paths,
            format,
        } => merge(&config, &output, &paths, format).map(|()| true),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Config::discover(&cwd)?
        }
    };
    config.with_env()
}

fn validate(
    config: &Config,
    path: &Path,
    hierarchical: bool,
    format: Option<OutputFormat>,
    quiet: bool,
) -> Result<bool> {
    let mut diagnostics = Validator::new()
        .with_max_depth(config.resolver.max_depth)
        .validate_file(path, hierarchical)?;

    if quiet || !config.output.show_warnings {
        diagnostics.warnings.clear();
    }

    match format.unwrap_or(config.output.format) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&diagnostics.report()).map_err(|e| {
                SpecError::Encode {
                    format: Format::Json,
                    details: e.to_string(),
                }
            })?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(path, hierarchical, &diagnostics),
    }

    Ok(diagnostics.is_valid())
}

fn print_report(path: &Path, hierarchical: bool, diagnostics: &Diagnostics) {
    let mode = if hierarchical { " (with inheritance)" } else { "" };
    println!(
        "{} Validating {}{}",
        "→".cyan(),
        path.display().to_string().cyan(),
        mode
    );

    if diagnostics.is_valid() {
        println!("{} Specification is valid", "✓".green());
    } else {
        println!(
            "{} Validation failed with {} error(s)",
            "✗".red(),
            diagnostics.errors.len()
        );
        println!("\n{}", "Errors:".red().bold());
        for error in &diagnostics.errors {
            println!("  • {}", error);
            if let Some(suggestion) = error.suggestion() {
                println!("    {} {}", "Fix:".yellow(), suggestion);
            }
        }
    }

    if diagnostics.has_warnings() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &diagnostics.warnings {
            println!("  ⚠ {}", warning);
        }
    }
}

/// Returns whether the root document loaded
fn tree(path: &Path) -> bool {
    println!("{}", "Specification hierarchy".cyan().bold());

    let nodes = describe(&FsStore, path);
    let root_loaded = nodes
        .first()
        .is_some_and(|root| !matches!(root.status, NodeStatus::Failed(_)));

    for node in nodes {
        let indent = "  ".repeat(node.depth);
        let shown = node.path.display();
        match node.status {
            NodeStatus::Loaded => {
                println!("{}📄 {} ({}/{})", indent, node.title, node.level, node.scope);
                println!("{}   Path: {}", indent, shown);
                if !node.parent_specs.is_empty() {
                    println!("{}   Parent specs: {}", indent, node.parent_specs.join(", "));
                }
            }
            NodeStatus::Cycle => {
                println!("{}{} {} (inheritance cycle)", indent, "↻".yellow(), shown);
            }
            NodeStatus::Failed(reason) => {
                println!("{}{} Error loading {}: {}", indent, "✗".red(), shown, reason);
            }
        }
    }

    root_loaded
}

fn merge(config: &Config, output: &Path, paths: &[PathBuf], format: Option<Format>) -> Result<()> {
    let documents = paths
        .iter()
        .map(|path| FsStore.load(path))
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_all(&documents)?;

    let format = format
        .or_else(|| Format::from_extension(output))
        .unwrap_or(config.output.merge_format);
    let text = format.encode(&merged)?;
    fs::write(output, text).map_err(|source| SpecError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    println!(
        "{} Merged {} specification(s) into {} ({})",
        "✓".green(),
        paths.len(),
        output.display().to_string().cyan(),
        format
    );
    Ok(())
}
