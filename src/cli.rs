//! Command-line interface for stubindex.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{self, IndexConfig};
use crate::engine::Indexer;
use crate::index::IndexRegistry;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Suffix of stub documents picked up when indexing a directory.
pub const STUB_FILE_SUFFIX: &str = ".stubs.json";

/// Compute search-index entries from declaration stub trees.
///
/// Reads stub documents (one JSON file per source file), runs the stub
/// index extractor over every declaration, and reports the occurrences
/// each file contributes to the class, function, property, package and
/// annotation indexes.
#[derive(Parser)]
#[command(name = "stubindex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index stub documents and report their occurrences
    #[command(visible_alias = "run")]
    Index(IndexArgs),
    /// List the known indexes
    Indexes,
}

/// Arguments for the index command.
#[derive(Parser)]
pub struct IndexArgs {
    /// Stub document or directory of *.stubs.json files
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Only report indexes matching this glob (repeatable)
    #[arg(short, long = "index")]
    pub indexes: Vec<String>,

    /// Stop starting new files after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

/// Collect stub documents under `root`.
fn collect_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden directories
            let name = e.file_name().to_string_lossy();
            !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy();
            if name.ends_with(STUB_FILE_SUFFIX) {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Load the config given on the command line, or discover one.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(IndexConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => config::discover(Path::new(".")),
    };

    match path {
        Some(p) => {
            let config = IndexConfig::parse_file(&p)
                .map_err(|e| anyhow::anyhow!("error parsing config {}: {}", p.display(), e))?;
            Ok((config, Some(p)))
        }
        None => Ok((IndexConfig::default(), None)),
    }
}

/// Run the index command.
pub fn run_index(args: &IndexArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let (mut config, config_path) = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Command-line selection replaces the config's include list
    if !args.indexes.is_empty() {
        config.indexes.include = args.indexes.clone();
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if args.fail_fast {
        config.fail_fast = Some(true);
    }

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let (base_dir, files) = if abs_path.is_dir() {
        (abs_path.clone(), collect_files(&abs_path)?)
    } else {
        let base = abs_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| abs_path.clone());
        (base, vec![abs_path.clone()])
    };

    if files.is_empty() {
        eprintln!("Warning: no stub documents to index");
        return Ok(EXIT_SUCCESS);
    }

    let indexer = Indexer::new(&base_dir).with_config(config)?;
    let run = indexer.run(&files)?;

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &run)?,
        _ => {
            let config_str = config_path.map(|p| p.to_string_lossy().to_string());
            report::write_pretty(&path_str, config_str.as_deref(), &run);
        }
    }

    if run.has_failures() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the indexes command.
pub fn run_indexes() -> anyhow::Result<i32> {
    println!("Known indexes:");
    println!();

    for key in IndexRegistry::global().keys() {
        println!("  {:>2}  {}", key.ordinal(), key.name());
    }

    println!();
    println!("Usage:");
    println!("  stubindex index <path> --index '<glob>'");

    Ok(EXIT_SUCCESS)
}
