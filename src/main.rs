//! dj-search — find tables, attributes and comments in saved DataJoint
//! schema definitions.
//!
//! Supports two modes:
//!
//! - **stdin mode**: `dj-search -s lab date < lab.py`
//! - **file mode**: `dj-search date schemas/*.py` (schema name = file stem)

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dj_search::render;
use dj_search::{search_level, CorpusBuilder, Decoration};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "dj-search",
    about = "Search saved DataJoint schema definitions for tables, attributes and comments"
)]
struct Cli {
    /// Pattern to search for (case-insensitive regex)
    query: String,

    /// Schema definition files, directories or glob patterns.
    /// If omitted, one definition is read from stdin.
    files: Vec<String>,

    /// Only report matches of this kind: table, attribute, comment
    #[arg(short = 'l', long)]
    level: Option<String>,

    /// Schema name for the definition read from stdin
    #[arg(short = 's', long)]
    schema: Option<String>,

    /// Only search schemas whose name starts with PREFIX (repeatable)
    #[arg(short = 'p', long = "prefix")]
    prefixes: Vec<String>,

    /// Output format: text (default), json
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// When to highlight matches with ANSI colors
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,

    /// Match the query literally instead of as a pattern
    #[arg(long)]
    literal: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_ansi(supports_color::on(supports_color::Stream::Stderr).is_some())
        .with_target(false)
        .compact()
        .init();

    let builder = if cli.files.is_empty() {
        stdin_corpus(&cli)?
    } else {
        file_corpus(&cli)?
    };
    let corpus = builder.build();

    let query = if cli.literal {
        regex::escape(&cli.query)
    } else {
        cli.query.clone()
    };
    let result = search_level(&corpus, &query, cli.level.as_deref())?;

    let renderer = render::create_renderer(&cli.format, decoration(cli.color))?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(renderer.render(&result).as_bytes())
        .context("failed to write output")?;
    Ok(())
}

/// stdin mode: the whole input is the definition of one schema.
fn stdin_corpus(cli: &Cli) -> Result<CorpusBuilder> {
    let schema = cli
        .schema
        .as_deref()
        .context("--schema is required when reading from stdin")?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let mut builder = CorpusBuilder::new();
    builder.add_schema(schema, &input);
    Ok(builder)
}

/// file mode: one schema per input file, filtered by --prefix.
fn file_corpus(cli: &Cli) -> Result<CorpusBuilder> {
    let input_files = expand_globs(&cli.files)?;

    let mut builder = CorpusBuilder::new();
    for path in &input_files {
        let schema = derive_schema_name(path);
        if !matches_prefix(&schema, &cli.prefixes) {
            debug!(schema = %schema, "excluded by prefix");
            continue;
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !builder.add_schema(&schema, &content) {
            warn!(
                "skipping {}: schema {} already loaded",
                path.display(),
                schema
            );
        }
    }
    if builder.is_empty() {
        warn!("no schema definitions loaded");
    }
    Ok(builder)
}

fn decoration(color: ColorWhen) -> Decoration {
    let ansi = match color {
        ColorWhen::Always => true,
        ColorWhen::Never => false,
        ColorWhen::Auto => supports_color::on(supports_color::Stream::Stdout).is_some(),
    };
    if ansi {
        Decoration::ansi_red()
    } else {
        Decoration::markers()
    }
}

/// An empty prefix list accepts every schema.
fn matches_prefix(schema: &str, prefixes: &[String]) -> bool {
    prefixes.is_empty() || prefixes.iter().any(|p| schema.starts_with(p.as_str()))
}

/// File extensions recognized as saved schema definitions.
const SUPPORTED_EXTENSIONS: &[&str] = &["py", "txt"];

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for supported file types.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // Directory: scan for supported extensions (non-recursive)
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() {
                    if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
                        if SUPPORTED_EXTENSIONS.contains(&ext) {
                            files.push(p);
                        }
                    }
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sorted for deterministic schema order
    files.sort();
    files.dedup();
    Ok(files)
}

/// Derive the schema name from a definition file.
/// "schemas/ephys.py" → "ephys", "lab" → "lab"
fn derive_schema_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
