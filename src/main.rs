//! headerdoc: extract documentation from annotated C++ headers.
//!
//! Two modes:
//!
//! - **stdin mode**: `headerdoc < Foo.h` prints the document of one header
//! - **file mode**: `headerdoc -o docs.json Source/**/*.h` processes every match

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use headerdoc::{emit, Document, Settings};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// File identifier used for input read from stdin.
const STDIN_NAME: &str = "<stdin>";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Document model as JSON
    Json,
    /// Re-serialized header text
    Header,
}

#[derive(Parser)]
#[command(
    name = "headerdoc",
    about = "Extract cross-referenced documentation from annotated C++ headers"
)]
struct Cli {
    /// Input files (glob patterns supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "json")]
    format: Format,

    /// TOML settings file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Keep undocumented declarations
    #[arg(long)]
    show_all: bool,

    /// Keep protected members
    #[arg(long)]
    protected: bool,

    /// Keep private members
    #[arg(long)]
    private: bool,

    /// Sort declarations and members by name
    #[arg(long)]
    sort: bool,

    /// Skip files that fail instead of aborting
    #[arg(long)]
    keep_going: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let documents = if cli.files.is_empty() {
        stdin_mode()?
    } else {
        file_mode(&cli)?
    };

    let exported: Vec<Document> = documents.iter().map(|d| d.exported(&settings)).collect();
    let output = render(&exported, cli.format, cli.files.is_empty())?;

    match &cli.output {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", output),
    }
    Ok(())
}

/// Settings from `--config`, with command-line flags layered on top.
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.show_all |= cli.show_all;
    settings.document_protected |= cli.protected;
    settings.document_private |= cli.private;
    settings.sort_by_name |= cli.sort;
    Ok(settings)
}

/// stdin mode: read one header from stdin.
fn stdin_mode() -> Result<Vec<Document>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let doc = headerdoc::document(STDIN_NAME, &input)?;
    Ok(vec![doc])
}

/// file mode: process every matched file in sorted order.
fn file_mode(cli: &Cli) -> Result<Vec<Document>> {
    let files = expand_globs(&cli.files)?;
    if files.is_empty() {
        anyhow::bail!("no input files found");
    }

    let mut documents = Vec::new();
    for path in &files {
        match process_file(path) {
            Ok(doc) => documents.push(doc),
            Err(e) if cli.keep_going => {
                eprintln!("warning: skipping {}: {:#}", path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(documents)
}

fn process_file(path: &Path) -> Result<Document> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = headerdoc::document(&path.display().to_string(), &source)?;
    log::debug!("{}: {} declarations", path.display(), doc.walk().len());
    Ok(doc)
}

/// Render the documents. JSON output is a single object in stdin mode and an
/// array otherwise; header output concatenates the files.
fn render(documents: &[Document], format: Format, single: bool) -> Result<String> {
    match format {
        Format::Json => {
            let mut out = if single && documents.len() == 1 {
                serde_json::to_string_pretty(&documents[0])
            } else {
                serde_json::to_string_pretty(documents)
            }
            .context("failed to serialize document")?;
            out.push('\n');
            Ok(out)
        }
        Format::Header => Ok(documents
            .iter()
            .map(emit::to_header)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// File extensions recognized as headers when a directory is given.
const SUPPORTED_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "inl"];

/// Turn the command-line inputs into a sorted, deduplicated file list. An
/// input names a file, a directory (scanned one level deep for headers), or a
/// glob pattern.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        let found = if path.is_file() {
            vec![path.to_path_buf()]
        } else if path.is_dir() {
            headers_in_dir(path)?
        } else {
            glob_matches(pattern)?
        };
        files.extend(found);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Header files directly inside `dir`.
fn headers_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    Ok(entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_header(p))
        .collect())
}

/// Files matched by a glob pattern. An empty match is only a warning so that
/// one stale pattern does not hide the others.
fn glob_matches(pattern: &str) -> Result<Vec<PathBuf>> {
    let matches: Vec<PathBuf> = glob::glob(pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    if matches.is_empty() {
        eprintln!("warning: no files matched: {}", pattern);
    }
    Ok(matches)
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_extensions() {
        assert!(is_header(Path::new("Source/Foo.h")));
        assert!(is_header(Path::new("Foo.hpp")));
        assert!(!is_header(Path::new("Foo.cpp")));
        assert!(!is_header(Path::new("Makefile")));
    }

    #[test]
    fn directory_scan_keeps_headers_only() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["b.hpp", "a.h", "a.cpp", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.h")).unwrap();

        let found = headers_in_dir(dir.path()).unwrap();
        let mut names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.h", "b.hpp"]);
    }

    #[test]
    fn inputs_are_sorted_and_deduplicated() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.h");
        let b = dir.path().join("b.h");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let inputs = vec![
            b.display().to_string(),
            dir.path().display().to_string(),
            format!("{}/*.h", dir.path().display()),
        ];
        assert_eq!(expand_globs(&inputs).unwrap(), vec![a, b]);
    }

    #[test]
    fn unmatched_glob_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let pattern = format!("{}/*.h", dir.path().display());
        assert!(glob_matches(&pattern).unwrap().is_empty());
        assert!(glob_matches("[").is_err());
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from(["headerdoc", "--protected", "--sort"]);
        let settings = resolve_settings(&cli).unwrap();
        assert!(settings.document_protected);
        assert!(settings.sort_by_name);
        assert!(!settings.document_private);
        assert!(!settings.show_all);
    }

    #[test]
    fn json_output_shape() {
        let doc = headerdoc::document("t.h", "/// Doc.\nvoid F();\n").unwrap();
        let single = render(std::slice::from_ref(&doc), Format::Json, true).unwrap();
        assert!(single.starts_with('{'));
        let many = render(&[doc.clone(), doc], Format::Json, false).unwrap();
        assert!(many.starts_with('['));
    }
}
