//! Core CLI commands for lintmark: annotate, examples, check, tokens.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::analyzer::{Analyzer, ExternalAnalyzer, SyntaxAnalyzer};
use crate::config::Config;
use crate::error;
use crate::grammar;
use crate::normalize::Normalizer;
use crate::pipeline::{self, ExampleReport, SourceInput};
use crate::render::{self, Format};
use crate::scanner;
use crate::token::Token;
use crate::tokenizer;

/// Arguments of the `annotate` command.
pub struct AnnotateArgs<'a> {
    /// JSON file with externally produced diagnostics.
    pub diagnostics: Option<&'a Path>,
    /// Dialect override; defaults to the file extension.
    pub dialect: Option<&'a str>,
    /// Source file to annotate.
    pub file: &'a Path,
    /// Output format.
    pub format: Format,
    /// JSON file with an externally produced token tree.
    pub tokens: Option<&'a Path>,
}

/// Annotate a single source file and print the rendered tree.
///
/// # Errors
///
/// Returns errors from config loading, file reading, analysis, tokenization, or splicing.
pub fn annotate(args: &AnnotateArgs<'_>, config_path: Option<&Path>) -> Result<(), error::Error> {
    let config = load_config(config_path)?;
    let source = std::fs::read_to_string(args.file)
        .map_err(|_err| return error::Error::FileNotFound { path: args.file.to_path_buf() })?;

    let dialect = match args.dialect {
        Some(d) => grammar::canonical_dialect(d)
            .ok_or_else(|| return error::Error::UnsupportedLanguage { dialect: d.to_string() })?,
        None => grammar::dialect_for_path(args.file)?,
    };

    let analyzer: Box<dyn Analyzer> = match args.diagnostics {
        Some(path) => Box::new(ExternalAnalyzer::load(path)?),
        None => Box::new(SyntaxAnalyzer),
    };

    let tokens = args.tokens.map(read_token_file).transpose()?;

    let input = SourceInput {
        dialect,
        options: config.options.clone(),
        origin: args.file,
        tokens,
    };
    let normalizer = Normalizer::new(&config.markers);
    let annotation = pipeline::annotate_source(input, &source, analyzer.as_ref(), &normalizer)?;

    for diagnostic in &annotation.fatal {
        eprintln!("{}: unparsable: {}", args.file.display(), diagnostic.message);
    }
    println!("{}", render::render_annotation(&annotation, args.format)?);
    return Ok(());
}

/// Scan markdown, annotate every eligible example, and report one line per diagnostic.
///
/// Exit codes: 0 clean, 1 diagnostics found, 2 an example was unparsable or failed.
///
/// # Errors
///
/// Returns errors from config loading or markdown scanning.
pub fn check(config_path: Option<&Path>) -> Result<ExitCode, error::Error> {
    let reports = run_examples(config_path)?;
    let mut diagnostic_count = 0_usize;
    let mut broken_count = 0_usize;

    for report in &reports {
        let source = report.example.source.display().to_string();
        let line_offset = report.example.line.saturating_sub(1);
        match &report.result {
            Err(e) => {
                broken_count = broken_count.saturating_add(1);
                println!("FAILED      {source}:{} ({e})", report.example.line);
            },
            Ok(annotation) if annotation.is_unparsable() => {
                broken_count = broken_count.saturating_add(1);
                for diagnostic in &annotation.fatal {
                    println!("UNPARSABLE  {}", render::summary_line(&source, line_offset, diagnostic));
                }
            },
            Ok(annotation) => {
                diagnostic_count = diagnostic_count.saturating_add(annotation.diagnostics.len());
                for diagnostic in &annotation.diagnostics {
                    println!("{}", render::summary_line(&source, line_offset, diagnostic));
                }
            },
        }
    }

    // Exit code priority: broken (2) > diagnostics (1) > clean (0).
    let total = reports.len();
    if broken_count > 0 {
        println!("{broken_count} broken, {diagnostic_count} diagnostics in {total} examples");
        return Ok(ExitCode::from(2));
    } else if diagnostic_count > 0 {
        println!("{diagnostic_count} diagnostics in {total} examples");
        return Ok(ExitCode::from(1));
    }
    println!("All {total} examples clean");
    return Ok(ExitCode::SUCCESS);
}

/// Scan markdown, annotate every eligible example, and print the rendered results.
///
/// # Errors
///
/// Returns errors from config loading, markdown scanning, or rendering.
pub fn examples(format: Format, config_path: Option<&Path>) -> Result<(), error::Error> {
    let reports = run_examples(config_path)?;
    print!("{}", render::render_reports(&reports, format)?);
    if format == Format::Json {
        println!();
    }
    let count = reports.len();
    eprintln!("Annotated {count} examples");
    return Ok(());
}

/// Load `--config` if given, else `.lintmark.toml` from the working directory.
///
/// # Errors
///
/// Returns config loading errors.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, error::Error> {
    return match config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(&PathBuf::from(".")),
    };
}

/// Read an externally produced token tree.
///
/// # Errors
///
/// Returns `Error::FileNotFound` or `Error::Json`.
fn read_token_file(path: &Path) -> Result<Vec<Token>, error::Error> {
    let content = std::fs::read_to_string(path)
        .map_err(|_err| return error::Error::FileNotFound { path: path.to_path_buf() })?;
    return Ok(serde_json::from_str(&content)?);
}

/// Scan the working directory and annotate all examples with the syntax analyzer.
///
/// # Errors
///
/// Returns errors from config loading or markdown scanning.
pub fn run_examples(config_path: Option<&Path>) -> Result<Vec<ExampleReport>, error::Error> {
    let root = PathBuf::from(".");
    let config = load_config(config_path)?;
    let examples = scanner::scan(&root, &config)?;
    return Ok(pipeline::annotate_examples(examples, &config, &SyntaxAnalyzer));
}

/// Print the tokenizer's tree for a file as JSON.
///
/// # Errors
///
/// Returns errors from file reading, dialect detection, tokenization, or serialization.
pub fn tokens(file: &Path, dialect: Option<&str>, config_path: Option<&Path>) -> Result<(), error::Error> {
    let config = load_config(config_path)?;
    let source = std::fs::read_to_string(file)
        .map_err(|_err| return error::Error::FileNotFound { path: file.to_path_buf() })?;
    let dialect = match dialect {
        Some(d) => d,
        None => grammar::dialect_for_path(file)?,
    };

    let normalized = Normalizer::new(&config.markers).normalize(&source);
    let tree = tokenizer::tokenize(file, &normalized, dialect)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    return Ok(());
}
