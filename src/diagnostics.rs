use crate::error::Error;
use crate::grammar::DIALECTS;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened, why, and how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::UnsupportedLanguage { dialect } => render_unsupported_language(dialect),
        Error::MalformedTree { reason } => render_malformed_tree(reason),
        Error::ReconstitutionMismatch { file, source_chars, tree_chars } => {
            render_reconstitution_mismatch(&file.display().to_string(), *source_chars, *tree_chars)
        },
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::ConfigNotFound { path } => format!("\
# Error: Config Not Found

`{}` does not exist.

## Fix

Check the `--config` path, or drop the flag to use `.lintmark.toml`.
", path.display()),

        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: Invalid JSON

{e}

## Fix

Diagnostics files are arrays of `{{message, start: {{line, column}}, end?, fatal?}}`.
Token files are arrays of strings and `{{kind, alias?, content}}` objects.
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_malformed_tree(reason: &str) -> String {
    format!("\
# Error: Malformed Token Tree

{reason}

Nodes of kind `annotation-message` must hold text, and every `annotated-span`
must end with exactly one message node. Ranges may not cross an existing
annotation.
")
}

fn render_reconstitution_mismatch(file: &str, source_chars: usize, tree_chars: usize) -> String {
    format!("\
# Error: Token Tree Does Not Match Source

The token tree for `{file}` spells out {tree_chars} characters but the
normalized source has {source_chars}.

## Fix

Make sure the tokenizer saw the same text as the analyzer: trailing newlines
and end-of-line markers are stripped before analysis.
")
}

fn render_unsupported_language(dialect: &str) -> String {
    let mut out = format!(
        "\
# Error: Unsupported Language

No tree-sitter grammar for `{dialect}`.

## Supported dialects

"
    );
    for (name, aliases) in DIALECTS {
        out.push_str(&format!("- `{name}` ({})\n", aliases.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_language_lists_dialects() {
        let md = render_error(&Error::UnsupportedLanguage { dialect: "cobol".to_string() });
        assert!(md.starts_with("# Error: Unsupported Language"));
        assert!(md.contains("- `rust` (rust, rs)"));
    }

    #[test]
    fn mismatch_reports_both_lengths() {
        let md = render_error(&Error::ReconstitutionMismatch {
            file: "a.rs".into(),
            source_chars: 10,
            tree_chars: 12,
        });
        assert!(md.contains("12 characters"));
        assert!(md.contains("has 10"));
    }
}
