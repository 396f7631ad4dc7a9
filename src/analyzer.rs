//! Analyzers produce the diagnostics that get attached to token trees.

use std::path::{Path, PathBuf};

use tree_sitter::Node;

use crate::error::Error;
use crate::grammar;
use crate::line_index::LineIndex;
use crate::tokenizer;
use crate::types::{Diagnostic, Location, Options};

/// Anything that can report findings over a source text.
pub trait Analyzer {
    /// Report diagnostics for `source`. `options` is a free-form record,
    /// typically carrying at least `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the analyzer itself cannot run. Unparsable
    /// input is reported as a fatal diagnostic instead.
    fn analyze(&self, source: &str, options: &Options) -> Result<Vec<Diagnostic>, Error>;
}

/// Diagnostics produced elsewhere and handed over as a JSON file.
/// The source text is ignored; locations are trusted as given.
pub struct ExternalAnalyzer {
    /// Diagnostics read from disk.
    diagnostics: Vec<Diagnostic>,
}

impl ExternalAnalyzer {
    /// Read `[{message, start: {line, column}, end?, fatal?}]` from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file cannot be read, or
    /// `Error::Json` if it is not a diagnostics array.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|_err| {
            return Error::FileNotFound { path: path.to_path_buf() };
        })?;
        let diagnostics = serde_json::from_str(&content)?;
        return Ok(Self { diagnostics });
    }
}

impl Analyzer for ExternalAnalyzer {
    fn analyze(&self, _source: &str, _options: &Options) -> Result<Vec<Diagnostic>, Error> {
        return Ok(self.diagnostics.clone());
    }
}

/// Reports tree-sitter syntax errors for the dialect named in `options`.
///
/// Recognized options:
/// - `dialect`: grammar to parse with (required).
/// - `strict`: when `true`, any syntax error makes the input fatal.
pub struct SyntaxAnalyzer;

impl Analyzer for SyntaxAnalyzer {
    fn analyze(&self, source: &str, options: &Options) -> Result<Vec<Diagnostic>, Error> {
        let dialect = options.get("dialect").map_or("", String::as_str);
        let language = grammar::language_for_dialect(dialect)?;
        let origin = PathBuf::from(format!("<{dialect}>"));

        let Ok(tree) = tokenizer::parse_source(&origin, source, &language) else {
            return Ok(vec![fatal_diagnostic("parser gave up on this input")]);
        };
        let root = tree.root_node();
        if root.is_error() {
            return Ok(vec![fatal_diagnostic("input is not valid at all for this dialect")]);
        }

        let index = LineIndex::new(source);
        let mut diagnostics = Vec::new();
        collect_syntax_errors(root, source, &index, &mut diagnostics);

        let strict = options.get("strict").is_some_and(|v| return v == "true");
        if strict && !diagnostics.is_empty() {
            for diagnostic in &mut diagnostics {
                diagnostic.fatal = true;
            }
        }
        return Ok(diagnostics);
    }
}

/// Convert a tree-sitter byte offset to a one-based character location.
fn byte_location(source: &str, index: &LineIndex, byte: usize) -> Location {
    let chars = source.get(..byte).map_or(0, |prefix| return prefix.chars().count());
    return index.location(chars);
}

/// Walk the tree and report every error and missing node.
/// Error subtrees are reported once and not descended into.
fn collect_syntax_errors(node: Node<'_>, source: &str, index: &LineIndex, out: &mut Vec<Diagnostic>) {
    if node.is_missing() {
        out.push(Diagnostic {
            end: None,
            fatal: false,
            message: format!("missing `{}`", node.kind()),
            start: byte_location(source, index, node.start_byte()),
        });
        return;
    }

    if node.is_error() {
        let snippet = source.get(node.start_byte()..node.end_byte()).unwrap_or("").trim();
        let message = match snippet.lines().next() {
            Some(first) if !first.is_empty() => format!("syntax error near `{first}`"),
            _ => "syntax error".to_string(),
        };
        out.push(Diagnostic {
            end: Some(byte_location(source, index, node.end_byte())),
            fatal: false,
            message,
            start: byte_location(source, index, node.start_byte()),
        });
        return;
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax_errors(child, source, index, out);
    }
}

/// A diagnostic saying the whole input could not be parsed.
fn fatal_diagnostic(message: &str) -> Diagnostic {
    return Diagnostic {
        end: None,
        fatal: true,
        message: message.to_string(),
        start: Location::new(1, 1),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dialect: &str) -> Options {
        return Options::from([("dialect".to_string(), dialect.to_string())]);
    }

    #[test]
    fn clean_source_has_no_diagnostics() {
        let found = SyntaxAnalyzer.analyze("let x = 1;\n", &options("rust")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn reports_syntax_errors_with_locations() {
        let source = "fn main() {\n    let x = ;\n}\n";
        let found = SyntaxAnalyzer.analyze(source, &options("rust")).unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().all(|d| return !d.fatal));
        assert!(found.iter().any(|d| return d.start.line == 2));
    }

    #[test]
    fn strict_mode_makes_errors_fatal() {
        let mut opts = options("rust");
        opts.insert("strict".to_string(), "true".to_string());
        let found = SyntaxAnalyzer.analyze("fn main( {", &opts).unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().all(|d| return d.fatal));
    }

    #[test]
    fn missing_dialect_is_an_error() {
        let result = SyntaxAnalyzer.analyze("x", &Options::new());
        assert!(matches!(result, Err(Error::UnsupportedLanguage { .. })));
    }

    #[test]
    fn external_diagnostics_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics.json");
        std::fs::write(
            &path,
            r#"[
                {"message": "unused variable", "start": {"line": 1, "column": 5}, "end": {"line": 1, "column": 6}},
                {"message": "cannot parse", "start": {"line": 1, "column": 1}, "fatal": true}
            ]"#,
        )
        .unwrap();

        let analyzer = ExternalAnalyzer::load(&path).unwrap();
        let found = analyzer.analyze("ignored", &Options::new()).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.first().map(|d| return d.start), Some(Location::new(1, 5)));
        assert!(found.get(1).is_some_and(|d| return d.fatal && d.end.is_none()));
    }

    #[test]
    fn byte_offsets_become_character_columns() {
        let source = "é = ;";
        let index = LineIndex::new(source);
        assert_eq!(byte_location(source, &index, 4), Location::new(1, 4));
    }
}
