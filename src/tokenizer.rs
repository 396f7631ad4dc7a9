//! Tree-sitter backed tokenizer: turns a concrete syntax tree into a token tree.
//!
//! Every CST node becomes a composite of the node's kind. Text the CST does
//! not cover (whitespace between children, mostly) becomes plain text leaves,
//! so the flattened tree always spells out the source exactly.

use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::Error;
use crate::grammar;
use crate::token::{Composite, Token};

/// Convert one CST node and everything under it.
fn convert_node(node: Node<'_>, source: &str) -> Token {
    let composite = if node.child_count() == 0 {
        let text = source.get(node.start_byte()..node.end_byte()).unwrap_or("");
        Composite::text(node.kind(), text)
    } else {
        let mut children = Vec::new();
        let covered = push_children(node, source, node.start_byte(), &mut children);
        push_gap(source, covered, node.end_byte(), &mut children);
        Composite::nodes(node.kind(), children)
    };

    return match style_for(node) {
        Some(style) => composite.with_alias(style).into(),
        None => composite.into(),
    };
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the language cannot be set or parsing fails.
pub fn parse_source(origin: &Path, source: &str, language: &Language) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|e| {
        return Error::ParseFailed {
            file: origin.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    return parser.parse(source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: origin.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// Append the converted children of `node`, filling holes with text leaves.
/// `from` is the byte offset already covered. Returns the new covered offset.
fn push_children(node: Node<'_>, source: &str, mut from: usize, out: &mut Vec<Token>) -> usize {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.end_byte() <= from && child.start_byte() < from {
            continue;
        }
        if child.start_byte() < from {
            // Some grammars report children overlapping their previous sibling;
            // keep only the uncovered tail, as text.
            push_gap(source, from, child.end_byte(), out);
        } else {
            push_gap(source, from, child.start_byte(), out);
            out.push(convert_node(child, source));
        }
        from = from.max(child.end_byte());
    }
    return from;
}

/// Append `source[from..to]` as a text leaf when non-empty.
fn push_gap(source: &str, from: usize, to: usize, out: &mut Vec<Token>) {
    if from >= to {
        return;
    }
    if let Some(text) = source.get(from..to) {
        out.push(Token::text(text));
    }
}

/// Renderer style class derived from a node's kind.
fn style_for(node: Node<'_>) -> Option<&'static str> {
    let kind = node.kind();
    if node.is_error() {
        return Some("error");
    }
    if kind.contains("comment") {
        return Some("comment");
    }
    if kind.contains("string") || kind == "char_literal" {
        return Some("string");
    }
    if kind.contains("integer") || kind.contains("float") || kind == "number" {
        return Some("number");
    }
    if node.is_named() {
        return None;
    }
    let is_word = !kind.is_empty() && kind.chars().all(|c| return c.is_ascii_alphabetic() || c == '_');
    return Some(if is_word { "keyword" } else { "punctuation" });
}

/// Tokenize `source` with the grammar for `dialect`.
///
/// The returned tree covers `source` exactly, from the first byte to the last.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown dialects, or
/// `Error::ParseFailed` if tree-sitter cannot parse the source.
pub fn tokenize(origin: &Path, source: &str, dialect: &str) -> Result<Vec<Token>, Error> {
    let language = grammar::language_for_dialect(dialect)?;
    let tree = parse_source(origin, source, &language)?;

    let mut tokens = Vec::new();
    let covered = push_children(tree.root_node(), source, 0, &mut tokens);
    push_gap(source, covered, source.len(), &mut tokens);
    return Ok(tokens);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Content, flatten};

    fn find_kind<'a>(tokens: &'a [Token], kind: &str) -> Option<&'a Composite> {
        for token in tokens {
            let Token::Node(c) = token else { continue };
            if c.kind == kind {
                return Some(c);
            }
            if let Content::Nodes(children) = &c.content
                && let Some(found) = find_kind(children, kind)
            {
                return Some(found);
            }
        }
        return None;
    }

    #[test]
    fn rust_source_reconstitutes() {
        let source = "fn main() {\n    let s = \"héllo\"; // greet\n}\n";
        let tokens = tokenize(Path::new("main.rs"), source, "rust").unwrap();
        assert_eq!(flatten(&tokens), source);
    }

    #[test]
    fn nodes_carry_kind_and_style() {
        let tokens = tokenize(Path::new("x.rs"), "let x = 42;", "rust").unwrap();
        let keyword = find_kind(&tokens, "let").unwrap();
        assert_eq!(keyword.alias.as_deref(), Some("keyword"));
        let number = find_kind(&tokens, "integer_literal").unwrap();
        assert_eq!(number.alias.as_deref(), Some("number"));
        assert_eq!(number.content, Content::Text("42".to_string()));
    }

    #[test]
    fn syntax_errors_still_reconstitute() {
        let source = "def broken(:\n    return )";
        let tokens = tokenize(Path::new("x.py"), source, "python").unwrap();
        assert_eq!(flatten(&tokens), source);
    }

    #[test]
    fn leading_and_trailing_whitespace_kept() {
        let source = "\n\n  x = 1  \n";
        let tokens = tokenize(Path::new("x.py"), source, "py").unwrap();
        assert_eq!(flatten(&tokens), source);
    }

    #[test]
    fn empty_source_gives_empty_tree() {
        let tokens = tokenize(Path::new("x.rs"), "", "rust").unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let result = tokenize(Path::new("x"), "x", "cobol");
        assert!(matches!(result, Err(Error::UnsupportedLanguage { .. })));
    }
}
