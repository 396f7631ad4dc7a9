//! Rendering annotated token trees as HTML or JSON.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Error;
use crate::pipeline::{Annotation, ExampleReport};
use crate::token::{Content, LINE_BREAK_TAG, Token};
use crate::types::Diagnostic;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// `<pre>` block with spans per styled token and annotation.
    Html,
    /// The token tree in its serde form.
    Json,
}

/// JSON shape of one processed markdown example.
#[derive(Serialize)]
struct ExampleJson<'a> {
    /// The annotation, when it succeeded.
    #[serde(flatten)]
    annotation: Option<&'a Annotation>,
    /// Fence dialect as written.
    dialect: &'a str,
    /// Error text, when the example failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// First code line in the markdown file.
    line: usize,
    /// Markdown file.
    source: &'a PathBuf,
}

/// Append `text` with HTML special characters escaped.
fn push_escaped(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

/// Recursive worker for [`to_html`].
fn push_html(tokens: &[Token], out: &mut String) {
    for token in tokens {
        // Zero-width nodes (tree-sitter's missing tokens) would render as empty spans.
        if token.is_empty() && !token.is_message() {
            continue;
        }
        let composite = match token {
            Token::Node(composite) => composite,
            Token::Text(text) => {
                push_escaped(text, out);
                continue;
            },
        };

        let open = if composite.is_message() {
            "<span class=\"annotation-message\" role=\"tooltip\">".to_string()
        } else if composite.is_wrapper() {
            let line_break = composite.alias.as_deref() == Some(LINE_BREAK_TAG);
            let class = if line_break { "annotated-span line-break" } else { "annotated-span" };
            format!("<span class=\"{class}\" tabindex=\"0\">")
        } else if let Some(alias) = &composite.alias {
            let mut open = String::from("<span class=\"tok-");
            push_escaped(alias, &mut open);
            open.push_str("\">");
            open
        } else {
            String::new()
        };

        out.push_str(&open);
        match &composite.content {
            Content::Nodes(children) => push_html(children, out),
            Content::Text(text) => push_escaped(text, out),
        }
        if !open.is_empty() {
            out.push_str("</span>");
        }
    }
}

/// Render one annotated tree.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render_annotation(annotation: &Annotation, format: Format) -> Result<String, Error> {
    return match format {
        Format::Html => Ok(to_html(&annotation.tokens)),
        Format::Json => Ok(serde_json::to_string_pretty(annotation)?),
    };
}

/// Render every example report: HTML sections separated by comments, or one JSON array.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render_reports(reports: &[ExampleReport], format: Format) -> Result<String, Error> {
    if format == Format::Json {
        let items: Vec<ExampleJson<'_>> = reports
            .iter()
            .map(|r| {
                return ExampleJson {
                    annotation: r.result.as_ref().ok(),
                    dialect: &r.example.dialect,
                    error: r.result.as_ref().err().map(ToString::to_string),
                    line: r.example.line,
                    source: &r.example.source,
                };
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&items)?);
    }

    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "<!-- {}:{} -->", report.example.source.display(), report.example.line);
        match &report.result {
            Err(e) => {
                out.push_str("<!-- error: ");
                push_escaped(&e.to_string(), &mut out);
                out.push_str(" -->\n");
            },
            Ok(annotation) => {
                out.push_str(&to_html(&annotation.tokens));
                out.push('\n');
            },
        }
    }
    return Ok(out);
}

/// One `file:line:column: message` line per diagnostic.
pub fn summary_line(origin: &str, line_offset: usize, diagnostic: &Diagnostic) -> String {
    let line = diagnostic.start.line.saturating_add(line_offset);
    return format!("{origin}:{line}:{}: {}", diagnostic.start.column, diagnostic.message);
}

/// HTML for a token tree: styled composites become `tok-<alias>` spans,
/// wrappers become focusable `annotated-span` spans, and messages become
/// tooltip spans that renderers hide until hover.
pub fn to_html(tokens: &[Token]) -> String {
    let mut out = String::from("<pre class=\"lintmark\"><code>");
    push_html(tokens, &mut out);
    out.push_str("</code></pre>");
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Composite;
    use crate::types::Location;

    #[test]
    fn renders_styles_wrappers_and_messages() {
        let tokens = vec![
            Composite::text("let", "let").with_alias("keyword").into(),
            Token::text(" "),
            Token::wrapper(vec![Composite::text("identifier", "x").into()], "unused <x>"),
            Token::text(" = 1;"),
        ];
        assert_eq!(
            to_html(&tokens),
            "<pre class=\"lintmark\"><code><span class=\"tok-keyword\">let</span> \
             <span class=\"annotated-span\" tabindex=\"0\">x<span class=\"annotation-message\" \
             role=\"tooltip\">unused &lt;x&gt;</span></span> = 1;</code></pre>"
        );
    }

    #[test]
    fn line_break_wrappers_get_extra_class() {
        let tokens = vec![Token::text("a"), Token::wrapper(vec![Token::text("\n")], "eol")];
        assert!(to_html(&tokens).contains("class=\"annotated-span line-break\""));
    }

    #[test]
    fn escapes_source_text() {
        let html = to_html(&[Token::text("a < b && c > \"d\"")]);
        assert!(html.contains("a &lt; b &amp;&amp; c &gt; &quot;d&quot;"));
    }

    #[test]
    fn summary_line_offsets_example_lines() {
        let diagnostic = Diagnostic {
            end: None,
            fatal: false,
            message: "syntax error".to_string(),
            start: Location::new(2, 7),
        };
        assert_eq!(summary_line("docs/a.md", 10, &diagnostic), "docs/a.md:12:7: syntax error");
    }
}
