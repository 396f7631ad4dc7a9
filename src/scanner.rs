use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::grammar;
use crate::types::Options;

/// Opening code fence: up to three spaces, three or more backticks or tildes, info string.
const FENCE_PATTERN: &str = r"^(?P<indent> {0,3})(?P<fence>`{3,}|~{3,})[ \t]*(?P<info>.*)$";

/// A fenced code block found in a markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Code between the fences, indentation of the opening fence removed.
    pub code: String,
    /// First word of the info string, as written.
    pub dialect: String,
    /// One-based line of the first code line in the markdown file.
    pub line: usize,
    /// `key=value` pairs from the info string.
    pub options: Options,
    /// Markdown file containing the block, relative to the scan root.
    pub source: PathBuf,
    /// Bare words from the info string after the dialect.
    pub tags: Vec<String>,
}

impl Example {
    /// Why this example should not be processed, if it shouldn't.
    pub fn skip_reason(&self, config: &Config) -> Option<&'static str> {
        if self.tags.iter().any(|t| return *t == config.skip_tag) {
            return Some("skip tag");
        }
        if self.dialect.is_empty() {
            return Some("no dialect");
        }
        if grammar::canonical_dialect(&self.dialect).is_none() {
            return Some("no grammar");
        }
        return None;
    }
}

/// An example still being collected.
struct OpenFence {
    /// Fence character (backtick or tilde).
    fence_char: char,
    /// Length of the opening fence run.
    fence_len: usize,
    /// Spaces before the opening fence, stripped from each code line.
    indent: usize,
    /// Parsed info string.
    info: (String, Options, Vec<String>),
    /// Code lines so far.
    lines: Vec<String>,
    /// One-based line number of the first code line.
    start_line: usize,
}

/// Whether `line` closes the fence opened by `open`.
fn closes(open: &OpenFence, line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    let indent = line.len().saturating_sub(trimmed.len());
    if indent > 3 {
        return false;
    }
    let run = trimmed.chars().take_while(|&c| return c == open.fence_char).count();
    let rest = trimmed.get(run..).unwrap_or("");
    return run >= open.fence_len && rest.trim().is_empty();
}

/// Extract every fenced code block from markdown content.
/// An unclosed fence runs to the end of the document.
///
/// # Panics
///
/// Panics if the hardcoded fence regex is invalid (compile-time invariant).
pub fn extract_examples(content: &str, source: &Path) -> Vec<Example> {
    let pattern = Regex::new(FENCE_PATTERN).expect("valid regex");
    let mut examples = Vec::new();
    let mut open: Option<OpenFence> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx.saturating_add(1);

        if let Some(current) = open.as_mut() {
            if closes(current, line) {
                if let Some(done) = open.take() {
                    examples.push(finish(done, source));
                }
            } else {
                let stripped = strip_indent(line, current.indent);
                current.lines.push(stripped.to_string());
            }
            continue;
        }

        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let fence = caps.name("fence").map_or("", |m| return m.as_str());
        let info = caps.name("info").map_or("", |m| return m.as_str());
        let fence_char = fence.chars().next().unwrap_or('`');
        // Backtick fences may not carry backticks in their info string.
        if fence_char == '`' && info.contains('`') {
            continue;
        }

        open = Some(OpenFence {
            fence_char,
            fence_len: fence.chars().count(),
            indent: caps.name("indent").map_or(0, |m| return m.as_str().len()),
            info: parse_info_string(info),
            lines: Vec::new(),
            start_line: line_no.saturating_add(1),
        });
    }

    if let Some(done) = open {
        examples.push(finish(done, source));
    }

    return examples;
}

/// Turn a collected fence into an example.
fn finish(open: OpenFence, source: &Path) -> Example {
    let (dialect, options, tags) = open.info;
    return Example {
        code: open.lines.join("\n"),
        dialect,
        line: open.start_line,
        options,
        source: source.to_path_buf(),
        tags,
    };
}

/// Split an info string into dialect, `key=value` options, and bare tags.
/// Accepts `rust`, `rust,no-lint`, and `{.rust strict=true}` spellings.
fn parse_info_string(info: &str) -> (String, Options, Vec<String>) {
    let cleaned = info.trim().trim_start_matches('{').trim_end_matches('}');
    let mut words = cleaned
        .split(|c: char| return c.is_whitespace() || c == ',')
        .filter(|w| return !w.is_empty());

    let dialect = words.next().map_or_else(String::new, |w| return w.trim_start_matches('.').to_string());
    let mut options = Options::new();
    let mut tags = Vec::new();
    for word in words {
        match word.split_once('=') {
            Some((key, value)) => {
                options.insert(key.to_string(), value.trim_matches('"').to_string());
            },
            None => tags.push(word.to_string()),
        }
    }

    return (dialect, options, tags);
}

/// Scan all markdown files under `root` and extract their code examples.
/// Applies the config's include/exclude filters to control which markdown files are scanned.
/// Files are visited in name order so output is stable.
///
/// # Errors
///
/// Returns `Error::Io` if any markdown file cannot be read.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<Example>, Error> {
    let mut examples = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "md"))
    {
        let md_path = entry.path();
        let relative_source = md_path.strip_prefix(root).unwrap_or(md_path).to_path_buf();

        let relative_str = relative_source.to_string_lossy();
        if !config.should_scan(&relative_str) {
            continue;
        }

        let content = std::fs::read_to_string(md_path)?;
        examples.extend(extract_examples(&content, &relative_source));
    }

    return Ok(examples);
}

/// Remove up to `indent` leading spaces.
fn strip_indent(line: &str, indent: usize) -> &str {
    let spaces = line.chars().take(indent).take_while(|&c| return c == ' ').count();
    return line.get(spaces..).unwrap_or(line);
}
