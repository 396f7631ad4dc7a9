/// Core domain types for lintmark diagnostics, locations, and ranges.
use std::collections::BTreeMap;

/// Free-form analyzer options, such as `dialect = "rust"`.
pub type Options = BTreeMap<String, String>;

/// A half-open character range over the source text plus the message to attach.
/// Built from a [`Diagnostic`] by resolving its locations through a line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRange {
    /// Exclusive end offset in characters.
    pub end: usize,
    /// Text shown for the annotated span.
    pub message: String,
    /// Inclusive start offset in characters.
    pub start: usize,
}

impl AnnotatedRange {
    /// True when the range covers no characters.
    pub const fn is_empty(&self) -> bool {
        return self.end <= self.start;
    }
}

/// One finding reported by an analyzer over a source text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    /// Where the finding ends. Absent means a single-character point.
    #[serde(default)]
    pub end: Option<Location>,
    /// The analyzer could not parse the input at all. Never reaches the splitter.
    #[serde(default)]
    pub fatal: bool,
    /// Human-readable finding.
    pub message: String,
    /// Where the finding starts.
    pub start: Location,
}

/// A one-based line and column pair. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Location {
    /// One-based column in characters.
    pub column: usize,
    /// One-based line number.
    pub line: usize,
}

impl Location {
    /// Shorthand constructor.
    pub const fn new(line: usize, column: usize) -> Self {
        return Self { column, line };
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}:{}", self.line, self.column);
    }
}
