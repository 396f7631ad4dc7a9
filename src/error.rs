/// Crate-level error types for lintmark diagnostics.
use std::path::PathBuf;

/// All errors in lintmark carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, dialect, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced config file does not exist on disk.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// A referenced source, diagnostics, or token file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization of diagnostics or token trees failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A token tree contains a node whose shape cannot be flattened to text.
    #[error("malformed token tree: {reason}")]
    MalformedTree {
        /// Description of the offending node.
        reason: String,
    },

    /// Tree-sitter failed to parse a source file.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// The token tree does not spell out the same text the analyzer saw.
    #[error(
        "token tree does not match source ({tree_chars} chars in tree, {source_chars} in source): {}",
        file.display()
    )]
    ReconstitutionMismatch {
        /// File or example whose tree diverged.
        file: PathBuf,
        /// Character count of the normalized source text.
        source_chars: usize,
        /// Character count of the flattened token tree.
        tree_chars: usize,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No tree-sitter grammar registered for this dialect or file extension.
    #[error("no grammar for dialect: {dialect}")]
    UnsupportedLanguage {
        /// Dialect name or file extension without the leading dot.
        dialect: String,
    },
}
