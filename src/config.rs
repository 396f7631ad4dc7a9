use std::path::Path;

use crate::error::Error;
use crate::normalize::DEFAULT_MARKERS;
use crate::types::Options;

/// Info-string tag that keeps an example out of processing unless configured otherwise.
const DEFAULT_SKIP_TAG: &str = "no-lint";

/// Project configuration loaded from `.lintmark.toml`.
/// Include/exclude patterns are path prefixes applied to markdown source files.
#[derive(Debug)]
pub struct Config {
    /// Path prefixes that must not be scanned.
    exclude: Vec<String>,
    /// Path prefixes to scan. Empty means everything.
    include: Vec<String>,
    /// End-of-line glyphs stripped by the normalizer.
    pub markers: Vec<String>,
    /// Analyzer options applied to every example before fence options.
    pub options: Options,
    /// Fence tag that disables processing of an example.
    pub skip_tag: String,
}

/// Raw TOML structure for `.lintmark.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LintmarkTomlConfig {
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::markers`].
    markers: Option<Vec<String>>,
    /// See [`Config::options`].
    #[serde(default)]
    options: Options,
    /// See [`Config::skip_tag`].
    skip_tag: Option<String>,
}

impl Config {
    /// Load config from `.lintmark.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed: never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".lintmark.toml");
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Load config from an explicitly named file, which must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file is missing,
    /// `Error::Io` for other read failures, or `Error::TomlDe` if malformed.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse TOML content, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: LintmarkTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        return Ok(Self {
            exclude: raw.exclude,
            include: raw.include,
            markers: raw.markers.unwrap_or(defaults.markers),
            options: raw.options,
            skip_tag: raw.skip_tag.unwrap_or(defaults.skip_tag),
        });
    }

    /// Check whether a markdown file path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

impl Default for Config {
    /// Scan everything, strip the standard markers, no extra options.
    fn default() -> Self {
        return Self {
            exclude: Vec::new(),
            include: Vec::new(),
            markers: DEFAULT_MARKERS.iter().map(|m| return (*m).to_string()).collect(),
            options: Options::new(),
            skip_tag: DEFAULT_SKIP_TAG.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.should_scan("anything.md"));
        assert_eq!(config.skip_tag, "no-lint");
        assert_eq!(config.markers.len(), 2);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn include_then_exclude() {
        let config = Config::parse(
            r#"
            include = ["docs/"]
            exclude = ["docs/archive/"]
            "#,
        )
        .unwrap();
        assert!(config.should_scan("docs/guide.md"));
        assert!(!config.should_scan("docs/archive/old.md"));
        assert!(!config.should_scan("README.md"));
    }

    #[test]
    fn options_and_overrides() {
        let config = Config::parse(
            r#"
            skip_tag = "ignore"
            markers = []

            [options]
            strict = "true"
            "#,
        )
        .unwrap();
        assert_eq!(config.skip_tag, "ignore");
        assert!(config.markers.is_empty());
        assert_eq!(config.options.get("strict").map(String::as_str), Some("true"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(Config::parse("include = 3"), Err(Error::TomlDe(_))));
        assert!(matches!(Config::parse("unknown_key = 1"), Err(Error::TomlDe(_))));
    }
}
