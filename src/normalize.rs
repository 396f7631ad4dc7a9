//! Pre-pass that makes the analyzer and the tokenizer see the same text.

use regex::Regex;

/// End-of-line glyphs that documentation authors paste into examples to make
/// line ends visible. They are presentational, not code.
pub const DEFAULT_MARKERS: &[&str] = &["⏎", "↵"];

/// Strips end-of-line marker glyphs and trailing line breaks.
pub struct Normalizer {
    /// Matches a run of markers followed by a line break or the end of text.
    /// `None` when no markers are configured.
    markers: Option<Regex>,
}

impl Normalizer {
    /// Build a normalizer for the given marker glyphs.
    ///
    /// # Panics
    ///
    /// Panics if the marker pattern fails to compile. Markers are escaped
    /// before they are joined, so the pattern is always well formed.
    pub fn new(markers: &[String]) -> Self {
        let alternatives: Vec<String> = markers
            .iter()
            .filter(|m| return !m.is_empty())
            .map(|m| return regex::escape(m))
            .collect();
        if alternatives.is_empty() {
            return Self { markers: None };
        }

        let pattern = format!(r"(?:{})+[ \t]*(\r\n|\n|\r|\z)", alternatives.join("|"));
        let markers = Regex::new(&pattern).expect("valid marker regex");
        return Self { markers: Some(markers) };
    }

    /// Remove markers that sit right before a line break or at the end of the
    /// text, then drop trailing line breaks.
    pub fn normalize(&self, text: &str) -> String {
        let stripped = match &self.markers {
            Some(pattern) => pattern.replace_all(text, "$1").into_owned(),
            None => text.to_string(),
        };
        return stripped.trim_end_matches(['\n', '\r']).to_string();
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        let markers: Vec<String> = DEFAULT_MARKERS.iter().map(|m| return (*m).to_string()).collect();
        return Self::new(&markers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_newlines() {
        assert_eq!(Normalizer::default().normalize("x = 1\n\n"), "x = 1");
        assert_eq!(Normalizer::default().normalize("x = 1\r\n"), "x = 1");
    }

    #[test]
    fn strips_markers_before_line_breaks() {
        let text = "let a = 1;⏎\nlet b = 2;↵\r\nlet c = 3;⏎";
        assert_eq!(
            Normalizer::default().normalize(text),
            "let a = 1;\nlet b = 2;\r\nlet c = 3;"
        );
    }

    #[test]
    fn keeps_markers_inside_lines() {
        let text = "let s = \"⏎ in a string\";";
        assert_eq!(Normalizer::default().normalize(text), text);
    }

    #[test]
    fn custom_markers_are_escaped() {
        let normalizer = Normalizer::new(&["$".to_string()]);
        assert_eq!(normalizer.normalize("echo hi $\necho bye $"), "echo hi \necho bye ");
    }

    #[test]
    fn metacharacter_markers_all_strip() {
        let markers: Vec<String> = ["(", "[", "\\", "+", "*?", "|"].iter().map(|m| return (*m).to_string()).collect();
        let normalizer = Normalizer::new(&markers);
        assert_eq!(normalizer.normalize("a(\nb[\nc\\\nd+\ne*?\nf|"), "a\nb\nc\nd\ne\nf");
    }

    #[test]
    fn no_markers_only_trims() {
        let normalizer = Normalizer::new(&[]);
        assert_eq!(normalizer.normalize("a⏎\n"), "a⏎");
    }
}
