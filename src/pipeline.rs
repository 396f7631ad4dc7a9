//! End-to-end annotation of one source text or a batch of markdown examples.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::error::Error;
use crate::grammar;
use crate::line_index::LineIndex;
use crate::normalize::Normalizer;
use crate::scanner::Example;
use crate::splitter;
use crate::token::{self, Token};
use crate::tokenizer;
use crate::types::{Diagnostic, Options};

/// A source text with its diagnostics spliced into the token tree.
#[derive(Debug, Serialize)]
pub struct Annotation {
    /// Ranges that became wrappers.
    pub applied: usize,
    /// Non-fatal diagnostics the analyzer reported.
    pub diagnostics: Vec<Diagnostic>,
    /// Fatal diagnostics. When present, nothing was annotated.
    pub fatal: Vec<Diagnostic>,
    /// Diagnostics whose range could not be placed in the tree.
    pub skipped: usize,
    /// The annotated token tree.
    pub tokens: Vec<Token>,
}

impl Annotation {
    /// True when the analyzer could not parse the input.
    pub fn is_unparsable(&self) -> bool {
        return !self.fatal.is_empty();
    }
}

/// Outcome for one markdown example. Failures stay local to their example.
#[derive(Debug)]
pub struct ExampleReport {
    /// The example that was processed.
    pub example: Example,
    /// The annotation, or why it could not be produced.
    pub result: Result<Annotation, Error>,
}

/// Where a source text came from and how to read it.
pub struct SourceInput<'a> {
    /// Dialect to analyze and tokenize with.
    pub dialect: &'a str,
    /// Options for the analyzer; `dialect` is filled in when absent.
    pub options: Options,
    /// Label for errors and logs.
    pub origin: &'a Path,
    /// Pre-built token tree to use instead of the tokenizer.
    pub tokens: Option<Vec<Token>>,
}

/// Annotate one source text.
///
/// Steps: normalize, analyze, set aside fatal diagnostics, tokenize, verify the
/// tree spells out the normalized text, resolve diagnostic locations to ranges,
/// and splice the ranges into the tree.
///
/// # Errors
///
/// Returns analyzer or tokenizer errors, `Error::ReconstitutionMismatch` when
/// the token tree and the text disagree, or `Error::MalformedTree` from the splitter.
pub fn annotate_source(
    input: SourceInput<'_>,
    text: &str,
    analyzer: &dyn Analyzer,
    normalizer: &Normalizer,
) -> Result<Annotation, Error> {
    let normalized = normalizer.normalize(text);
    let mut options = input.options;
    options
        .entry("dialect".to_string())
        .or_insert_with(|| return input.dialect.to_string());

    let found = analyzer.analyze(&normalized, &options)?;
    let (fatal, diagnostics): (Vec<Diagnostic>, Vec<Diagnostic>) =
        found.into_iter().partition(|d| return d.fatal);

    let tokens = match input.tokens {
        Some(tokens) => tokens,
        None => tokenizer::tokenize(input.origin, &normalized, input.dialect)?,
    };
    verify_reconstitution(input.origin, &tokens, &normalized)?;

    if !fatal.is_empty() {
        debug!(origin = %input.origin.display(), count = fatal.len(), "withholding fatal diagnostics");
        return Ok(Annotation { applied: 0, diagnostics, fatal, skipped: 0, tokens });
    }

    let index = LineIndex::new(&normalized);
    let ranges: Vec<_> = diagnostics.iter().filter_map(|d| return index.range(d)).collect();
    let unresolved = diagnostics.len().saturating_sub(ranges.len());

    let annotated = splitter::apply_annotations(tokens, &ranges)?;
    info!(
        origin = %input.origin.display(),
        lines = index.line_count(),
        applied = annotated.applied,
        skipped = annotated.skipped.saturating_add(unresolved),
        "annotated source"
    );

    return Ok(Annotation {
        applied: annotated.applied,
        diagnostics,
        fatal,
        skipped: annotated.skipped.saturating_add(unresolved),
        tokens: annotated.tokens,
    });
}

/// Annotate every eligible example. Ineligible examples are dropped with a
/// debug log; a failing example is reported and the rest still run.
pub fn annotate_examples(examples: Vec<Example>, config: &Config, analyzer: &dyn Analyzer) -> Vec<ExampleReport> {
    let normalizer = Normalizer::new(&config.markers);
    let mut reports = Vec::new();

    for example in examples {
        if let Some(reason) = example.skip_reason(config) {
            debug!(source = %example.source.display(), line = example.line, reason, "skipping example");
            continue;
        }

        let result = annotate_example(&example, config, analyzer, &normalizer);
        if let Err(e) = &result {
            warn!(source = %example.source.display(), line = example.line, error = %e, "example failed");
        }
        reports.push(ExampleReport { example, result });
    }

    return reports;
}

/// Annotate a single markdown example with config options under fence options.
///
/// # Errors
///
/// Returns any error from [`annotate_source`].
fn annotate_example(
    example: &Example,
    config: &Config,
    analyzer: &dyn Analyzer,
    normalizer: &Normalizer,
) -> Result<Annotation, Error> {
    let dialect = grammar::canonical_dialect(&example.dialect).ok_or_else(|| {
        return Error::UnsupportedLanguage { dialect: example.dialect.clone() };
    })?;

    let mut options = config.options.clone();
    options.extend(example.options.clone());
    options.insert("dialect".to_string(), dialect.to_string());

    let origin = example_origin(example);
    let input = SourceInput { dialect, options, origin: &origin, tokens: None };
    return annotate_source(input, &example.code, analyzer, normalizer);
}

/// `docs/guide.md:12` style label for an example.
pub fn example_origin(example: &Example) -> PathBuf {
    return PathBuf::from(format!("{}:{}", example.source.display(), example.line));
}

/// Check that a token tree spells out exactly the analyzed text.
///
/// # Errors
///
/// Returns `Error::ReconstitutionMismatch` with both lengths when they differ.
fn verify_reconstitution(origin: &Path, tokens: &[Token], text: &str) -> Result<(), Error> {
    let flattened = token::flatten(tokens);
    if flattened == text {
        return Ok(());
    }
    return Err(Error::ReconstitutionMismatch {
        file: origin.to_path_buf(),
        source_chars: text.chars().count(),
        tree_chars: flattened.chars().count(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SyntaxAnalyzer;
    use crate::token::messages;
    use crate::types::Location;

    /// Analyzer that returns a fixed list.
    struct Fixed(Vec<Diagnostic>);

    impl Analyzer for Fixed {
        fn analyze(&self, _source: &str, _options: &Options) -> Result<Vec<Diagnostic>, Error> {
            return Ok(self.0.clone());
        }
    }

    fn diagnostic(message: &str, start: (usize, usize), end: Option<(usize, usize)>) -> Diagnostic {
        return Diagnostic {
            end: end.map(|(l, c)| return Location::new(l, c)),
            fatal: false,
            message: message.to_string(),
            start: Location::new(start.0, start.1),
        };
    }

    fn input(origin: &Path) -> SourceInput<'_> {
        return SourceInput { dialect: "rust", options: Options::new(), origin, tokens: None };
    }

    #[test]
    fn annotates_and_reconstitutes() {
        let text = "let unused = 1;\nlet y = 2;⏎\n";
        let analyzer = Fixed(vec![
            diagnostic("unused variable", (1, 5), Some((1, 11))),
            diagnostic("trailing", (2, 11), None),
        ]);
        let out = annotate_source(input(Path::new("t.rs")), text, &analyzer, &Normalizer::default()).unwrap();

        assert_eq!(token::flatten(&out.tokens), "let unused = 1;\nlet y = 2;");
        assert_eq!(out.applied, 1);
        assert_eq!(out.skipped, 1, "point past the normalized end is skipped");
        assert_eq!(messages(&out.tokens), vec!["unused variable"]);
    }

    #[test]
    fn fatal_diagnostics_never_reach_the_splitter() {
        let mut fatal = diagnostic("cannot parse", (1, 1), None);
        fatal.fatal = true;
        let analyzer = Fixed(vec![fatal, diagnostic("other", (1, 1), None)]);
        let out = annotate_source(input(Path::new("t.rs")), "let x = 1;", &analyzer, &Normalizer::default()).unwrap();

        assert!(out.is_unparsable());
        assert_eq!(out.applied, 0);
        assert!(messages(&out.tokens).is_empty());
    }

    #[test]
    fn unresolvable_locations_are_skipped() {
        let analyzer = Fixed(vec![diagnostic("far away", (9, 1), None)]);
        let out = annotate_source(input(Path::new("t.rs")), "let x = 1;", &analyzer, &Normalizer::default()).unwrap();
        assert_eq!((out.applied, out.skipped), (0, 1));
    }

    #[test]
    fn mismatched_external_tree_is_rejected() {
        let analyzer = Fixed(Vec::new());
        let mut source = input(Path::new("t.rs"));
        source.tokens = Some(vec![Token::text("something else")]);
        let result = annotate_source(source, "let x = 1;", &analyzer, &Normalizer::default());
        assert!(matches!(result, Err(Error::ReconstitutionMismatch { .. })));
    }

    #[test]
    fn syntax_errors_are_annotated_in_examples() {
        let md = "```rust\nfn main() {\n    let x = ;\n}\n```\n\n```rust no-lint\nnot rust at all (\n```\n";
        let examples = crate::scanner::extract_examples(md, Path::new("guide.md"));
        let reports = annotate_examples(examples, &Config::default(), &SyntaxAnalyzer);

        assert_eq!(reports.len(), 1);
        let report = reports.first().unwrap();
        let annotation = report.result.as_ref().unwrap();
        assert!(annotation.applied >= 1);
        assert_eq!(token::flatten(&annotation.tokens), "fn main() {\n    let x = ;\n}");
    }

    #[test]
    fn failing_example_does_not_stop_the_batch() {
        /// Analyzer that fails for python and is clean otherwise.
        struct PickyAnalyzer;
        impl Analyzer for PickyAnalyzer {
            fn analyze(&self, _source: &str, options: &Options) -> Result<Vec<Diagnostic>, Error> {
                if options.get("dialect").is_some_and(|d| return d == "python") {
                    return Err(Error::UnsupportedLanguage { dialect: "python".to_string() });
                }
                return Ok(Vec::new());
            }
        }

        let md = "```python\nx = 1\n```\n```rust\nlet x = 1;\n```\n";
        let examples = crate::scanner::extract_examples(md, Path::new("guide.md"));
        let reports = annotate_examples(examples, &Config::default(), &PickyAnalyzer);

        assert_eq!(reports.len(), 2);
        assert!(reports.first().unwrap().result.is_err());
        assert!(reports.get(1).unwrap().result.is_ok());
    }

    #[test]
    fn fence_options_override_config_options() {
        /// Analyzer that echoes the `strict` option as a diagnostic message.
        struct Echo;
        impl Analyzer for Echo {
            fn analyze(&self, _source: &str, options: &Options) -> Result<Vec<Diagnostic>, Error> {
                let strict = options.get("strict").cloned().unwrap_or_default();
                return Ok(vec![diagnostic(&strict, (1, 1), None)]);
            }
        }

        let config = Config::parse("[options]\nstrict = \"false\"").unwrap();
        let md = "```rust strict=true\nlet x = 1;\n```\n";
        let examples = crate::scanner::extract_examples(md, Path::new("guide.md"));
        let reports = annotate_examples(examples, &config, &Echo);
        let annotation = reports.first().unwrap().result.as_ref().unwrap();
        assert_eq!(messages(&annotation.tokens), vec!["true"]);
    }
}
