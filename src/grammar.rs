/// Tree-sitter grammar resolution by dialect name or file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Dialects with a bundled grammar, paired with the names and extensions
/// that select them. The first alias is the canonical name.
pub const DIALECTS: &[(&str, &[&str])] = &[
    ("bash", &["bash", "sh", "shell", "zsh"]),
    ("go", &["go", "golang"]),
    ("markdown", &["markdown", "md"]),
    ("python", &["python", "py"]),
    ("rust", &["rust", "rs"]),
    ("tsx", &["tsx", "jsx"]),
    ("typescript", &["typescript", "ts", "javascript", "js"]),
];

/// Canonical dialect name for a fence tag, option value, or extension.
pub fn canonical_dialect(name: &str) -> Option<&'static str> {
    let lowered = name.to_ascii_lowercase();
    return DIALECTS
        .iter()
        .find(|(_, aliases)| return aliases.contains(&lowered.as_str()))
        .map(|(canonical, _)| return *canonical);
}

/// Dialect implied by a file's extension.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown or missing extensions.
pub fn dialect_for_path(path: &Path) -> Result<&'static str, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    return canonical_dialect(ext).ok_or_else(|| return Error::UnsupportedLanguage {
        dialect: ext.to_string(),
    });
}

/// Map a dialect name to its tree-sitter language.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown dialects.
pub fn language_for_dialect(dialect: &str) -> Result<Language, Error> {
    return match canonical_dialect(dialect) {
        Some("bash") => Ok(tree_sitter_bash::LANGUAGE.into()),
        Some("go") => Ok(tree_sitter_go::LANGUAGE.into()),
        Some("markdown") => Ok(tree_sitter_md::LANGUAGE.into()),
        Some("python") => Ok(tree_sitter_python::LANGUAGE.into()),
        Some("rust") => Ok(tree_sitter_rust::LANGUAGE.into()),
        Some("tsx") => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Some("typescript") => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        _ => Err(Error::UnsupportedLanguage {
            dialect: dialect.to_string(),
        }),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_names() {
        assert_eq!(canonical_dialect("RS"), Some("rust"));
        assert_eq!(canonical_dialect("sh"), Some("bash"));
        assert_eq!(canonical_dialect("js"), Some("typescript"));
        assert_eq!(canonical_dialect("cobol"), None);
    }

    #[test]
    fn extension_selects_dialect() {
        assert_eq!(dialect_for_path(Path::new("src/lib.rs")).unwrap(), "rust");
        assert!(matches!(
            dialect_for_path(Path::new("notes.txt")),
            Err(Error::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn every_dialect_has_a_grammar() {
        for (name, _) in DIALECTS {
            assert!(language_for_dialect(name).is_ok(), "no grammar for {name}");
        }
    }
}
