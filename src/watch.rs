//! File watcher: runs `check` on startup, then re-runs on markdown or config changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};
use tracing::debug;

use crate::commands;
use crate::error;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Directories holding scanned markdown files, plus the root for config changes.
fn collect_watch_dirs(root: &Path, config_path: Option<&Path>) -> Result<BTreeSet<PathBuf>, error::Error> {
    let config = commands::load_config(config_path)?;
    let examples = crate::scanner::scan(root, &config)?;

    let mut dirs = BTreeSet::new();
    dirs.insert(root.to_path_buf());
    for example in &examples {
        if let Some(parent) = example.source.parent() {
            dirs.insert(root.join(parent));
        }
    }
    return Ok(dirs);
}

/// Create a filesystem watcher that sends events on the given channel.
/// Only markdown and `.toml` changes trigger a re-check.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return is_relevant(p))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| return error::Error::Io(std::io::Error::other(format!("watcher setup failed: {e}"))));
}

/// Markdown sources and config files.
fn is_relevant(path: &Path) -> bool {
    return path
        .extension()
        .is_some_and(|ext| return ext == "md" || ext == "toml");
}

/// Entry point for the watch command.
///
/// Runs an initial check, then watches relevant files and re-checks on changes.
///
/// # Errors
///
/// Returns errors from config loading, markdown scanning, or watcher setup.
pub fn run(config_path: Option<&Path>) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");

    eprintln!("watch: initial check");
    let mut last_code = run_check(config_path);

    let watch_dirs = collect_watch_dirs(&root, config_path)?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    for dir in &watch_dirs {
        if dir.exists() {
            let _ = watcher.watch(dir, RecursiveMode::NonRecursive);
            debug!(dir = %dir.display(), "watching");
        }
    }

    let dir_count = watch_dirs.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-checking...");
        last_code = run_check(config_path);
    }

    return Ok(last_code);
}

/// Run check once and print result. Returns the exit code from check.
fn run_check(config_path: Option<&Path>) -> ExitCode {
    return match commands::check(config_path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(3_u8)
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_markdown_and_config_are_relevant() {
        assert!(is_relevant(Path::new("docs/guide.md")));
        assert!(is_relevant(Path::new(".lintmark.toml")));
        assert!(!is_relevant(Path::new("target/debug/lintmark")));
        assert!(!is_relevant(Path::new("src/main.rs")));
    }
}
