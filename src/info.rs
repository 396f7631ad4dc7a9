use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::commands;
use crate::grammar::DIALECTS;
use crate::scanner;

/// Output the comprehensive lintmark reference document.
pub fn run(json: bool, config_path: Option<&Path>) {
    let root = PathBuf::from(".");
    let state = gather_state(&root, config_path);

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

struct CurrentState {
    config_found: bool,
    example_count: Option<usize>,
    markers: Vec<String>,
    skip_tag: String,
}

fn gather_state(root: &Path, config_path: Option<&Path>) -> CurrentState {
    let config_found = config_path.map_or_else(|| root.join(".lintmark.toml").exists(), Path::exists);
    let config = commands::load_config(config_path).unwrap_or_default();
    let example_count = scanner::scan(root, &config)
        .ok()
        .map(|examples| examples.iter().filter(|e| e.skip_reason(&config).is_none()).count());

    CurrentState {
        config_found,
        example_count,
        markers: config.markers,
        skip_tag: config.skip_tag,
    }
}

// ── Markdown output ───────────────────────────────────────────────────

fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_dialects();
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

fn print_markdown_header(version: &str) {
    print!(
        "\
# lintmark {version}

Attach analyzer diagnostics to tokenized code examples. Every diagnostic range
becomes one highlighted span carrying its message; the code text itself is
never changed.

## Workflow

    lintmark check                         Report diagnostics in markdown examples (exit 0/1/2)
    lintmark examples --format html        Render annotated examples
    lintmark annotate <file>               Annotate one source file
    lintmark annotate <file> --diagnostics d.json
                                           Use diagnostics from an external linter
    lintmark tokens <file>                 Print the token tree as JSON
    lintmark watch                         Re-run check when markdown changes

## Example fences

    ```rust                                analyzed as Rust
    ```rust strict=true                    analyzer option for this example
    ```rust no-lint                        skipped

## Configuration (.lintmark.toml)

    include = [\"docs/\"]                 # only scan these paths
    exclude = [\"docs/archive/\"]         # skip these paths
    skip_tag = \"no-lint\"                # fence tag that skips an example
    markers = [\"⏎\", \"↵\"]               # end-of-line glyphs to strip

    [options]
    strict = \"true\"                     # passed to the analyzer

"
    );
}

fn print_markdown_dialects() {
    println!("## Supported Dialects\n");
    println!("| Dialect    | Fence tags |");
    println!("|------------|------------|");
    for (name, aliases) in DIALECTS {
        println!("| {name:<10} | {} |", aliases.join(" "));
    }
    println!("\n## Current State\n");
}

fn print_markdown_state(state: &CurrentState) {
    if state.config_found {
        println!("Config:     .lintmark.toml (found)");
    } else {
        println!("Config:     .lintmark.toml (not found)");
    }

    match state.example_count {
        Some(n) => println!("Examples:   {n} eligible"),
        None => println!("Examples:   (scan failed)"),
    }

    println!("Skip tag:   {}", state.skip_tag);
    if state.markers.is_empty() {
        println!("Markers:    (none)");
    } else {
        println!("Markers:    {}", state.markers.join(" "));
    }
}

fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success / no diagnostics |
| 1    | Diagnostics found |
| 2    | An example was unparsable or failed |
| 3    | Runtime error |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct InfoJson {
    version: String,
    dialects: Vec<DialectInfo>,
    exit_codes: Vec<ExitCodeInfo>,
    current_state: StateJson,
}

#[derive(Serialize)]
struct DialectInfo {
    aliases: Vec<String>,
    dialect: String,
}

#[derive(Serialize)]
struct ExitCodeInfo {
    code: u8,
    meaning: String,
}

#[derive(Serialize)]
struct StateJson {
    config_found: bool,
    example_count: Option<usize>,
    markers: Vec<String>,
    skip_tag: String,
}

fn print_json(state: &CurrentState) {
    let info = InfoJson {
        version: env!("CARGO_PKG_VERSION").to_string(),
        dialects: DIALECTS
            .iter()
            .map(|(name, aliases)| DialectInfo {
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
                dialect: (*name).to_string(),
            })
            .collect(),
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "Success / no diagnostics".to_string() },
            ExitCodeInfo { code: 1, meaning: "Diagnostics found".to_string() },
            ExitCodeInfo { code: 2, meaning: "An example was unparsable or failed".to_string() },
            ExitCodeInfo { code: 3, meaning: "Runtime error".to_string() },
        ],
        current_state: StateJson {
            config_found: state.config_found,
            example_count: state.example_count,
            markers: state.markers.clone(),
            skip_tag: state.skip_tag.clone(),
        },
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}
