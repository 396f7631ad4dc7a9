mod analyzer;
mod commands;
mod config;
mod diagnostics;
mod error;
mod grammar;
mod info;
mod line_index;
mod normalize;
mod pipeline;
mod render;
mod scanner;
mod splitter;
mod token;
mod tokenizer;
mod types;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::render::Format;

/// Top-level arguments.
#[derive(Parser)]
#[command(name = "lintmark", about = "Attach analyzer diagnostics to tokenized code examples")]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Config file to use instead of ./.lintmark.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Annotate one source file and print the annotated tree
    Annotate {
        /// JSON diagnostics from an external linter, instead of syntax analysis
        #[arg(long)]
        diagnostics: Option<PathBuf>,
        /// Dialect override (defaults to the file extension)
        #[arg(long)]
        dialect: Option<String>,
        /// Source file to annotate
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "html")]
        format: Format,
        /// JSON token tree to annotate instead of tokenizing the file
        #[arg(long)]
        tokens: Option<PathBuf>,
    },
    /// Report diagnostics in markdown code examples
    Check,
    /// Annotate every markdown code example and print the results
    Examples {
        /// Output format
        #[arg(long, value_enum, default_value = "html")]
        format: Format,
    },
    /// Print a comprehensive reference for humans and LLMs
    Info {
        /// Output as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Print the token tree of a source file as JSON
    Tokens {
        /// Dialect override (defaults to the file extension)
        #[arg(long)]
        dialect: Option<String>,
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Watch markdown files and re-run check on changes
    Watch,
}

/// Install a stderr subscriber when `RUST_LOG` is set; stay silent otherwise.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
            .with(filter)
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match &cli.command {
        Commands::Annotate { diagnostics, dialect, file, format, tokens } => {
            let args = commands::AnnotateArgs {
                diagnostics: diagnostics.as_deref(),
                dialect: dialect.as_deref(),
                file,
                format: *format,
                tokens: tokens.as_deref(),
            };
            commands::annotate(&args, config_path).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Check => commands::check(config_path),
        Commands::Examples { format } => {
            commands::examples(*format, config_path).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Info { json } => {
            info::run(*json, config_path);
            Ok(ExitCode::SUCCESS)
        },
        Commands::Tokens { dialect, file } => {
            commands::tokens(file, dialect.as_deref(), config_path).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Watch => watch::run(config_path),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3)
        },
    };
}
