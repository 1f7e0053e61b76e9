//! namematch - approximate name matching from the command line.
//!
//! Search a name in a list, compare two lists, or find duplicates in one.
//! Names lists hold one `id,name` (or bare `name`) per line and are read
//! from a file or an http(s) URL.
//!
//! CHANGELOG:
//! - 20/10/2026 - Names lists from URLs
//! - 06/02/2026 - Per-call strategy overrides
//! - 02/02/2026 - Initial scaffold with CLI skeleton

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use namematch::commands::{self, Overrides};
use namematch::config::Config;
use namematch::output::{format_error, OutputControls};

/// Approximate name matching: search, compare and deduplicate name lists.
#[derive(Parser, Debug)]
#[command(name = "namematch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist (implies JSON)
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    /// Index strategy (FULL, BUCKET_LAST_TOKEN, ORDERED_FULL_KEY, PREFIX_TREE)
    #[arg(long, global = true)]
    index: Option<String>,

    /// Name scorer (PASS_THROUGH, POSITIONAL_WEIGHTED, BAG_OF_WORDS, JACCARD_TOKEN_SET)
    #[arg(long, global = true)]
    name_scorer: Option<String>,

    /// String scorer wrapped by the name scorer (EXACT, LEVENSHTEIN, KEYBOARD_DISTANCE, JARO_WINKLER)
    #[arg(long, global = true)]
    string_scorer: Option<String>,

    /// Keep results past this score (switches to threshold mode)
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Keep the best N results, 0 for all (switches to top-N mode)
    #[arg(long, global = true)]
    max: Option<i32>,

    /// Preprocessor, e.g. PIPELINE:TOKENIZE,LOWERCASE,NICKNAME
    #[arg(long, global = true)]
    preprocessor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    // =========================================================================
    // MATCHING COMMANDS
    // =========================================================================
    /// Search one name in a names file
    Search {
        /// Name to look for
        query: String,

        /// Names file or http(s) URL
        #[arg(short, long)]
        file: String,
    },

    /// Match every name of the first list against the second
    Compare {
        file_a: String,
        file_b: String,
    },

    /// Find likely duplicates within one names list
    Dedupe {
        file: String,
    },

    /// List available strategies
    Strategies,

    // =========================================================================
    // CONFIG COMMANDS
    // =========================================================================
    /// Show or edit the persisted configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Set one key (e.g. index_strategy PREFIX_TREE, weights.last 0.6)
    Set { key: String, value: String },
    /// Restore defaults
    Reset,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let output_controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    let overrides = Overrides {
        index: cli.index.clone(),
        name_scorer: cli.name_scorer.clone(),
        string_scorer: cli.string_scorer.clone(),
        threshold: cli.threshold,
        max: cli.max,
        preprocessor: cli.preprocessor.clone(),
    };

    let result = match cli.command {
        Command::Search { query, file } => effective_config(&overrides)
            .and_then(|config| commands::matching::search(&query, &file, &config, &output_controls)),
        Command::Compare { file_a, file_b } => effective_config(&overrides)
            .and_then(|config| commands::matching::compare(&file_a, &file_b, &config, &output_controls)),
        Command::Dedupe { file } => effective_config(&overrides)
            .and_then(|config| commands::matching::dedupe(&file, &config, &output_controls)),
        Command::Strategies => commands::matching::strategies(&output_controls),

        Command::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&output_controls),
            ConfigAction::Path => commands::config::path(),
            ConfigAction::Set { key, value } => commands::config::set(&key, &value, &output_controls),
            ConfigAction::Reset => commands::config::reset(&output_controls),
        },
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if cli.json {
                println!("{}", format_error(&format!("{:#}", e)));
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}

/// Persisted config with this invocation's overrides applied.
fn effective_config(overrides: &Overrides) -> anyhow::Result<Config> {
    let mut config = Config::load_default()?;
    overrides.apply(&mut config)?;
    Ok(config)
}
