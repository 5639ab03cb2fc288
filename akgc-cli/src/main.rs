//! AKGC CLI: score and correct LLM responses from the terminal.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// AKGC: hallucination scoring and knowledge-guided correction
#[derive(Parser, Debug)]
#[command(name = "akgc", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace directory (holds .akgc/config.toml and the fact cache)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Use the fast profile (lexical similarity, no external lookup)
    #[arg(long, global = true)]
    fast: bool,

    /// Use the echo generator instead of a model backend
    #[arg(long, global = true)]
    echo: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate a response for a prompt and correct it if needed
    Correct {
        prompt: String,
        /// Similarity below this is reported as context drift
        #[arg(long)]
        sim_threshold: Option<f64>,
        /// HVI below this forces a correction
        #[arg(long)]
        hvi_threshold: Option<f64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Print the full correction report as JSON
        #[arg(long, conflicts_with = "json")]
        report: bool,
    },
    /// Correct every sample in a JSON file and report metrics
    Batch {
        /// JSON array of {"prompt": ..., "ground_truth": ...}
        file: PathBuf,
        /// Write the full report here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Corrections in flight at once
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
    /// Show the facts known for an entity
    Facts { entity: String },
    /// Show the entity extracted from a prompt
    Entity { prompt: String },
    /// Score an existing response without generating
    Score {
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        response: String,
        /// Print the score report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config to <workspace>/.akgc/config.toml
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "akgc", "akgc")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "akgc.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut config = akgc_core::config::load_config(Some(&workspace), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    if cli.fast {
        akgc_core::Profile::Fast.apply(&mut config);
    }
    if cli.echo {
        config.generation.provider = "echo".into();
    }
    commands::anchor_cache_path(&mut config, &workspace);

    commands::handle_command(cli.command, config, &workspace).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_correct_with_overrides() {
        let cli = Cli::try_parse_from([
            "akgc",
            "--echo",
            "correct",
            "The capital of France is Florida.",
            "--hvi-threshold",
            "0.9",
            "--report",
        ])
        .unwrap();
        assert!(cli.echo);
        match cli.command {
            Commands::Correct {
                prompt,
                hvi_threshold,
                sim_threshold,
                report,
                json,
            } => {
                assert_eq!(prompt, "The capital of France is Florida.");
                assert_eq!(hvi_threshold, Some(0.9));
                assert_eq!(sim_threshold, None);
                assert!(report);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_json_conflicts_with_report() {
        assert!(Cli::try_parse_from(["akgc", "correct", "x", "--json", "--report"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["akgc", "batch", "samples.json", "--fast", "-vv"]).unwrap();
        assert!(cli.fast);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Batch { concurrency, .. } => assert_eq!(concurrency, 4),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["akgc"]).is_err());
    }
}
