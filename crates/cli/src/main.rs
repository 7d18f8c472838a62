//! InferenceIQ CLI: the main entry point.
//!
//! Commands:
//! - `report`  : Spend and usage analytics over the interaction log
//! - `route`   : Show which model a prompt would be routed to
//! - `pricing` : List the pricing catalog
//! - `estimate`: Price a hypothetical call
//! - `config`  : Print a starter config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(
    name = "inferenceiq",
    about = "InferenceIQ: LLM cost and latency telemetry",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.inferenceiq/config.toml)
    #[arg(short, long, global = true, env = "INFERENCEIQ_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the usage report for an interaction log
    Report {
        /// Log file to read instead of the configured one
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which model a prompt would be routed to
    Route {
        prompt: String,

        /// Model for complex prompts
        #[arg(long)]
        strong: Option<String>,

        /// Model for simple prompts
        #[arg(long)]
        weak: Option<String>,

        /// Prompt length (in characters) above which a prompt is complex
        #[arg(long)]
        threshold: Option<usize>,
    },

    /// List per-token model prices
    Pricing,

    /// Estimate the cost of a call
    Estimate {
        model: String,
        tokens_in: u64,
        tokens_out: u64,
    },

    /// Print a config file populated with the defaults
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `report --json` output stays parseable
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Report { log_file, json } => commands::report::run(&config, log_file, json)?,
        Commands::Route {
            prompt,
            strong,
            weak,
            threshold,
        } => commands::route::run(&config, &prompt, strong, weak, threshold)?,
        Commands::Pricing => commands::pricing::list(&config)?,
        Commands::Estimate {
            model,
            tokens_in,
            tokens_out,
        } => commands::pricing::estimate(&config, &model, tokens_in, tokens_out)?,
        Commands::Config => commands::config_cmd::print_default()?,
    }

    Ok(())
}
