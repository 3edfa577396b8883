//! relcat - keeps the docs release catalog in sync with upstream releases

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod catalog_cli;

use catalog_cli::{CheckArgs, ShowArgs, UpdateArgs};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "relcat",
    about = "Aggregates upstream releases into the docs release catalog",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level (RUST_LOG directives are added on top)
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log output format
    #[clap(long, default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch upstream releases and rewrite the catalog
    Update(UpdateArgs),

    /// Print the catalog as a table or JSON
    Show(ShowArgs),

    /// Verify the catalog invariants
    Check(CheckArgs),
}

fn initialize_tracing(log_level: &LogLevel, log_format: &LogFormat) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    if let Ok(extra) = std::env::var("RUST_LOG") {
        for directive in extra.split(',').filter(|d| !d.trim().is_empty()) {
            if let Ok(parsed) = directive.trim().parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    // Logs go to stderr; stdout carries the summary line and command output
    match log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, &cli.log_format);

    match cli.command {
        Command::Update(args) => catalog_cli::execute_update(args).await,
        Command::Show(args) => catalog_cli::execute_show(args),
        Command::Check(args) => catalog_cli::execute_check(args),
    }
}
