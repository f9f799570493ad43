//! deploy-wizard: validate, preview and release Application specifications.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deploy-wizard", version, about = "Kubernetes manifest release pipeline")]
struct Cli {
    /// Config file (YAML or JSON). Built-in defaults are used when omitted.
    #[arg(long, short, env = "DEPLOY_WIZARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply defaults and validate a payload, printing every error found
    Validate {
        /// Application payload (JSON or YAML)
        payload: PathBuf,
    },
    /// Render a payload as one multi-document manifest
    Preview {
        /// Application payload (JSON or YAML)
        payload: PathBuf,
    },
    /// Render a payload and publish it to its destination repository
    Release {
        /// Application payload (JSON or YAML)
        payload: PathBuf,
        /// Render and commit in memory without contacting the remote
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    debug!(version = env!("CARGO_PKG_VERSION"), "Starting deploy-wizard");

    let result = commands::load_config(cli.config.as_deref()).and_then(|config| {
        match cli.command {
            Commands::Validate { payload } => commands::validate(&config, &payload),
            Commands::Preview { payload } => commands::preview(&config, &payload),
            Commands::Release { payload, dry_run } => {
                commands::release(&config, &payload, dry_run)
            }
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
