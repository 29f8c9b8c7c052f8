//! Riskwise CLI: risk calculations, the risk register and the HTTP API
//! from the terminal.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Riskwise: cybersecurity risk calculation and register
#[derive(Parser, Debug)]
#[command(name = "riskwise", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run a risk calculation from a JSON request (object or array)
    Calculate {
        /// Request file, or `-` for stdin
        input: PathBuf,
    },
    /// Manage the risk register
    Risk {
        #[command(subcommand)]
        action: RiskAction,
    },
    /// Export the risk register
    Export {
        /// Output format: csv or json (defaults to the configured format)
        #[arg(short, long)]
        format: Option<String>,
        /// Earliest creation date (YYYY-MM-DD or RFC 3339)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Latest creation date (YYYY-MM-DD or RFC 3339)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum RiskAction {
    /// List register entries, highest residual score first
    List {
        /// Case-insensitive text in name, description or asset
        #[arg(short, long)]
        search: Option<String>,
        /// Status: open, in-progress, mitigated, accepted, transferred
        #[arg(long)]
        status: Option<String>,
        /// Exact category
        #[arg(long)]
        category: Option<String>,
    },
    /// Add an entry from a JSON file
    Add {
        /// Entry file, or `-` for stdin
        input: PathBuf,
    },
    /// Show one entry
    Show {
        /// Risk identifier
        id: String,
    },
    /// Apply a partial update from a JSON file
    Update {
        /// Risk identifier
        id: String,
        /// Patch file, or `-` for stdin
        input: PathBuf,
    },
    /// Delete an entry
    Delete {
        /// Risk identifier
        id: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default workspace configuration file
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "riskwise", "riskwise")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "riskwise.log");
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

    let config = riskwise_core::load_config(Some(&workspace), cli.config.as_deref(), None)?;

    commands::handle_command(cli.command, config, &workspace).await
}
