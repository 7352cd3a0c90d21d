use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harvest_tui::RunOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "harvest-tui",
    about = "Harvest family payments - terminal admin client"
)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Path to harvest.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log directive used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration
    Config {
        /// Write the default config file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let options = RunOptions {
        server_url: cli.server,
        config_path: cli.config,
    };

    let result = match cli.command {
        Some(Commands::Config { init: true }) => harvest_tui::init_config(
            options.config_path.as_deref(),
        )
        .map(|path| println!("Wrote {}", path.display())),
        Some(Commands::Config { init: false }) => {
            harvest_tui::show_config(&options).map(|body| print!("{body}"))
        }
        None => init_logging(&cli.log_level).and_then(|()| harvest_tui::run(options)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// The terminal is owned by the UI, so logs go to a file.
fn init_logging(level: &str) -> Result<()> {
    let path = harvest_runtime_config::log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}
