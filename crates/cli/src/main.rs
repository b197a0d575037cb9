mod config_commands;
mod console;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "parley", about = "Parley: AI replies for in-game chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/parley/).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read chat events from stdin and answer them (default).
    Run {
        /// JSON file holding per-player modes (defaults to modes.json in the
        /// user config dir).
        #[arg(long, env = "PARLEY_MODE_STORE")]
        store: Option<PathBuf>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        None => run(cli.config, None).await,
        Some(Commands::Run { store }) => run(cli.config, store).await,
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
    }
}

async fn run(config_path: Option<PathBuf>, store: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => parley_config::load_config(path)?,
        None => parley_config::discover_and_load(),
    };
    info!(version = env!("CARGO_PKG_VERSION"), "parley starting");

    if let Err(e) = console::run(config, store).await {
        error!(error = %format!("{e:#}"), "parley stopped");
        std::process::exit(1);
    }
    Ok(())
}
