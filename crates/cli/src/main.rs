mod db_commands;
mod doctor_commands;
mod run_command;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    spamguard_config::SpamguardConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "spamguard", about = "Spamguard: Telegram spam moderation bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (skips discovery of ./spamguard.toml and ~/.config/spamguard/).
    #[arg(long, global = true, env = "SPAMGUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Validate configuration and check the database.
    Doctor,
    /// Database management.
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config file (explicit or discovered) and layer the deployment
/// environment variables on top.
fn resolve_config(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<(SpamguardConfig, Option<PathBuf>)> {
    let (mut config, path) = match explicit {
        Some(path) => (spamguard_config::load_config(path)?, Some(path.to_path_buf())),
        None => spamguard_config::discover_and_load(),
    };
    spamguard_config::apply_env_overrides(&mut config, lookup)?;
    Ok((config, path))
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "spamguard starting");

    match cli.command {
        None | Some(Commands::Run) => {
            let (config, path) = resolve_config(cli.config.as_deref(), env_lookup)?;
            run_command::run(config, path).await
        },
        Some(Commands::Doctor) => doctor_commands::handle_doctor(cli.config.as_deref()).await,
        Some(Commands::Db { action }) => {
            let (config, _) = resolve_config(cli.config.as_deref(), env_lookup)?;
            db_commands::handle_db(action, &config).await
        },
    }
}
