use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod orchestrator;
mod plan;
mod session;
mod utils;

use cli::{Cli, Commands};
use config::ConfigError;
use session::CommandError;

/// Exit status for configuration problems detected before any side effect.
const EXIT_CONFIG: i32 = 2;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Deploy(args) => commands::deploy::execute(args).await,
        Commands::Destroy(args) => commands::destroy::execute(args).await,
        Commands::Status(args) => commands::status::execute(args).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Configuration errors exit with 2; a failed git/tmux call passes its own
/// exit status through.
fn exit_code(err: &anyhow::Error) -> i32 {
    if err.chain().any(|e| e.is::<ConfigError>()) {
        return EXIT_CONFIG;
    }
    err.chain()
        .find_map(|e| e.downcast_ref::<CommandError>())
        .and_then(CommandError::exit_code)
        .unwrap_or(1)
}
