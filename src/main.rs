//! CLI for SimpleMQ
//!
//! Reads one command per line from stdin and prints one JSON reply per line.
//! Type `help` for the command list.

use std::path::PathBuf;

use clap::Parser;
use simplemq::broker::{Coordinator, Outcome};
use simplemq::config::load_config;
use simplemq::shell::{self, Exit};
use simplemq::utils::logging;
use tokio::io::BufReader;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "simplemq", about = "In-memory publish/subscribe broker")]
struct Cli {
    /// Configuration file layered over `config/default`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restore the saved snapshot before accepting commands
    #[arg(long)]
    load_snapshot: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    logging::init(&settings.logging.level);

    if let Err(e) = run(&settings, cli.load_snapshot).await {
        error!("simplemq failed: {e}");
        std::process::exit(1);
    }
}

async fn run(
    settings: &simplemq::config::Settings,
    load_snapshot: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = Coordinator::from_settings(settings)?;

    if load_snapshot {
        let outcome = Outcome::from(coordinator.load_snapshot());
        info!(success = outcome.success, "{}", outcome.msg);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    };

    match shell::serve(&coordinator, stdin, tokio::io::stdout(), interrupted).await? {
        Exit::Finished => info!("Input closed. Exiting."),
        Exit::Interrupted => {
            info!("Shutdown signal received. Exiting gracefully.");
            // The runtime cannot cancel a pending stdin read and would wait
            // for it on shutdown.
            std::process::exit(0);
        }
    }

    Ok(())
}
