//! pomd client entrypoint.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use pomd_core::Config;

use crate::client::Client;
use crate::commands::stats::StatsAction;
use crate::commands::timer::TimerAction;

/// Thin client for the pomd daemon.
#[derive(Parser)]
#[command(name = "pomd", version, about = "Control the pomd work timer")]
struct Cli {
    /// Daemon base URL (defaults to the configured listen address)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Timer(TimerAction),
    #[command(flatten)]
    Stats(StatsAction),
}

fn main() {
    let cli = Cli::parse();
    let base = cli
        .server
        .unwrap_or_else(|| format!("http://{}", Config::load_or_default().server.listen));
    let client = Client::new(base);

    let result = match cli.command {
        Commands::Timer(action) => commands::timer::run(&client, action),
        Commands::Stats(action) => commands::stats::run(&client, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
