//! pomd daemon entrypoint.

mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pomd_core::{data_dir, dispatch_events, platform_notifier, App, Config, OutcomeStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::routes::build_router;

/// Work-timer daemon with an HTTP control surface.
#[derive(Parser)]
#[command(name = "pomd-server", version, about = "pomd timer daemon")]
struct Args {
    /// Address to listen on (overrides config)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Outcome store location (overrides the data dir default)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Pom length in minutes (overrides config)
    #[arg(long)]
    length_min: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pomd_core=info,pomd_server=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_or_default();

    let listen: SocketAddr = match args.listen {
        Some(addr) => addr,
        None => config.server.listen.parse()?,
    };
    let db_path = match args.db {
        Some(path) => path,
        None => data_dir()?.join("outcomes.db"),
    };
    let length_min = args.length_min.unwrap_or(config.timer.length_min);

    // store open failure is fatal
    let store = match OutcomeStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            error!("cannot open outcome store at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };

    let (app, events) = App::new(store, pom_length(length_min));
    if config.notifications.enabled {
        tokio::spawn(dispatch_events(events, platform_notifier()));
    } else {
        drop(events);
    }

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("pomd listening on http://{listen}");
    axum::serve(listener, build_router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("pomd stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(e) => {
            error!("failed to install the shutdown handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// Pom length from the configured minutes, saturating on overflow.
fn pom_length(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pom_length_converts_minutes() {
        assert_eq!(pom_length(25), Duration::from_secs(1500));
        assert_eq!(pom_length(0), Duration::ZERO);
    }

    #[test]
    fn pom_length_saturates_on_huge_minutes() {
        assert_eq!(pom_length(u64::MAX), Duration::from_secs(u64::MAX));
        assert_eq!(pom_length(u64::MAX / 60 + 1), Duration::from_secs(u64::MAX));
    }
}
