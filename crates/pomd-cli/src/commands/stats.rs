use clap::Subcommand;

use crate::client::Client;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show the active pom, or outcome counts when idle
    Status,
    /// Delete every recorded outcome
    Clear,
}

pub fn run(client: &Client, action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StatsAction::Status => client.get("/status"),
        StatsAction::Clear => client.post("/clear"),
    }
}
