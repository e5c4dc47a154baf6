use clap::Subcommand;

use crate::client::Client;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a pom, optionally named
    Start {
        /// Label attached to the pom
        name: Option<String>,
    },
    /// Cancel the active pom
    Cancel,
    /// Pause the running pom
    Pause,
    /// Resume the paused pom
    Resume,
}

pub fn run(client: &Client, action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Start { name: Some(name) } => client.post(&format!("/start/{name}")),
        TimerAction::Start { name: None } => client.post("/start"),
        TimerAction::Cancel => client.post("/cancel"),
        TimerAction::Pause => client.post("/pause"),
        TimerAction::Resume => client.post("/resume"),
    }
}
