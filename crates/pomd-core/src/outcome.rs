use serde::{Deserialize, Serialize};

/// How a pom left the active state.
///
/// `Completed` and `Cancelled` are terminal and end the pom's lifetime.
/// `Paused` is recorded every time a running pom is paused, so a single
/// pom can contribute several paused outcomes before its terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Cancelled,
    Paused,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Completed, Outcome::Cancelled, Outcome::Paused];

    /// Stable token used in store keys. Never change these once data exists.
    pub fn key(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Cancelled => "cancelled",
            Outcome::Paused => "paused",
        }
    }
}

/// Per-kind tallies read from the outcome store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub completed: u64,
    pub cancelled: u64,
    pub paused: u64,
}

impl OutcomeCounts {
    /// One-line summary shown when the daemon is idle.
    pub fn summary(&self) -> String {
        format!(
            "Success: {}, Cancelled: {}, Paused: {}",
            self.completed, self.cancelled, self.paused
        )
    }
}
