use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted when a pom reaches a terminal outcome.
///
/// Produced by the outcome reporter after the store write has been
/// attempted, and consumed by the notification dispatcher in FIFO order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PomEvent {
    PomCompleted {
        name: Option<String>,
        at: DateTime<Utc>,
    },
    PomCancelled {
        name: Option<String>,
        at: DateTime<Utc>,
    },
}

impl PomEvent {
    /// Notification title shared by every event.
    pub fn title(&self) -> &'static str {
        "pomd"
    }

    /// Short human line for the notification body.
    pub fn body(&self) -> String {
        match self {
            PomEvent::PomCompleted { name: Some(n), .. } => format!("Pom '{n}' finished"),
            PomEvent::PomCompleted { name: None, .. } => "Pom finished".to_string(),
            PomEvent::PomCancelled { name: Some(n), .. } => format!("Pom '{n}' cancelled"),
            PomEvent::PomCancelled { name: None, .. } => "Pom cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = PomEvent::PomCompleted {
            name: Some("writing".to_string()),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PomCompleted");
        assert_eq!(json["name"], "writing");
    }

    #[test]
    fn body_includes_name_when_present() {
        let at = Utc::now();
        let named = PomEvent::PomCancelled {
            name: Some("review".to_string()),
            at,
        };
        let anonymous = PomEvent::PomCancelled { name: None, at };
        assert_eq!(named.body(), "Pom 'review' cancelled");
        assert_eq!(anonymous.body(), "Pom cancelled");
    }
}
