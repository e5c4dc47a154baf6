//! Best-effort desktop notifications.
//!
//! Terminal outcomes fan out through a queue consumed by one dispatcher
//! task, so notifications fire in outcome order. Dispatch failures are
//! logged and dropped; they never affect timer or store state.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::events::PomEvent;

/// Delivery backend for a single notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), Box<dyn std::error::Error>>;
}

/// macOS notification center via `osascript`.
pub struct OsaScriptNotifier;

impl Notifier for OsaScriptNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
        let script = format!(
            "display notification \"{}\" with title \"{}\" sound name \"Submarine\"",
            escape(body),
            escape(title)
        );
        let output = std::process::Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()?;
        if !output.status.success() {
            return Err(format!("osascript exited with {}", output.status).into());
        }
        Ok(())
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Fallback that logs the notification instead of displaying it.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
        info!("[{title}] {body}");
        Ok(())
    }
}

/// Picks the notifier for the current platform.
pub fn platform_notifier() -> Box<dyn Notifier> {
    if cfg!(target_os = "macos") {
        Box::new(OsaScriptNotifier)
    } else {
        Box::new(ConsoleNotifier)
    }
}

/// Consumes terminal-outcome events in FIFO order until the queue closes.
pub async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<PomEvent>,
    notifier: Box<dyn Notifier>,
) {
    while let Some(event) = events.recv().await {
        if let Err(e) = notifier.notify(event.title(), &event.body()) {
            warn!("notification dispatch failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;

    struct Recording {
        seen: Arc<Mutex<Vec<String>>>,
        fail_first: bool,
    }

    impl Notifier for Recording {
        fn notify(&self, _title: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
            let mut seen = self.seen.lock().unwrap();
            if self.fail_first && seen.is_empty() {
                seen.push(format!("failed: {body}"));
                return Err("no display".into());
            }
            seen.push(body.to_string());
            Ok(())
        }
    }

    fn completed(name: &str) -> PomEvent {
        PomEvent::PomCompleted {
            name: Some(name.to_string()),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dispatches_in_fifo_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(dispatch_events(
            rx,
            Box::new(Recording {
                seen: seen.clone(),
                fail_first: false,
            }),
        ));

        tx.send(completed("one")).unwrap();
        tx.send(completed("two")).unwrap();
        tx.send(PomEvent::PomCancelled {
            name: None,
            at: Utc::now(),
        })
        .unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["Pom 'one' finished", "Pom 'two' finished", "Pom cancelled"]
        );
    }

    #[tokio::test]
    async fn a_failed_dispatch_does_not_stop_the_queue() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(dispatch_events(
            rx,
            Box::new(Recording {
                seen: seen.clone(),
                fail_first: true,
            }),
        ));

        tx.send(completed("one")).unwrap();
        tx.send(completed("two")).unwrap();
        drop(tx);
        task.await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], "Pom 'two' finished");
    }

    #[test]
    fn console_notifier_never_fails() {
        assert!(ConsoleNotifier.notify("pomd", "Pom finished").is_ok());
    }
}
