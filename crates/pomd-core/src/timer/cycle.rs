//! Per-segment coordination task.
//!
//! One task is spawned for every run segment. It races the segment's
//! deadline against the pause and stop signals; pause and stop end the
//! task without touching the pom (the control path already mutated it),
//! while an elapsed deadline finalizes the pom under the slot lock.

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::pom::{CycleSignals, Pom};

/// Shared slot holding the at-most-one active pom.
pub(crate) type PomSlot = Arc<Mutex<Option<Pom>>>;

pub(crate) async fn run_cycle(slot: PomSlot, signals: CycleSignals) {
    let CycleSignals {
        pause_rx,
        stop_rx,
        deadline,
        segment,
    } = signals;
    tokio::select! {
        biased;
        _ = pause_rx => {
            debug!(segment, "run segment paused");
        }
        _ = stop_rx => {
            debug!(segment, "run segment stopped");
        }
        _ = tokio::time::sleep_until(deadline) => {
            let finished = {
                let mut guard = slot.lock().unwrap();
                guard.as_mut().map(|pom| pom.complete(segment)).unwrap_or(false)
            };
            if finished {
                debug!(segment, "pom finished");
            } else {
                debug!(segment, "deadline lost the race, pom left untouched");
            }
        }
    }
}
