//! Application layer tying the pom slot, the outcome store and the
//! notification queue together.
//!
//! Every control operation observes and mutates the single pom slot under
//! one lock, so concurrent requests racing a deadline are serialized and
//! the first to acquire the lock wins. Terminal outcomes travel through a
//! per-pom done channel to the outcome reporter, which records the outcome
//! before enqueueing its notification.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::error::Result;
use crate::events::PomEvent;
use crate::outcome::{Outcome, OutcomeCounts};
use crate::storage::OutcomeStore;
use crate::timer::{run_cycle, Pom, PomSlot, PomSnapshot, PomState};

/// Control operation attempted against the pom slot. Paired with the
/// state it observed to produce the message in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PomAction {
    Start,
    Cancel,
    Pause,
    Resume,
    Status,
}

/// Whether a control operation was applied or refused by the observed
/// state. Both carry the post-operation snapshot.
#[derive(Debug, Clone)]
pub enum Transition {
    Applied(PomSnapshot),
    Rejected(PomSnapshot),
}

impl Transition {
    pub fn snapshot(&self) -> &PomSnapshot {
        match self {
            Transition::Applied(snap) | Transition::Rejected(snap) => snap,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

/// What `status` reports: an idle daemon summarizes outcome counts, an
/// active one describes the pom in flight.
#[derive(Debug, Clone)]
pub enum StatusView {
    Counts(OutcomeCounts),
    Active(PomSnapshot),
}

#[derive(Clone)]
pub struct App {
    slot: PomSlot,
    store: Arc<OutcomeStore>,
    events: mpsc::UnboundedSender<PomEvent>,
    length: Duration,
}

impl App {
    /// Builds the app around an open store. The returned receiver feeds
    /// [`crate::notify::dispatch_events`]; dropping it disables
    /// notifications without affecting anything else.
    pub fn new(store: OutcomeStore, length: Duration) -> (Self, mpsc::UnboundedReceiver<PomEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let app = Self {
            slot: Arc::new(Mutex::new(None)),
            store: Arc::new(store),
            events,
            length,
        };
        (app, events_rx)
    }

    /// Starts a new pom. Refused while one is already active.
    pub fn start(&self, name: Option<String>) -> Transition {
        let mut slot = self.slot.lock().unwrap();
        let observed = state_of(&slot);
        if observed != PomState::Idle {
            return self.rejected(&slot, PomAction::Start, observed);
        }
        let (mut pom, done_rx) = Pom::new(name, self.length);
        if let Some(signals) = pom.start() {
            let reporter = report_outcome(
                Arc::clone(&self.store),
                self.events.clone(),
                pom.name().map(str::to_string),
                done_rx,
            );
            *slot = Some(pom);
            tokio::spawn(run_cycle(Arc::clone(&self.slot), signals));
            tokio::spawn(reporter);
        }
        self.applied(&slot, PomAction::Start, observed)
    }

    /// Cancels the active pom from either `Running` or `Paused`.
    pub fn cancel(&self) -> Transition {
        let mut slot = self.slot.lock().unwrap();
        let observed = state_of(&slot);
        let stopped = slot.as_mut().map(|pom| pom.stop()).unwrap_or(false);
        if stopped {
            self.applied(&slot, PomAction::Cancel, observed)
        } else {
            self.rejected(&slot, PomAction::Cancel, observed)
        }
    }

    /// Pauses the running pom and records a paused outcome.
    ///
    /// The record is written on this path, not through the done channel;
    /// a write failure is logged and the pause stands.
    pub fn pause(&self) -> Transition {
        let transition = {
            let mut slot = self.slot.lock().unwrap();
            let observed = state_of(&slot);
            let paused = slot.as_mut().map(|pom| pom.pause()).unwrap_or(false);
            if paused {
                self.applied(&slot, PomAction::Pause, observed)
            } else {
                self.rejected(&slot, PomAction::Pause, observed)
            }
        };
        if transition.is_applied() {
            if let Err(e) = self.store.record_outcome(Outcome::Paused, Utc::now()) {
                warn!("failed to record paused outcome: {e}");
            }
        }
        transition
    }

    /// Resumes the paused pom with its frozen remainder.
    pub fn resume(&self) -> Transition {
        let mut slot = self.slot.lock().unwrap();
        let observed = state_of(&slot);
        match slot.as_mut().and_then(|pom| pom.resume()) {
            Some(signals) => {
                tokio::spawn(run_cycle(Arc::clone(&self.slot), signals));
                self.applied(&slot, PomAction::Resume, observed)
            }
            None => self.rejected(&slot, PomAction::Resume, observed),
        }
    }

    /// Idle daemons report outcome counts; active ones report the pom.
    pub fn status(&self) -> Result<StatusView> {
        {
            let slot = self.slot.lock().unwrap();
            let observed = state_of(&slot);
            if observed != PomState::Idle {
                return Ok(StatusView::Active(self.described(
                    &slot,
                    PomAction::Status,
                    observed,
                )));
            }
        }
        Ok(StatusView::Counts(self.store.counts()?))
    }

    /// Clears every recorded outcome and rotates the store identity.
    /// Legal in any timer state; the active pom is untouched.
    pub fn clear(&self) -> Result<()> {
        self.store.reset_all()?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Observed state of the slot; an empty slot reads as `Idle`.
    pub fn state(&self) -> PomState {
        state_of(&self.slot.lock().unwrap())
    }

    /// Remaining time of the active pom, or the configured length when
    /// nothing has ever run.
    pub fn time_left(&self) -> Duration {
        self.slot
            .lock()
            .unwrap()
            .as_ref()
            .map(Pom::time_left)
            .unwrap_or(self.length)
    }

    fn applied(&self, slot: &Option<Pom>, action: PomAction, observed: PomState) -> Transition {
        Transition::Applied(self.described(slot, action, observed))
    }

    fn rejected(&self, slot: &Option<Pom>, action: PomAction, observed: PomState) -> Transition {
        Transition::Rejected(self.described(slot, action, observed))
    }

    fn described(&self, slot: &Option<Pom>, action: PomAction, observed: PomState) -> PomSnapshot {
        let mut snap = snapshot_of(slot, self.length);
        snap.message = transition_message(action, observed).to_string();
        snap
    }
}

fn state_of(slot: &Option<Pom>) -> PomState {
    slot.as_ref().map(Pom::state).unwrap_or(PomState::Idle)
}

fn snapshot_of(slot: &Option<Pom>, length: Duration) -> PomSnapshot {
    match slot {
        Some(pom) => pom.snapshot(),
        None => PomSnapshot {
            state: PomState::Idle,
            name: None,
            started_at: None,
            finishes_at: None,
            remaining_ms: length.as_millis() as u64,
            paused_ms: 0,
            message: String::new(),
        },
    }
}

fn transition_message(action: PomAction, observed: PomState) -> &'static str {
    match (action, observed) {
        (PomAction::Start, PomState::Idle) => "Pom started",
        (PomAction::Start, PomState::Running) => "Pom already running, pause or cancel first",
        (PomAction::Start, PomState::Paused) => "Pom paused, resume or cancel first",
        (PomAction::Cancel, PomState::Running | PomState::Paused) => "Pom has been cancelled",
        (PomAction::Cancel, PomState::Idle) => "No current pom to cancel",
        (PomAction::Pause, PomState::Running) => "Pom paused",
        (PomAction::Pause, PomState::Paused) => "Pom already paused",
        (PomAction::Pause, PomState::Idle) => "No current pom to pause",
        (PomAction::Resume, PomState::Paused) => "Pom resumed",
        (PomAction::Resume, PomState::Running) => "Pom already running",
        (PomAction::Resume, PomState::Idle) => "No current pom to resume",
        (PomAction::Status, PomState::Running) => "Currently in a pom",
        (PomAction::Status, PomState::Paused) => "Pom currently paused",
        (PomAction::Status, PomState::Idle) => "No pom running",
    }
}

/// Waits for the pom's terminal outcome, records it, then queues the
/// notification. The store write always precedes the enqueue.
async fn report_outcome(
    store: Arc<OutcomeStore>,
    events: mpsc::UnboundedSender<PomEvent>,
    name: Option<String>,
    done_rx: oneshot::Receiver<Outcome>,
) {
    let Ok(outcome) = done_rx.await else {
        return;
    };
    let at = Utc::now();
    let event = match outcome {
        Outcome::Completed => PomEvent::PomCompleted { name, at },
        Outcome::Cancelled => PomEvent::PomCancelled { name, at },
        // pauses are recorded on the control path, never through done
        Outcome::Paused => return,
    };
    if let Err(e) = store.record_outcome(outcome, at) {
        warn!("failed to record {} outcome: {e}", outcome.key());
    }
    let _ = events.send(event);
}
