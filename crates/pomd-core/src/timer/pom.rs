//! Pom state machine.
//!
//! A pom moves between `Idle`, `Running` and `Paused`. Transition methods
//! mutate state only when their precondition holds and report the refusal
//! to the caller otherwise, so the API layer can map refusals straight to
//! status codes. Time accounting is segment based: every start or resume
//! opens a fresh run segment with its own remaining budget, and pausing
//! freezes the remainder until the next resume.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::outcome::Outcome;

/// Where a pom currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomState {
    Idle,
    Running,
    Paused,
}

/// Wiring handed to the coordination task for one run segment.
pub(crate) struct CycleSignals {
    pub(crate) pause_rx: oneshot::Receiver<()>,
    pub(crate) stop_rx: oneshot::Receiver<()>,
    pub(crate) deadline: Instant,
    pub(crate) segment: u64,
}

/// Point-in-time view of a pom plus the message describing the transition
/// that produced it. This is the JSON body of every pom-state response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomSnapshot {
    pub state: PomState,
    pub name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finishes_at: Option<DateTime<Utc>>,
    pub remaining_ms: u64,
    pub paused_ms: u64,
    pub message: String,
}

// Segment ids are unique across all poms, so a coordination task that
// outlives its pom can never finalize a later one that reuses the slot.
static SEGMENT_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct Pom {
    name: Option<String>,
    length: Duration,
    state: PomState,
    started_at: Option<DateTime<Utc>>,
    /// When the current run segment began.
    segment_started: Instant,
    /// Remaining budget granted to the current run segment.
    segment_budget: Duration,
    /// Remainder frozen at the last pause.
    frozen_remaining: Duration,
    paused_at: Option<Instant>,
    time_spent_paused: Duration,
    /// Id of the live run segment; stale coordination tasks carry an older one.
    segment: u64,
    pause_tx: Option<oneshot::Sender<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
    done_tx: Option<oneshot::Sender<Outcome>>,
}

impl Pom {
    /// Creates an idle pom. The receiver resolves exactly once, with the
    /// terminal outcome of the pom's single cycle.
    pub fn new(name: Option<String>, length: Duration) -> (Self, oneshot::Receiver<Outcome>) {
        let (done_tx, done_rx) = oneshot::channel();
        let pom = Self {
            name,
            length,
            state: PomState::Idle,
            started_at: None,
            segment_started: Instant::now(),
            segment_budget: length,
            frozen_remaining: length,
            paused_at: None,
            time_spent_paused: Duration::ZERO,
            segment: 0,
            pause_tx: None,
            stop_tx: None,
            done_tx: Some(done_tx),
        };
        (pom, done_rx)
    }

    /// Begins the run. Refused unless the pom is idle and has never run.
    pub(crate) fn start(&mut self) -> Option<CycleSignals> {
        if self.state != PomState::Idle || self.done_tx.is_none() {
            return None;
        }
        let now = Instant::now();
        self.state = PomState::Running;
        self.started_at = Some(Utc::now());
        self.segment_started = now;
        self.segment_budget = self.length;
        Some(self.arm(now + self.length))
    }

    /// Freezes the running pom and wakes its coordination task.
    pub fn pause(&mut self) -> bool {
        if self.state != PomState::Running {
            return false;
        }
        let now = Instant::now();
        self.frozen_remaining = self
            .segment_budget
            .saturating_sub(now.duration_since(self.segment_started));
        self.paused_at = Some(now);
        self.state = PomState::Paused;
        if let Some(tx) = self.pause_tx.take() {
            let _ = tx.send(());
        }
        true
    }

    /// Reopens a paused pom with the frozen remainder as its new budget.
    pub(crate) fn resume(&mut self) -> Option<CycleSignals> {
        if self.state != PomState::Paused {
            return None;
        }
        let now = Instant::now();
        if let Some(paused_at) = self.paused_at.take() {
            self.time_spent_paused += now.duration_since(paused_at);
        }
        self.state = PomState::Running;
        self.segment_started = now;
        self.segment_budget = self.frozen_remaining;
        Some(self.arm(now + self.frozen_remaining))
    }

    /// Cancels from `Running` or `Paused` and fires the cancelled outcome.
    pub fn stop(&mut self) -> bool {
        if !matches!(self.state, PomState::Running | PomState::Paused) {
            return false;
        }
        self.state = PomState::Idle;
        self.paused_at = None;
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(done) = self.done_tx.take() {
            let _ = done.send(Outcome::Cancelled);
        }
        true
    }

    /// Finalizes the cycle whose deadline elapsed. Wins only while the
    /// segment that armed the deadline is still the live one.
    pub(crate) fn complete(&mut self, segment: u64) -> bool {
        if self.state != PomState::Running || self.segment != segment {
            return false;
        }
        self.state = PomState::Idle;
        if let Some(done) = self.done_tx.take() {
            let _ = done.send(Outcome::Completed);
        }
        true
    }

    fn arm(&mut self, deadline: Instant) -> CycleSignals {
        let (pause_tx, pause_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        self.pause_tx = Some(pause_tx);
        self.stop_tx = Some(stop_tx);
        self.segment = SEGMENT_SEQ.fetch_add(1, Ordering::Relaxed) + 1;
        CycleSignals {
            pause_rx,
            stop_rx,
            deadline,
            segment: self.segment,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn state(&self) -> PomState {
        self.state
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Time until the deadline would fire.
    ///
    /// Never negative: the full length before the first start, the live
    /// remainder while running, the frozen remainder while paused, and
    /// zero once the cycle has ended.
    pub fn time_left(&self) -> Duration {
        match self.state {
            PomState::Running => self
                .segment_budget
                .saturating_sub(Instant::now().duration_since(self.segment_started)),
            PomState::Paused => self.frozen_remaining,
            PomState::Idle => {
                if self.done_tx.is_some() {
                    self.length
                } else {
                    Duration::ZERO
                }
            }
        }
    }

    /// Total time spent paused, including the still-open pause if any.
    pub fn time_spent_paused(&self) -> Duration {
        match self.paused_at {
            Some(paused_at) => self.time_spent_paused + Instant::now().duration_since(paused_at),
            None => self.time_spent_paused,
        }
    }

    /// Builds a snapshot with an empty message for the caller to fill.
    pub fn snapshot(&self) -> PomSnapshot {
        let remaining = self.time_left();
        let finishes_at = match self.state {
            PomState::Running => {
                Some(Utc::now() + chrono::Duration::milliseconds(remaining.as_millis() as i64))
            }
            _ => None,
        };
        PomSnapshot {
            state: self.state,
            name: self.name.clone(),
            started_at: self.started_at,
            finishes_at,
            remaining_ms: remaining.as_millis() as u64,
            paused_ms: self.time_spent_paused().as_millis() as u64,
            message: String::new(),
        }
    }
}
