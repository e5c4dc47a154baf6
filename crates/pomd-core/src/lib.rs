//! pomd-core: the pom daemon's domain library.
//!
//! Owns the pom state machine, the per-segment coordination task, the
//! append-only outcome store and the orchestration layer the HTTP surface
//! calls into. Binaries stay thin: `pomd-server` wires this crate to the
//! network and `pomd-cli` talks to the resulting API.

pub mod app;
pub mod error;
pub mod events;
pub mod notify;
pub mod outcome;
pub mod storage;
pub mod timer;

pub use app::{App, StatusView, Transition};
pub use error::{ConfigError, CoreError, Result, StoreError};
pub use events::PomEvent;
pub use notify::{dispatch_events, platform_notifier, ConsoleNotifier, Notifier, OsaScriptNotifier};
pub use outcome::{Outcome, OutcomeCounts};
pub use storage::{data_dir, Config, OutcomeStore};
pub use timer::{Pom, PomSnapshot, PomState};
