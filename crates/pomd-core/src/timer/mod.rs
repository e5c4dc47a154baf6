mod cycle;
mod pom;

pub use pom::{Pom, PomSnapshot, PomState};

pub(crate) use cycle::{run_cycle, PomSlot};
