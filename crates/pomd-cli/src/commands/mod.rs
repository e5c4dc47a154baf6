pub mod stats;
pub mod timer;
