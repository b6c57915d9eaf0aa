//! Periodic tasks: the runner, timing collection and the concrete stages.

pub mod load;
pub mod runner;
pub mod stages;
pub mod timing;
pub mod ui;

pub use runner::{PeriodicTask, StopToken, TaskDescriptor, TaskVerdict};
pub use timing::{SampleKind, TimingLog, TimingStats};
