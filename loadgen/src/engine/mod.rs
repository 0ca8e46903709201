//! Load-generation engine
//!
//! Spawns simulated clients at a configured rate. Each client repeatedly
//! picks a task from the shared `TaskProfile` by weight, executes it and
//! reports the outcome over a channel to a single collector task.
//!
//! A run ends when any of these happens:
//! - the run time elapses
//! - the iteration budget (total selections) is spent
//! - the shutdown signal fires (Ctrl+C in the binary)

mod runner;
mod settings;
pub mod stats;
mod user;

pub use runner::{Engine, wait_for_stop};
pub use settings::{EngineSettings, WaitTime};
pub use stats::{LatencyStats, RequestStats, RunStats};
pub use user::IterationBudget;
