//! Task profile module
//!
//! This module provides:
//! - `Task`, a named GET with a relative weight
//! - `TaskProfile`, the weighted menu simulated clients pick from
//! - `TaskProfile::channels()`, the four Frodo test channels
//! - `TaskOutcome`, what executing a task reports

mod channels;
mod outcome;
mod types;
mod weighted;

pub use channels::CHANNEL_PROFILE_NAME;
pub use outcome::{Observed, TaskOutcome};
pub use types::{ProfileError, Task};
pub use weighted::TaskProfile;
