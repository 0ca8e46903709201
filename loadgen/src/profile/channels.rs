//! The Frodo channel profile: four test channels with fixed weights

use super::types::Task;
use super::weighted::TaskProfile;

/// Profile name shown in logs and reports
pub const CHANNEL_PROFILE_NAME: &str = "FrodoTaskSet";

/// (task name, path, weight)
const CHANNELS: [(&str, &str, u32); 4] = [
    ("ch_1", "/test-channel/1", 2),
    ("ch_2", "/test-channel/2", 1),
    ("ch_3", "/test-channel/3", 4),
    ("ch_4", "/test-channel/4", 1),
];

impl TaskProfile {
    /// The four weighted test channels
    pub fn channels() -> Self {
        let tasks = CHANNELS
            .iter()
            .map(|(name, path, weight)| Task::new(*name, *path, *weight))
            .collect();

        // The constant table is non-empty with unique names and positive weights
        match TaskProfile::new(CHANNEL_PROFILE_NAME, tasks) {
            Ok(profile) => profile,
            Err(e) => unreachable!("channel profile is valid: {}", e),
        }
    }
}
