//! Task definitions and profile error types

use thiserror::Error;

/// Errors that can occur when building a task profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Task profile '{0}' has no tasks")]
    Empty(String),

    #[error("Task '{0}' has a zero weight")]
    ZeroWeight(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("Task '{name}' path must start with '/': {path}")]
    InvalidPath { name: String, path: String },

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

/// A single action a simulated client may issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Display name used in statistics
    pub name: String,
    /// Request path, joined onto the target host
    pub path: String,
    /// Relative selection weight
    pub weight: u32,
}

impl Task {
    pub fn new(name: impl Into<String>, path: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            weight,
        }
    }
}
