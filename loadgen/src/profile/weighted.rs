//! Weighted task selection

use std::collections::HashSet;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::types::{ProfileError, Task};

/// Static menu of tasks and their relative frequencies
///
/// Built once at startup and shared read-only by every simulated client.
#[derive(Debug, Clone)]
pub struct TaskProfile {
    name: String,
    tasks: Vec<Task>,
    index: WeightedIndex<u32>,
    total_weight: u64,
}

impl TaskProfile {
    /// Build a profile, validating names, paths and weights
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Result<Self, ProfileError> {
        let name = name.into();
        if tasks.is_empty() {
            return Err(ProfileError::Empty(name));
        }

        let mut seen = HashSet::new();
        for task in &tasks {
            if task.weight == 0 {
                return Err(ProfileError::ZeroWeight(task.name.clone()));
            }
            if !task.path.starts_with('/') {
                return Err(ProfileError::InvalidPath {
                    name: task.name.clone(),
                    path: task.path.clone(),
                });
            }
            if !seen.insert(task.name.as_str()) {
                return Err(ProfileError::DuplicateTask(task.name.clone()));
            }
        }

        let index = WeightedIndex::new(tasks.iter().map(|t| t.weight))
            .map_err(|e| ProfileError::InvalidWeights(e.to_string()))?;
        let total_weight = tasks.iter().map(|t| t.weight as u64).sum();

        Ok(Self {
            name,
            tasks,
            index,
            total_weight,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Pick one task at random, proportionally to its weight
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> &Task {
        &self.tasks[self.index.sample(rng)]
    }

    /// Expected fraction of selections that land on `name`
    pub fn share(&self, name: &str) -> Option<f64> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.weight as f64 / self.total_weight as f64)
    }
}
