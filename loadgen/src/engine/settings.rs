//! Engine settings

use std::time::Duration;

use rand::Rng;

/// Pause between two tasks of the same simulated client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    pub min: Duration,
    pub max: Duration,
}

impl WaitTime {
    pub fn fixed(wait: Duration) -> Self {
        Self {
            min: wait,
            max: wait,
        }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Uniform random pause in `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(1000))
    }
}

/// How the engine drives simulated clients
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Number of simulated clients to spawn
    pub users: usize,
    /// Simulated clients started per second
    pub spawn_rate: f64,
    /// Stop after this long (`None` = until interrupted or out of iterations)
    pub run_time: Option<Duration>,
    /// Total task selections across all clients (`None` = unlimited)
    pub iterations: Option<u64>,
    /// Pause after each task
    pub wait: WaitTime,
    /// Seed for reproducible task selection
    pub seed: Option<u64>,
    /// How often progress is logged
    pub report_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            users: 1,
            spawn_rate: 1.0,
            run_time: None,
            iterations: None,
            wait: WaitTime::default(),
            seed: None,
            report_interval: Duration::from_secs(5),
        }
    }
}
