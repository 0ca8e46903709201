//! Simulated client loop

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{mpsc, watch};

use super::runner::wait_for_stop;
use super::settings::WaitTime;
use crate::profile::{TaskOutcome, TaskProfile};
use crate::transport::Transport;

/// Events sent from simulated clients to the collector
#[derive(Debug)]
pub enum UserEvent {
    Spawned { user: usize },
    Request(TaskOutcome),
    Finished { user: usize },
}

/// Total number of task selections left across all clients
#[derive(Debug)]
pub struct IterationBudget {
    remaining: Option<AtomicU64>,
}

impl IterationBudget {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            remaining: limit.map(AtomicU64::new),
        }
    }

    /// Take one iteration; false once the budget is spent
    pub fn try_acquire(&self) -> bool {
        match &self.remaining {
            None => true,
            Some(remaining) => remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining
            .as_ref()
            .map(|r| r.load(Ordering::SeqCst) == 0)
            .unwrap_or(false)
    }
}

/// One virtual user: select, execute, report, wait, repeat
pub(crate) struct SimulatedUser {
    pub id: usize,
    pub profile: Arc<TaskProfile>,
    pub transport: Arc<dyn Transport>,
    pub budget: Arc<IterationBudget>,
    pub wait: WaitTime,
    pub rng: ChaCha8Rng,
    pub events: mpsc::Sender<UserEvent>,
    pub stop: watch::Receiver<bool>,
}

impl SimulatedUser {
    /// Per-client RNG: derived from the run seed when one is set
    pub fn rng_for(id: usize, seed: Option<u64>) -> ChaCha8Rng {
        match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    pub async fn run(mut self) {
        let _ = self.events.send(UserEvent::Spawned { user: self.id }).await;

        loop {
            if *self.stop.borrow() || !self.budget.try_acquire() {
                break;
            }

            let task = self.profile.select(&mut self.rng);
            let Some(outcome) = task.execute(self.transport.as_ref(), &mut self.stop).await else {
                break;
            };
            if self.events.send(UserEvent::Request(outcome)).await.is_err() {
                break;
            }

            let pause = self.wait.sample(&mut self.rng);
            if pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = wait_for_stop(&mut self.stop) => {}
                }
            }
        }

        let _ = self.events.send(UserEvent::Finished { user: self.id }).await;
    }
}
