//! Cancellable one-shot tasks for staggered panel spawns and removals
//!
//! Tasks carry the epoch they were scheduled in. Bumping the epoch (question
//! change, restart, teardown) invalidates everything still pending.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelTask {
    Spawn,
    Retire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Scheduled {
    due: f64,
    epoch: u64,
    task: PanelTask,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    /// Scheduler clock (seconds since creation)
    now: f64,
    epoch: u64,
    /// Sorted by due time; ties keep insertion order
    tasks: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Tasks that will still run
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| t.epoch == self.epoch).count()
    }

    pub fn pending_of(&self, task: PanelTask) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.epoch == self.epoch && t.task == task)
            .count()
    }

    pub fn schedule(&mut self, delay: f32, task: PanelTask) {
        let due = self.now + f64::from(delay.max(0.0));
        let at = self.tasks.partition_point(|t| t.due <= due);
        self.tasks.insert(
            at,
            Scheduled {
                due,
                epoch: self.epoch,
                task,
            },
        );
    }

    /// Advance the clock and return the tasks that came due, oldest first
    pub fn advance(&mut self, dt: f32) -> Vec<PanelTask> {
        self.now += f64::from(dt);
        let split = self.tasks.partition_point(|t| t.due <= self.now);
        let epoch = self.epoch;
        self.tasks
            .drain(..split)
            .filter(|t| t.epoch == epoch)
            .map(|t| t.task)
            .collect()
    }

    /// Drop every pending task. Safe to call any number of times.
    pub fn cancel_all(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        log::debug!("Cancelling {} pending panel tasks", self.pending());
        self.epoch += 1;
        self.tasks.clear();
    }
}
