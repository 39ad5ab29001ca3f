use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error};

use crate::Result;

/// A unit of periodic work driven by the orchestrator's tick.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    fn name(&self) -> &str;

    /// Minimum time between two executions of this task.
    fn interval(&self) -> Duration;

    async fn run(&self, now: DateTime<Utc>) -> Result<()>;
}

struct TaskSlot {
    task: Arc<dyn PeriodicTask>,
    last_run: Option<DateTime<Utc>>,
}

/// Drives a fixed set of independently-intervaled tasks from one sequential
/// driver.
///
/// Tasks execute strictly in registration order within one tick; a slow task
/// delays the rest of the tick but never overlaps it. Each task gates on its
/// own elapsed interval, and its last-run timestamp advances whether the run
/// succeeds or fails. A failure is logged and never reaches sibling tasks.
pub struct TaskOrchestrator {
    slots: Vec<TaskSlot>,
}

impl TaskOrchestrator {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn register(&mut self, task: Arc<dyn PeriodicTask>) {
        self.slots.push(TaskSlot {
            task,
            last_run: None,
        });
    }

    pub async fn tick(&mut self, now: DateTime<Utc>) {
        for slot in &mut self.slots {
            let due = match slot.last_run {
                None => true,
                Some(last_run) => now - last_run >= slot.task.interval(),
            };
            if !due {
                continue;
            }

            slot.last_run = Some(now);
            debug!("Start task {}", slot.task.name());
            if let Err(e) = slot.task.run(now).await {
                error!("Task {} failed: {}", slot.task.name(), e);
            }
            debug!("End task {}", slot.task.name());
        }
    }
}

impl Default for TaskOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
