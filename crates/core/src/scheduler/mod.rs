//! Scheduler module - the periodic task orchestrator and its sweeps.

mod orchestrator;
mod scheduler_constants;
mod tasks;


pub use orchestrator::{PeriodicTask, TaskOrchestrator};
pub use scheduler_constants::*;
pub use tasks::{
    BackfillCompletedVisitsTask, CampaignRefreshTask, CompleteStaleSalesTask,
    PerformanceReportTask,
};
