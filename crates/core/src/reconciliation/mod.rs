//! Reconciliation module - merges sale/refund queue items into the store.

mod reconciliation_model;
mod reconciliation_service;
mod reconciliation_traits;


pub use reconciliation_model::{QueueItem, QueueItemStatus, ReconcileOutcome};
pub use reconciliation_service::ReconciliationService;
pub use reconciliation_traits::ReconciliationServiceTrait;
