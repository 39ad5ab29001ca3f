use std::collections::HashMap;

use async_trait::async_trait;

use super::reconciliation_model::{QueueItem, ReconcileOutcome};
use crate::Result;

/// Contract for merging sale/refund queue items into the canonical store.
#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// Processes a batch of queue items sequentially, returning one outcome
    /// per input id. A failing item never aborts the rest of the batch.
    async fn reconcile(
        &self,
        validator_block: i64,
        validator_hotkey: &str,
        items: Vec<QueueItem>,
    ) -> Result<HashMap<String, ReconcileOutcome>>;
}
