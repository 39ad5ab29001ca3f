use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::error;
use rust_decimal::Decimal;

use super::reconciliation_model::{QueueItem, ReconcileOutcome};
use super::reconciliation_traits::ReconciliationServiceTrait;
use crate::tracking::{SalesStatus, TrackingRecord, TrackingRepositoryTrait};
use crate::Result;

/// Merges incoming sale/refund queue items against existing tracking records.
///
/// The read-modify-write pair per item is not atomic against a concurrent
/// upsert to the same id from another caller: last writer wins and no
/// lost-update detection is attempted. Within one batch, items are applied
/// in program order, so a duplicated id resolves to the last item.
pub struct ReconciliationService {
    repository: Arc<dyn TrackingRepositoryTrait>,
}

impl ReconciliationService {
    pub fn new(repository: Arc<dyn TrackingRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Applies one queue item onto an existing record, recomputing the
    /// derived sale fields and refreshing attribution.
    fn merge_item(
        existing: &TrackingRecord,
        item: &QueueItem,
        validator_block: i64,
        validator_hotkey: &str,
    ) -> TrackingRecord {
        let refund_amount = item
            .refund_info
            .as_ref()
            .map(|r| r.total_amount)
            .unwrap_or(Decimal::ZERO);
        // May go negative when a refund outruns the recorded sale; stored as-is.
        let net_sale_amount = item.order_info.total_amount - refund_amount;
        let sales_count = item.order_info.items.len() as i32;
        let refund_count = item
            .refund_info
            .as_ref()
            .map(|r| r.items.len() as i32)
            .unwrap_or(0);

        let mut updated = existing.clone();
        updated.sale_date = Some(item.order_info.sale_date);
        updated.order_info = Some(item.order_info.clone());
        updated.refund_info = item.refund_info.clone();
        updated.validator_block = Some(validator_block);
        updated.validator_hotkey = Some(validator_hotkey.to_string());
        updated.sales_count = sales_count;
        updated.refund_count = refund_count;
        updated.net_sale_amount = net_sale_amount;
        updated.updated_at = Utc::now();
        // A refund is definitive proof the sale existed and is now closed out.
        if refund_count > 0 {
            updated.sales_status = SalesStatus::Completed;
        }
        updated
    }
}

#[async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    async fn reconcile(
        &self,
        validator_block: i64,
        validator_hotkey: &str,
        items: Vec<QueueItem>,
    ) -> Result<HashMap<String, ReconcileOutcome>> {
        let mut result = HashMap::with_capacity(items.len());
        for item in items {
            let existing = match self.repository.get(&item.id) {
                Ok(existing) => existing,
                Err(e) => {
                    error!("Tracking record lookup failed for id {}: {}", item.id, e);
                    result.insert(item.id.clone(), ReconcileOutcome::error());
                    continue;
                }
            };

            let Some(existing) = existing else {
                result.insert(item.id.clone(), ReconcileOutcome::visit_not_found());
                continue;
            };

            let updated = Self::merge_item(&existing, &item, validator_block, validator_hotkey);
            match self.repository.upsert(updated).await {
                Ok(saved) => {
                    result.insert(item.id.clone(), ReconcileOutcome::processed(saved));
                }
                Err(e) => {
                    error!("Tracking record upsert failed for id {}: {}", item.id, e);
                    result.insert(item.id.clone(), ReconcileOutcome::error());
                }
            }
        }
        Ok(result)
    }
}
