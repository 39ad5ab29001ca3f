//! Reconciliation domain models.

use serde::{Deserialize, Serialize};

use crate::tracking::{OrderInfo, RefundInfo, TrackingRecord};

/// Per-item outcome of a reconciliation batch.
///
/// `VisitNotFound` covers both propagation lag (the visit has not arrived
/// yet) and ids that never existed; the submitter retries later for the
/// lag case. `Error` means the store rejected the write for this item only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueItemStatus {
    VisitNotFound,
    Processed,
    Error,
}

/// An incoming sale-or-refund update referencing an existing record by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    pub order_info: OrderInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_info: Option<RefundInfo>,
}

/// Result for one queue item: its status and, when processed, the merged record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub status: QueueItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<TrackingRecord>,
}

impl ReconcileOutcome {
    pub fn visit_not_found() -> Self {
        Self {
            status: QueueItemStatus::VisitNotFound,
            record: None,
        }
    }

    pub fn processed(record: TrackingRecord) -> Self {
        Self {
            status: QueueItemStatus::Processed,
            record: Some(record),
        }
    }

    pub fn error() -> Self {
        Self {
            status: QueueItemStatus::Error,
            record: None,
        }
    }
}
