use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::tracking_model::{CompletedVisit, RecordPage, TrackingRecord, VisitEvent};
use crate::Result;

/// Contract for the canonical record store.
///
/// This is a narrow persistence contract with no business logic. `upsert`
/// is the sole mutation path: it inserts when the id is unknown and
/// otherwise overwrites mutable fields while preserving the existing row's
/// origin fields. It never surfaces a duplicate-key error to the caller.
#[async_trait]
pub trait TrackingRepositoryTrait: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<TrackingRecord>>;

    /// Returns the subset of `ids` already present in the store.
    fn filter_existing_ids(&self, ids: &HashSet<String>) -> Result<HashSet<String>>;

    /// Records ordered by `updated_at` ascending within the given bounds.
    fn range_by_updated_at(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrackingRecord>>;

    /// Same as [`range_by_updated_at`](Self::range_by_updated_at) plus the
    /// total row count for page metadata.
    fn range_by_updated_at_paged(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<TrackingRecord>, i64)>;

    fn range_by_campaign_items(
        &self,
        items: &[String],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrackingRecord>>;

    /// Watermark used for incremental sync: the newest `updated_at` among
    /// rows NOT last authored by `hotkey`. Rows with no validator attribution
    /// count toward the watermark.
    fn max_updated_at_excluding(&self, hotkey: &str) -> Result<Option<DateTime<Utc>>>;

    async fn upsert(&self, record: TrackingRecord) -> Result<TrackingRecord>;

    /// Bulk-completes the campaign's sale-pending rows whose sale date is
    /// older than `sale_cutoff`. Returns the number of rows transitioned.
    async fn mark_completed_before(
        &self,
        campaign_id: &str,
        sale_cutoff: DateTime<Utc>,
    ) -> Result<usize>;
}

/// Contract for tracking-record ingestion and range queries.
#[async_trait]
pub trait TrackingServiceTrait: Send + Sync {
    async fn add_by_visit(&self, visit: VisitEvent) -> Result<TrackingRecord>;

    /// Inserts only the visits whose ids are not yet known to the store.
    /// Returns the number of newly written records.
    async fn add_by_visits(&self, visits: Vec<VisitEvent>) -> Result<usize>;

    /// Backfills already-closed events as `COMPLETED` records.
    async fn add_completed_visits(&self, visits: Vec<CompletedVisit>) -> Result<usize>;

    fn get(&self, id: &str) -> Result<Option<TrackingRecord>>;

    fn get_between(
        &self,
        updated_from: Option<DateTime<Utc>>,
        updated_to: Option<DateTime<Utc>>,
        page_number: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingRecord>>;

    fn get_between_paged(
        &self,
        updated_from: Option<DateTime<Utc>>,
        updated_to: Option<DateTime<Utc>>,
        page_number: i64,
        page_size: i64,
    ) -> Result<RecordPage>;

    fn get_by_campaign_items(
        &self,
        campaign_items: &[String],
        page_number: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingRecord>>;

    fn last_update_excluding(&self, hotkey: &str) -> Result<Option<DateTime<Utc>>>;

    async fn complete_pending_sales(
        &self,
        campaign_id: &str,
        sale_to: DateTime<Utc>,
    ) -> Result<usize>;
}

/// Source of completed visits for the backfill sweep.
///
/// Implemented by the legacy-data collaborator; the core only drains it.
#[async_trait]
pub trait CompletedVisitSource: Send + Sync {
    async fn completed_visits_since(&self, from: DateTime<Utc>) -> Result<Vec<CompletedVisit>>;
}
