use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use super::normalizer;
use super::tracking_model::{
    CompletedVisit, PaginationInfo, RecordPage, TrackingRecord, VisitEvent,
};
use super::tracking_traits::{TrackingRepositoryTrait, TrackingServiceTrait};
use crate::Result;

/// Service for ingesting visits and querying the canonical record store.
pub struct TrackingService {
    repository: Arc<dyn TrackingRepositoryTrait>,
}

impl TrackingService {
    pub fn new(repository: Arc<dyn TrackingRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn page_offset(page_number: i64, page_size: i64) -> i64 {
        (page_number - 1).max(0) * page_size
    }
}

#[async_trait]
impl TrackingServiceTrait for TrackingService {
    async fn add_by_visit(&self, visit: VisitEvent) -> Result<TrackingRecord> {
        let record = normalizer::record_from_visit(&visit, Utc::now());
        self.repository.upsert(record).await
    }

    async fn add_by_visits(&self, visits: Vec<VisitEvent>) -> Result<usize> {
        let ids: HashSet<String> = visits.iter().map(|v| v.id.clone()).collect();
        let existing = self.repository.filter_existing_ids(&ids)?;

        let now = Utc::now();
        let mut written = 0;
        for visit in &visits {
            if existing.contains(&visit.id) {
                continue;
            }
            self.repository
                .upsert(normalizer::record_from_visit(visit, now))
                .await?;
            written += 1;
        }
        debug!(
            "Added {} of {} visits ({} already known)",
            written,
            visits.len(),
            existing.len()
        );
        Ok(written)
    }

    async fn add_completed_visits(&self, visits: Vec<CompletedVisit>) -> Result<usize> {
        let now = Utc::now();
        let mut written = 0;
        for visit in &visits {
            self.repository
                .upsert(normalizer::record_from_completed_visit(visit, now))
                .await?;
            written += 1;
        }
        Ok(written)
    }

    fn get(&self, id: &str) -> Result<Option<TrackingRecord>> {
        self.repository.get(id)
    }

    fn get_between(
        &self,
        updated_from: Option<DateTime<Utc>>,
        updated_to: Option<DateTime<Utc>>,
        page_number: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingRecord>> {
        let offset = Self::page_offset(page_number, page_size);
        self.repository
            .range_by_updated_at(updated_from, updated_to, page_size, offset)
    }

    fn get_between_paged(
        &self,
        updated_from: Option<DateTime<Utc>>,
        updated_to: Option<DateTime<Utc>>,
        page_number: i64,
        page_size: i64,
    ) -> Result<RecordPage> {
        let offset = Self::page_offset(page_number, page_size);
        let (data, total) =
            self.repository
                .range_by_updated_at_paged(updated_from, updated_to, page_size, offset)?;
        Ok(RecordPage {
            data,
            pagination: PaginationInfo::new(total, page_size, page_number),
        })
    }

    fn get_by_campaign_items(
        &self,
        campaign_items: &[String],
        page_number: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingRecord>> {
        let offset = Self::page_offset(page_number, page_size);
        self.repository
            .range_by_campaign_items(campaign_items, page_size, offset)
    }

    fn last_update_excluding(&self, hotkey: &str) -> Result<Option<DateTime<Utc>>> {
        self.repository.max_updated_at_excluding(hotkey)
    }

    async fn complete_pending_sales(
        &self,
        campaign_id: &str,
        sale_to: DateTime<Utc>,
    ) -> Result<usize> {
        debug!(
            "Completing sales for campaign {} with date less than {}",
            campaign_id, sale_to
        );
        self.repository
            .mark_completed_before(campaign_id, sale_to)
            .await
    }
}
