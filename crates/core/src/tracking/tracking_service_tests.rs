//! Tests for the tracking service over an in-memory repository.

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal_macros::dec;

    use crate::tracking::{
        record_from_visit, CompletedVisit, SalesStatus, TrackingRecord, TrackingRepositoryTrait,
        TrackingService, TrackingServiceTrait, VisitEvent, DEFAULT_PAGE_SIZE,
    };
    use crate::Result;

    // --- Mock repository ---

    #[derive(Default)]
    struct MockTrackingRepository {
        records: Mutex<HashMap<String, TrackingRecord>>,
        range_calls: Mutex<Vec<(i64, i64)>>, // (limit, offset)
    }

    impl MockTrackingRepository {
        fn with_record(self, record: TrackingRecord) -> Self {
            self.records
                .lock()
                .unwrap()
                .insert(record.id.clone(), record);
            self
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn get_cloned(&self, id: &str) -> Option<TrackingRecord> {
            self.records.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl TrackingRepositoryTrait for MockTrackingRepository {
        fn get(&self, id: &str) -> Result<Option<TrackingRecord>> {
            Ok(self.records.lock().unwrap().get(id).cloned())
        }

        fn filter_existing_ids(&self, ids: &HashSet<String>) -> Result<HashSet<String>> {
            let records = self.records.lock().unwrap();
            Ok(ids.iter().filter(|id| records.contains_key(*id)).cloned().collect())
        }

        fn range_by_updated_at(
            &self,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
            limit: i64,
            offset: i64,
        ) -> Result<Vec<TrackingRecord>> {
            self.range_calls.lock().unwrap().push((limit, offset));
            let mut rows: Vec<TrackingRecord> = self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| from.map_or(true, |f| r.updated_at >= f))
                .filter(|r| to.map_or(true, |t| r.updated_at <= t))
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.updated_at);
            Ok(rows
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        fn range_by_updated_at_paged(
            &self,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
            limit: i64,
            offset: i64,
        ) -> Result<(Vec<TrackingRecord>, i64)> {
            let total = self.records.lock().unwrap().len() as i64;
            let data = self.range_by_updated_at(from, to, limit, offset)?;
            Ok((data, total))
        }

        fn range_by_campaign_items(
            &self,
            items: &[String],
            limit: i64,
            offset: i64,
        ) -> Result<Vec<TrackingRecord>> {
            let rows: Vec<TrackingRecord> = self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| items.contains(&r.campaign_item))
                .cloned()
                .collect();
            Ok(rows
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        fn max_updated_at_excluding(&self, hotkey: &str) -> Result<Option<DateTime<Utc>>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.validator_hotkey.as_deref() != Some(hotkey))
                .map(|r| r.updated_at)
                .max())
        }

        async fn upsert(&self, record: TrackingRecord) -> Result<TrackingRecord> {
            let mut records = self.records.lock().unwrap();
            let stored = match records.get(&record.id) {
                Some(prev) => {
                    let mut merged = record;
                    merged.ip = prev.ip.clone();
                    merged.user_agent = prev.user_agent.clone();
                    merged.referer = prev.referer.clone();
                    merged.device = prev.device;
                    merged.country = prev.country.clone();
                    merged.country_code = prev.country_code.clone();
                    merged.created_at = prev.created_at;
                    merged
                }
                None => record,
            };
            records.insert(stored.id.clone(), stored.clone());
            Ok(stored)
        }

        async fn mark_completed_before(
            &self,
            campaign_id: &str,
            sale_cutoff: DateTime<Utc>,
        ) -> Result<usize> {
            let mut records = self.records.lock().unwrap();
            let mut transitioned = 0;
            for record in records.values_mut() {
                if record.campaign_id == campaign_id
                    && record.sales_status != SalesStatus::Completed
                    && record.sale_date.is_some_and(|d| d < sale_cutoff)
                {
                    record.sales_status = SalesStatus::Completed;
                    transitioned += 1;
                }
            }
            Ok(transitioned)
        }
    }

    fn visit(id: &str) -> VisitEvent {
        VisitEvent {
            id: id.to_string(),
            campaign_id: "campaign-1".to_string(),
            campaign_item: "item000000001".to_string(),
            ip: "203.0.113.7".to_string(),
            user_agent: None,
            referer: None,
            device: None,
            country: None,
            country_code: None,
            miner_hotkey: Some("miner-hk".to_string()),
            miner_block: Some(100),
        }
    }

    // ==================== Bulk visit ingestion ====================

    #[tokio::test]
    async fn test_add_by_visits_skips_existing_ids() {
        let existing = record_from_visit(&visit("known"), Utc::now());
        let original_ip = existing.ip.clone();
        let repository =
            Arc::new(MockTrackingRepository::default().with_record(existing));
        let service = TrackingService::new(repository.clone());

        let mut duplicate = visit("known");
        duplicate.ip = "198.51.100.1".to_string();
        let written = service
            .add_by_visits(vec![duplicate, visit("new-1"), visit("new-2")])
            .await
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(repository.len(), 3);
        // The pre-existing record was left untouched.
        assert_eq!(repository.get_cloned("known").unwrap().ip, original_ip);
    }

    #[tokio::test]
    async fn test_add_by_visit_creates_pending_record() {
        let repository = Arc::new(MockTrackingRepository::default());
        let service = TrackingService::new(repository.clone());

        let record = service.add_by_visit(visit("v1")).await.unwrap();
        assert_eq!(record.sales_status, SalesStatus::None);
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test]
    async fn test_add_completed_visits_lands_completed() {
        let repository = Arc::new(MockTrackingRepository::default());
        let service = TrackingService::new(repository.clone());

        let completed = CompletedVisit {
            id: "backfill-1".to_string(),
            campaign_id: "campaign-1".to_string(),
            campaign_item: "item000000001".to_string(),
            ip: "203.0.113.7".to_string(),
            user_agent: None,
            referer: None,
            device: None,
            country: None,
            country_code: None,
            miner_hotkey: None,
            miner_block: None,
            validator_hotkey: Some("validator-hk".to_string()),
            validator_block: Some(900),
            sale_date: Some(Utc::now()),
            sale_amount: dec!(45),
            sales_count: 1,
            refund_count: 0,
        };
        let written = service.add_completed_visits(vec![completed]).await.unwrap();

        assert_eq!(written, 1);
        let record = repository.get_cloned("backfill-1").unwrap();
        assert_eq!(record.sales_status, SalesStatus::Completed);
        assert_eq!(record.net_sale_amount, dec!(45));
    }

    // ==================== Pagination arithmetic ====================

    #[tokio::test]
    async fn test_page_three_requests_offset_one_thousand() {
        let repository = Arc::new(MockTrackingRepository::default());
        let service = TrackingService::new(repository.clone());

        service.get_between(None, None, 3, DEFAULT_PAGE_SIZE).unwrap();

        let calls = repository.range_calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(500, 1000)]);
    }

    #[tokio::test]
    async fn test_get_between_paged_metadata() {
        let repository = Arc::new(MockTrackingRepository::default());
        let service = TrackingService::new(repository);

        let page = service.get_between_paged(None, None, 2, 500).unwrap();
        assert_eq!(page.pagination.page_number, 2);
        assert_eq!(page.pagination.page_size, 500);
        // Unconditional, even though the store is empty.
        assert_eq!(page.pagination.next_page_number, 3);
    }

    #[tokio::test]
    async fn test_get_by_campaign_items_filters_and_pages() {
        let now = Utc::now();
        let mut other = record_from_visit(&visit("other"), now);
        other.campaign_item = "item000000002".to_string();
        let repository = Arc::new(
            MockTrackingRepository::default()
                .with_record(record_from_visit(&visit("v1"), now))
                .with_record(other),
        );
        let service = TrackingService::new(repository);

        let rows = service
            .get_by_campaign_items(&["item000000001".to_string()], 1, 500)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "v1");
        assert_eq!(service.get("v1").unwrap().unwrap().id, "v1");
    }

    // ==================== Watermark and completion sweep ====================

    #[tokio::test]
    async fn test_last_update_excludes_own_hotkey() {
        let now = Utc::now();
        let mut own = record_from_visit(&visit("own"), now);
        own.validator_hotkey = Some("me".to_string());
        let mut other = record_from_visit(&visit("other"), now - Duration::hours(1));
        other.validator_hotkey = Some("peer".to_string());

        let repository = Arc::new(
            MockTrackingRepository::default()
                .with_record(own)
                .with_record(other),
        );
        let service = TrackingService::new(repository);

        let watermark = service.last_update_excluding("me").unwrap();
        assert_eq!(watermark, Some(now - Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_complete_pending_sales_respects_cutoff() {
        let now = Utc::now();
        let mut stale = record_from_visit(&visit("stale"), now);
        stale.sale_date = Some(now - Duration::days(45));
        let mut fresh = record_from_visit(&visit("fresh"), now);
        fresh.sale_date = Some(now - Duration::days(1));
        let no_sale = record_from_visit(&visit("no-sale"), now);

        let repository = Arc::new(
            MockTrackingRepository::default()
                .with_record(stale)
                .with_record(fresh)
                .with_record(no_sale),
        );
        let service = TrackingService::new(repository.clone());

        let transitioned = service
            .complete_pending_sales("campaign-1", now - Duration::days(30))
            .await
            .unwrap();

        assert_eq!(transitioned, 1);
        assert_eq!(
            repository.get_cloned("stale").unwrap().sales_status,
            SalesStatus::Completed
        );
        assert_eq!(
            repository.get_cloned("fresh").unwrap().sales_status,
            SalesStatus::None
        );
        assert_eq!(
            repository.get_cloned("no-sale").unwrap().sales_status,
            SalesStatus::None
        );
    }
}
