//! Integration tests for the tracking repository against a real SQLite file.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use adledger_core::campaigns::CampaignAggregateTrait;
use adledger_core::tracking::{
    record_from_visit, OrderInfo, OrderLine, SalesStatus, TrackingRecord, TrackingRepositoryTrait,
    VisitEvent,
};
use adledger_storage_sqlite::tracking::TrackingRepository;
use adledger_storage_sqlite::{init, spawn_writer};

fn test_repository(dir: &TempDir) -> TrackingRepository {
    let db_path = dir.path().join("adledger.db");
    let pool = init(db_path.to_str().unwrap()).unwrap();
    let writer = spawn_writer(pool.clone());
    TrackingRepository::new(pool, writer)
}

fn visit(id: &str, campaign_id: &str) -> VisitEvent {
    VisitEvent {
        id: id.to_string(),
        campaign_id: campaign_id.to_string(),
        campaign_item: "item000000001".to_string(),
        ip: "203.0.113.7".to_string(),
        user_agent: Some("Mozilla/5.0".to_string()),
        referer: None,
        device: None,
        country: Some("Germany".to_string()),
        country_code: Some("DE".to_string()),
        miner_hotkey: Some("miner-hk".to_string()),
        miner_block: Some(100),
    }
}

fn visit_record(id: &str, campaign_id: &str) -> TrackingRecord {
    record_from_visit(&visit(id, campaign_id), Utc::now())
}

fn with_sale(
    mut record: TrackingRecord,
    total: rust_decimal::Decimal,
    sales_count: i32,
    refund_count: i32,
    sale_date: DateTime<Utc>,
) -> TrackingRecord {
    record.order_info = Some(OrderInfo {
        total_amount: total,
        sale_date,
        items: (0..sales_count)
            .map(|i| OrderLine {
                id: Some(format!("line-{i}")),
                name: None,
                quantity: 1,
                price: total,
            })
            .collect(),
    });
    record.sale_date = Some(sale_date);
    record.sales_count = sales_count;
    record.refund_count = refund_count;
    record.net_sale_amount = total;
    record.validator_hotkey = Some("validator-hk".to_string());
    record.validator_block = Some(500);
    record
}

#[tokio::test]
async fn test_upsert_inserts_and_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    let saved = repository.upsert(visit_record("v1", "c1")).await.unwrap();
    assert_eq!(saved.id, "v1");
    assert_eq!(saved.sales_status, SalesStatus::None);

    let fetched = repository.get("v1").unwrap().unwrap();
    assert_eq!(fetched.campaign_id, "c1");
    assert_eq!(fetched.ip, "203.0.113.7");
    assert_eq!(fetched.country_code.as_deref(), Some("DE"));
    assert_eq!(fetched.net_sale_amount, dec!(0));
    assert!(fetched.order_info.is_none());

    assert!(repository.get("missing").unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_on_existing_id_does_not_error() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    repository.upsert(visit_record("v1", "c1")).await.unwrap();
    // Same id again: resolved as an overwrite, no constraint error surfaces.
    repository.upsert(visit_record("v1", "c1")).await.unwrap();
}

#[tokio::test]
async fn test_upsert_preserves_origin_fields() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    repository.upsert(visit_record("v1", "c1")).await.unwrap();
    let created = repository.get("v1").unwrap().unwrap();

    let mut update = with_sale(visit_record("v1", "c1"), dec!(70.00), 2, 1, Utc::now());
    update.ip = "198.51.100.1".to_string();
    update.country_code = Some("US".to_string());
    let saved = repository.upsert(update).await.unwrap();

    // Mutable fields moved...
    assert_eq!(saved.net_sale_amount, dec!(70.00));
    assert_eq!(saved.sales_count, 2);
    assert_eq!(saved.validator_hotkey.as_deref(), Some("validator-hk"));
    // ...while origin and creation time survived.
    assert_eq!(saved.ip, "203.0.113.7");
    assert_eq!(saved.country_code.as_deref(), Some("DE"));
    assert_eq!(saved.created_at, created.created_at);
    assert!(saved.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_filter_existing_ids() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    repository.upsert(visit_record("a", "c1")).await.unwrap();
    repository.upsert(visit_record("b", "c1")).await.unwrap();

    let candidates: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let existing = repository.filter_existing_ids(&candidates).unwrap();

    let expected: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    assert_eq!(existing, expected);
}

#[tokio::test]
async fn test_range_by_updated_at_pages_in_order() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    for id in ["a", "b", "c"] {
        repository.upsert(visit_record(id, "c1")).await.unwrap();
    }

    let (all, total) = repository
        .range_by_updated_at_paged(None, None, 500, 0)
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].updated_at <= w[1].updated_at));

    let (page, total) = repository
        .range_by_updated_at_paged(None, None, 2, 2)
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);

    // A from-bound past every write excludes everything.
    let future = Utc::now() + Duration::hours(1);
    let rows = repository
        .range_by_updated_at(Some(future), None, 500, 0)
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_range_by_campaign_items() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    let mut other = visit_record("other", "c2");
    other.campaign_item = "item000000002".to_string();
    repository.upsert(visit_record("v1", "c1")).await.unwrap();
    repository.upsert(other).await.unwrap();

    let rows = repository
        .range_by_campaign_items(&["item000000001".to_string()], 500, 0)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "v1");
}

#[tokio::test]
async fn test_max_updated_at_excludes_own_hotkey() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    let mut own = with_sale(visit_record("own", "c1"), dec!(10), 1, 0, Utc::now());
    own.validator_hotkey = Some("me".to_string());
    repository.upsert(visit_record("other", "c1")).await.unwrap();
    repository.upsert(own).await.unwrap();

    let other = repository.get("other").unwrap().unwrap();
    let watermark = repository.max_updated_at_excluding("me").unwrap().unwrap();
    // The own-authored row wrote later but is excluded; the visit-only row
    // (no validator attribution) still counts.
    assert_eq!(watermark, other.updated_at);

    let empty_dir = TempDir::new().unwrap();
    let empty = test_repository(&empty_dir);
    assert!(empty.max_updated_at_excluding("me").unwrap().is_none());
}

#[tokio::test]
async fn test_mark_completed_before_sweeps_stale_sales() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    let now = Utc::now();
    let stale = with_sale(visit_record("stale", "c1"), dec!(10), 1, 0, now - Duration::days(45));
    let fresh = with_sale(visit_record("fresh", "c1"), dec!(10), 1, 0, now - Duration::days(1));
    let other_campaign = with_sale(
        visit_record("elsewhere", "c2"),
        dec!(10),
        1,
        0,
        now - Duration::days(45),
    );
    repository.upsert(stale).await.unwrap();
    repository.upsert(fresh).await.unwrap();
    repository.upsert(other_campaign).await.unwrap();
    repository.upsert(visit_record("no-sale", "c1")).await.unwrap();

    let transitioned = repository
        .mark_completed_before("c1", now - Duration::days(30))
        .await
        .unwrap();

    assert_eq!(transitioned, 1);
    assert_eq!(
        repository.get("stale").unwrap().unwrap().sales_status,
        SalesStatus::Completed
    );
    assert_eq!(
        repository.get("fresh").unwrap().unwrap().sales_status,
        SalesStatus::None
    );
    assert_eq!(
        repository.get("elsewhere").unwrap().unwrap().sales_status,
        SalesStatus::None
    );
    assert_eq!(
        repository.get("no-sale").unwrap().unwrap().sales_status,
        SalesStatus::None
    );
}

#[tokio::test]
async fn test_campaign_aggregates_over_trailing_window() {
    let dir = TempDir::new().unwrap();
    let repository = test_repository(&dir);

    let now = Utc::now();
    repository
        .upsert(with_sale(visit_record("s1", "c1"), dec!(100), 2, 0, now - Duration::days(2)))
        .await
        .unwrap();
    repository
        .upsert(with_sale(visit_record("s2", "c1"), dec!(50), 1, 1, now - Duration::days(3)))
        .await
        .unwrap();
    // Outside the 30-day window.
    repository
        .upsert(with_sale(visit_record("old", "c1"), dec!(999), 1, 0, now - Duration::days(90)))
        .await
        .unwrap();
    // Different campaign.
    repository
        .upsert(with_sale(visit_record("s3", "c2"), dec!(25), 1, 0, now - Duration::days(1)))
        .await
        .unwrap();
    // Visit with no sale: counts toward visits only.
    repository.upsert(visit_record("v1", "c1")).await.unwrap();

    let window = Duration::days(30);

    let sales = repository.campaign_sales("c1", window).await.unwrap();
    assert_eq!(sales.count, 2);
    assert_eq!(sales.total_amount, dec!(150));

    let visits = repository.campaign_visits("c1", window).await.unwrap();
    assert_eq!(visits, 4);

    let refunds = repository.campaign_refunds("c1", window).await.unwrap();
    assert_eq!(refunds, 1);

    let summary = repository.sales_summary(window).await.unwrap();
    assert_eq!(summary.count, 3);
    assert_eq!(summary.total_amount, dec!(175));

    let refund_total = repository.refunds_summary(window).await.unwrap();
    assert_eq!(refund_total, 1);
}
