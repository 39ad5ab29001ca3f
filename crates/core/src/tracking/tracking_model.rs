//! Tracking domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sales lifecycle status of a tracking record.
///
/// A record starts at `None` when the visit is created and moves to
/// `Completed` when a sale is reconciled against it. A refund re-affirms
/// `Completed`; it never reverts the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesStatus {
    #[default]
    None,
    Completed,
}

impl SalesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesStatus::None => "NONE",
            SalesStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "COMPLETED" => SalesStatus::Completed,
            _ => SalesStatus::None,
        }
    }
}

/// Coarse device class derived from the visitor's user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "MOBILE",
            DeviceType::Tablet => "TABLET",
            DeviceType::Desktop => "DESKTOP",
        }
    }

    pub fn from_str_lossy(value: &str) -> Option<Self> {
        match value {
            "MOBILE" => Some(DeviceType::Mobile),
            "TABLET" => Some(DeviceType::Tablet),
            "DESKTOP" => Some(DeviceType::Desktop),
            _ => None,
        }
    }
}

/// One line item of an order or refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

/// Sale details attached to a tracking record by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

/// Refund details attached to a tracking record by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundInfo {
    pub total_amount: Decimal,
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

/// Canonical record for one tracked event.
///
/// Exactly one record exists per id. The record is created only by a visit
/// (or a completed-visit backfill); sale and refund queue items can only
/// mutate an existing record. Origin fields are set once at visit time and
/// are preserved by every subsequent write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    // Identity
    pub id: String,
    pub campaign_id: String,
    pub campaign_item: String,

    // Origin - immutable after visit creation
    pub ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device: Option<DeviceType>,
    pub country: Option<String>,
    pub country_code: Option<String>,

    // Attribution - updated on every accepted reconciliation
    pub miner_hotkey: Option<String>,
    pub miner_block: Option<i64>,
    pub validator_hotkey: Option<String>,
    pub validator_block: Option<i64>,

    // Sales state
    pub sales_status: SalesStatus,
    pub sale_date: Option<DateTime<Utc>>,
    pub order_info: Option<OrderInfo>,
    pub refund_info: Option<RefundInfo>,

    // Derived - recomputed on every reconciliation
    pub sales_count: i32,
    pub refund_count: i32,
    pub net_sale_amount: Decimal,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackingRecord {
    /// Whether a sale has been recorded against this record.
    pub fn has_sale(&self) -> bool {
        self.sales_count > 0
    }

    /// Whether a refund has been recorded against this record.
    pub fn has_refund(&self) -> bool {
        self.refund_count > 0
    }
}

/// A visit impression delivered by the tracking front door.
///
/// Ids are assigned by the source at visit time and must be globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEvent {
    pub id: String,
    pub campaign_id: String,
    pub campaign_item: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device: Option<DeviceType>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub miner_hotkey: Option<String>,
    pub miner_block: Option<i64>,
}

impl VisitEvent {
    /// Mints a new visit id the way the front door does.
    pub fn assign_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// An already-closed event imported in bulk, bypassing reconciliation.
///
/// Used to backfill historical data; normalizes straight to a `COMPLETED`
/// tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedVisit {
    pub id: String,
    pub campaign_id: String,
    pub campaign_item: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device: Option<DeviceType>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub miner_hotkey: Option<String>,
    pub miner_block: Option<i64>,
    pub validator_hotkey: Option<String>,
    pub validator_block: Option<i64>,
    pub sale_date: Option<DateTime<Utc>>,
    pub sale_amount: Decimal,
    pub sales_count: i32,
    pub refund_count: i32,
}

/// Page metadata returned alongside range queries.
///
/// `next_page_number` is always `page_number + 1`; callers check `total`
/// to decide whether another page exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total: i64,
    pub page_size: i64,
    pub page_number: i64,
    pub next_page_number: i64,
}

impl PaginationInfo {
    pub fn new(total: i64, page_size: i64, page_number: i64) -> Self {
        Self {
            total,
            page_size,
            page_number,
            next_page_number: page_number + 1,
        }
    }
}

/// One page of tracking records with pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub data: Vec<TrackingRecord>,
    pub pagination: PaginationInfo,
}
