//! Database models for tracking records.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use adledger_core::tracking::{
    DeviceType, OrderInfo, RefundInfo, SalesStatus, TrackingRecord,
};

/// Uniform fixed-width UTC rendering so lexicographic comparison on the text
/// column matches chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str, field_name: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::error!("Failed to parse {} '{}': {}", field_name, value, e);
            Utc::now()
        })
}

/// Parses a stored decimal string, with a fallback for scientific notation.
pub(crate) fn parse_decimal_tolerant(value: &str, field_name: &str) -> Decimal {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .unwrap_or_else(|e| {
            log::error!(
                "Failed to parse {} '{}': {}. Falling back to ZERO.",
                field_name,
                value,
                e
            );
            Decimal::ZERO
        })
}

fn parse_json_blob<T: serde::de::DeserializeOwned>(
    value: &Option<String>,
    field_name: &str,
) -> Option<T> {
    value.as_deref().and_then(|s| {
        serde_json::from_str(s)
            .map_err(|e| log::error!("Failed to parse {} blob: {}", field_name, e))
            .ok()
    })
}

fn to_json_blob<T: Serialize>(value: &Option<T>, field_name: &str) -> Option<String> {
    value.as_ref().and_then(|v| {
        serde_json::to_string(v)
            .map_err(|e| log::error!("Failed to serialize {}: {}", field_name, e))
            .ok()
    })
}

/// Database model for tracking records.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::tracking_records)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TrackingRecordDB {
    pub id: String,
    pub campaign_id: String,
    pub campaign_item: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub miner_hotkey: Option<String>,
    pub miner_block: Option<i64>,
    pub validator_hotkey: Option<String>,
    pub validator_block: Option<i64>,
    pub sales_status: String,
    pub sale_date: Option<String>,
    pub order_info: Option<String>,
    pub refund_info: Option<String>,
    pub sales_count: i32,
    pub refund_count: i32,
    pub net_sale_amount: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TrackingRecordDB {
    /// Carries over the fields set once at visit time: identity of the
    /// placement, request origin, and the creation timestamp.
    pub(crate) fn preserve_origin(&mut self, prev: &TrackingRecordDB) {
        self.campaign_id = prev.campaign_id.clone();
        self.campaign_item = prev.campaign_item.clone();
        self.ip = prev.ip.clone();
        self.user_agent = prev.user_agent.clone();
        self.referer = prev.referer.clone();
        self.device = prev.device.clone();
        self.country = prev.country.clone();
        self.country_code = prev.country_code.clone();
        self.created_at = prev.created_at.clone();
    }
}

impl From<TrackingRecordDB> for TrackingRecord {
    fn from(db: TrackingRecordDB) -> Self {
        let order_info: Option<OrderInfo> = parse_json_blob(&db.order_info, "order_info");
        let refund_info: Option<RefundInfo> = parse_json_blob(&db.refund_info, "refund_info");

        Self {
            id: db.id,
            campaign_id: db.campaign_id,
            campaign_item: db.campaign_item,
            ip: db.ip,
            user_agent: db.user_agent,
            referer: db.referer,
            device: db.device.as_deref().and_then(DeviceType::from_str_lossy),
            country: db.country,
            country_code: db.country_code,
            miner_hotkey: db.miner_hotkey,
            miner_block: db.miner_block,
            validator_hotkey: db.validator_hotkey,
            validator_block: db.validator_block,
            sales_status: SalesStatus::from_str_lossy(&db.sales_status),
            sale_date: db
                .sale_date
                .as_deref()
                .map(|s| parse_timestamp(s, "sale_date")),
            order_info,
            refund_info,
            sales_count: db.sales_count,
            refund_count: db.refund_count,
            net_sale_amount: parse_decimal_tolerant(&db.net_sale_amount, "net_sale_amount"),
            created_at: parse_timestamp(&db.created_at, "created_at"),
            updated_at: parse_timestamp(&db.updated_at, "updated_at"),
        }
    }
}

impl From<&TrackingRecord> for TrackingRecordDB {
    fn from(record: &TrackingRecord) -> Self {
        Self {
            id: record.id.clone(),
            campaign_id: record.campaign_id.clone(),
            campaign_item: record.campaign_item.clone(),
            ip: record.ip.clone(),
            user_agent: record.user_agent.clone(),
            referer: record.referer.clone(),
            device: record.device.map(|d| d.as_str().to_string()),
            country: record.country.clone(),
            country_code: record.country_code.clone(),
            miner_hotkey: record.miner_hotkey.clone(),
            miner_block: record.miner_block,
            validator_hotkey: record.validator_hotkey.clone(),
            validator_block: record.validator_block,
            sales_status: record.sales_status.as_str().to_string(),
            sale_date: record.sale_date.as_ref().map(format_timestamp),
            order_info: to_json_blob(&record.order_info, "order_info"),
            refund_info: to_json_blob(&record.refund_info, "refund_info"),
            sales_count: record.sales_count,
            refund_count: record.refund_count,
            net_sale_amount: record.net_sale_amount.to_string(),
            created_at: format_timestamp(&record.created_at),
            updated_at: format_timestamp(&record.updated_at),
        }
    }
}
