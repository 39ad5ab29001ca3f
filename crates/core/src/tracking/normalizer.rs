//! Normalizes inbound event shapes into the canonical tracking record.
//!
//! Pure data transformation - no I/O and no branching on business state.
//! Both the ingestion path and the reconciler call through here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::tracking_model::{
    CompletedVisit, DeviceType, SalesStatus, TrackingRecord, VisitEvent,
};

/// Builds a fresh tracking record from a visit impression.
///
/// The record starts with `sales_status = NONE` and empty sale/refund state;
/// origin fields are populated from the inbound request context.
pub fn record_from_visit(visit: &VisitEvent, now: DateTime<Utc>) -> TrackingRecord {
    TrackingRecord {
        id: visit.id.clone(),
        campaign_id: visit.campaign_id.clone(),
        campaign_item: visit.campaign_item.clone(),
        ip: visit.ip.clone(),
        user_agent: visit.user_agent.clone(),
        referer: visit.referer.clone(),
        device: visit.device,
        country: visit.country.clone(),
        country_code: visit.country_code.clone(),
        miner_hotkey: visit.miner_hotkey.clone(),
        miner_block: visit.miner_block,
        validator_hotkey: None,
        validator_block: None,
        sales_status: SalesStatus::None,
        sale_date: None,
        order_info: None,
        refund_info: None,
        sales_count: 0,
        refund_count: 0,
        net_sale_amount: Decimal::ZERO,
        created_at: now,
        updated_at: now,
    }
}

/// Builds a tracking record from a bulk completed-visit import.
///
/// The record lands directly in `COMPLETED` state with its sale totals,
/// skipping the reconciliation round-trip.
pub fn record_from_completed_visit(visit: &CompletedVisit, now: DateTime<Utc>) -> TrackingRecord {
    TrackingRecord {
        id: visit.id.clone(),
        campaign_id: visit.campaign_id.clone(),
        campaign_item: visit.campaign_item.clone(),
        ip: visit.ip.clone(),
        user_agent: visit.user_agent.clone(),
        referer: visit.referer.clone(),
        device: visit.device,
        country: visit.country.clone(),
        country_code: visit.country_code.clone(),
        miner_hotkey: visit.miner_hotkey.clone(),
        miner_block: visit.miner_block,
        validator_hotkey: visit.validator_hotkey.clone(),
        validator_block: visit.validator_block,
        sales_status: SalesStatus::Completed,
        sale_date: visit.sale_date,
        order_info: None,
        refund_info: None,
        sales_count: visit.sales_count,
        refund_count: visit.refund_count,
        net_sale_amount: visit.sale_amount,
        created_at: now,
        updated_at: now,
    }
}

/// Coarse device classification from a user agent string.
pub fn device_from_user_agent(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("ipad") || ua.contains("tablet") {
        DeviceType::Tablet
    } else if ua.contains("mobi") || ua.contains("android") || ua.contains("iphone") {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}
