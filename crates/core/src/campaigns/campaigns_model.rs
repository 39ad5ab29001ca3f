//! Campaign domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Activation state of a campaign as reported by the campaign source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Activated,
    Deactivated,
}

/// A campaign as the scorer sees it. The active set is supplied each cycle
/// by an external source and carries no stability guarantee between cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
    pub status: CampaignStatus,
}

/// Counts and totals for one campaign's sales over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAggregate {
    pub count: i64,
    pub total_amount: Decimal,
}

/// Derived per-campaign metrics, recreated wholesale each scoring cycle.
///
/// Not persisted as a source of truth; entries for campaigns that drop out
/// of the active set are discarded on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    pub campaign_id: String,
    pub conversion_rate: Decimal,
    pub refund_rate: Decimal,
    pub avg_sale: Decimal,
    pub total_sales: i64,
    pub total_visits: i64,
    pub total_refunds: i64,
    pub total_sale_amount: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Trailing-window summary submitted by the load-report sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_sales: i64,
    pub total_amount: Decimal,
    pub avg_sale: Decimal,
    pub refund_rate: Decimal,
    pub generated_at: DateTime<Utc>,
}
