use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::campaigns_model::{Campaign, CampaignPerformance, PerformanceReport, SalesAggregate};
use crate::Result;

/// Trailing-window aggregate queries over the canonical record store.
///
/// The storage crate implements this over the tracking table; other
/// deployments may satisfy it from a remote collaborator. Reads are
/// best-effort snapshots and may interleave with reconciler writes.
#[async_trait]
pub trait CampaignAggregateTrait: Send + Sync {
    async fn campaign_sales(&self, campaign_id: &str, window: Duration) -> Result<SalesAggregate>;

    async fn campaign_visits(&self, campaign_id: &str, window: Duration) -> Result<i64>;

    async fn campaign_refunds(&self, campaign_id: &str, window: Duration) -> Result<i64>;

    /// Sales across all campaigns over the window.
    async fn sales_summary(&self, window: Duration) -> Result<SalesAggregate>;

    /// Refunded events across all campaigns over the window.
    async fn refunds_summary(&self, window: Duration) -> Result<i64>;
}

/// Contract for the rate-limited campaign scoring pass.
#[async_trait]
pub trait CampaignScorerTrait: Send + Sync {
    /// Ranks the active campaign set. Within the refresh interval the
    /// previously ranked list is returned unchanged and no aggregates are
    /// queried.
    async fn evaluate(
        &self,
        active_campaigns: Vec<Campaign>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>>;

    /// Copy of the per-campaign metrics computed by the last scoring pass.
    async fn performance_snapshot(&self) -> HashMap<String, CampaignPerformance>;
}

/// Supplies the campaign set to score each cycle.
#[async_trait]
pub trait ActiveCampaignSource: Send + Sync {
    async fn active_campaigns(&self) -> Result<Vec<Campaign>>;
}

/// Consumes the ranked campaign list produced by the scorer.
#[async_trait]
pub trait CampaignSelectionSink: Send + Sync {
    async fn set_campaigns(&self, ranked: Vec<Campaign>) -> Result<()>;
}

/// Consumes the trailing-window performance report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit_report(&self, report: PerformanceReport) -> Result<()>;
}
