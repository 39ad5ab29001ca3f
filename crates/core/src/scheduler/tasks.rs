//! Concrete periodic tasks wired together by the orchestrator.
//!
//! Each task holds only collaborator trait handles, so the whole sweep can
//! be unit-tested against in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rust_decimal::Decimal;

use super::orchestrator::PeriodicTask;
use crate::campaigns::{
    ActiveCampaignSource, CampaignAggregateTrait, CampaignScorerTrait, CampaignSelectionSink,
    PerformanceReport, ReportSink,
};
use crate::tracking::{CompletedVisitSource, TrackingServiceTrait};
use crate::Result;

/// The "ping" cycle: score the active campaign set and push the ranking to
/// the campaign-selection collaborator.
pub struct CampaignRefreshTask {
    source: Arc<dyn ActiveCampaignSource>,
    scorer: Arc<dyn CampaignScorerTrait>,
    sink: Arc<dyn CampaignSelectionSink>,
    interval: Duration,
}

impl CampaignRefreshTask {
    pub fn new(
        source: Arc<dyn ActiveCampaignSource>,
        scorer: Arc<dyn CampaignScorerTrait>,
        sink: Arc<dyn CampaignSelectionSink>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            scorer,
            sink,
            interval,
        }
    }

    pub fn with_default_interval(
        source: Arc<dyn ActiveCampaignSource>,
        scorer: Arc<dyn CampaignScorerTrait>,
        sink: Arc<dyn CampaignSelectionSink>,
    ) -> Self {
        Self::new(
            source,
            scorer,
            sink,
            Duration::minutes(super::CAMPAIGN_REFRESH_PERIOD_MINUTES),
        )
    }
}

#[async_trait]
impl PeriodicTask for CampaignRefreshTask {
    fn name(&self) -> &str {
        "campaign_refresh"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<()> {
        let active = self.source.active_campaigns().await?;
        let ranked = self.scorer.evaluate(active, now).await?;
        info!("Ranked {} active campaigns", ranked.len());
        self.sink.set_campaigns(ranked).await
    }
}

/// Cleanup sweep: bulk-complete sale-pending records older than the sale
/// window, per active campaign.
pub struct CompleteStaleSalesTask {
    source: Arc<dyn ActiveCampaignSource>,
    tracking: Arc<dyn TrackingServiceTrait>,
    sale_window: Duration,
    interval: Duration,
}

impl CompleteStaleSalesTask {
    pub fn new(
        source: Arc<dyn ActiveCampaignSource>,
        tracking: Arc<dyn TrackingServiceTrait>,
        sale_window: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            tracking,
            sale_window,
            interval,
        }
    }

    pub fn with_defaults(
        source: Arc<dyn ActiveCampaignSource>,
        tracking: Arc<dyn TrackingServiceTrait>,
    ) -> Self {
        Self::new(
            source,
            tracking,
            Duration::days(crate::tracking::SALE_COMPLETION_WINDOW_DAYS),
            Duration::minutes(super::COMPLETE_STALE_SALES_PERIOD_MINUTES),
        )
    }
}

#[async_trait]
impl PeriodicTask for CompleteStaleSalesTask {
    fn name(&self) -> &str {
        "complete_stale_sales"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<()> {
        let cutoff = now - self.sale_window;
        let mut completed = 0;
        for campaign in self.source.active_campaigns().await? {
            completed += self
                .tracking
                .complete_pending_sales(&campaign.id, cutoff)
                .await?;
        }
        debug!("Completed {} stale sale-pending records", completed);
        Ok(())
    }
}

/// Migration sweep: import already-closed events from the legacy source as
/// COMPLETED records.
pub struct BackfillCompletedVisitsTask {
    source: Arc<dyn CompletedVisitSource>,
    tracking: Arc<dyn TrackingServiceTrait>,
    lookback: Duration,
    interval: Duration,
}

impl BackfillCompletedVisitsTask {
    pub fn new(
        source: Arc<dyn CompletedVisitSource>,
        tracking: Arc<dyn TrackingServiceTrait>,
        lookback: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            tracking,
            lookback,
            interval,
        }
    }

    pub fn with_defaults(
        source: Arc<dyn CompletedVisitSource>,
        tracking: Arc<dyn TrackingServiceTrait>,
    ) -> Self {
        let window_days =
            crate::campaigns::DEFAULT_TRAILING_WINDOW_DAYS * super::BACKFILL_LOOKBACK_FACTOR as i64;
        Self::new(
            source,
            tracking,
            Duration::days(window_days),
            Duration::minutes(super::BACKFILL_PERIOD_MINUTES),
        )
    }
}

#[async_trait]
impl PeriodicTask for BackfillCompletedVisitsTask {
    fn name(&self) -> &str {
        "backfill_completed_visits"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<()> {
        let visits = self.source.completed_visits_since(now - self.lookback).await?;
        if visits.is_empty() {
            return Ok(());
        }
        let written = self.tracking.add_completed_visits(visits).await?;
        info!("Backfilled {} completed visits", written);
        Ok(())
    }
}

/// Load-report sweep: submit a trailing-window sales summary downstream.
pub struct PerformanceReportTask {
    aggregates: Arc<dyn CampaignAggregateTrait>,
    sink: Arc<dyn ReportSink>,
    window: Duration,
    interval: Duration,
}

impl PerformanceReportTask {
    pub fn new(
        aggregates: Arc<dyn CampaignAggregateTrait>,
        sink: Arc<dyn ReportSink>,
        window: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            aggregates,
            sink,
            window,
            interval,
        }
    }

    pub fn with_defaults(
        aggregates: Arc<dyn CampaignAggregateTrait>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self::new(
            aggregates,
            sink,
            Duration::days(crate::campaigns::DEFAULT_TRAILING_WINDOW_DAYS),
            Duration::minutes(super::PERFORMANCE_REPORT_PERIOD_MINUTES),
        )
    }
}

#[async_trait]
impl PeriodicTask for PerformanceReportTask {
    fn name(&self) -> &str {
        "performance_report"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<()> {
        let sales = self.aggregates.sales_summary(self.window).await?;
        let refunds = self.aggregates.refunds_summary(self.window).await?;

        let avg_sale = if sales.count > 0 {
            sales.total_amount / Decimal::from(sales.count)
        } else {
            Decimal::ZERO
        };
        let refund_rate = if sales.count > 0 {
            Decimal::from(refunds) / Decimal::from(sales.count)
        } else {
            Decimal::ZERO
        };

        let report = PerformanceReport {
            total_sales: sales.count,
            total_amount: sales.total_amount,
            avg_sale,
            refund_rate,
            generated_at: now,
        };
        info!(
            "Sales performance - total: {}, amount: {}, avg: {}, refund rate: {}",
            report.total_sales, report.total_amount, report.avg_sale, report.refund_rate
        );
        self.sink.submit_report(report).await
    }
}
