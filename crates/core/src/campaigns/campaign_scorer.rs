use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::campaigns_constants::{
    AVG_SALE_SATURATION, AVG_SALE_WEIGHT, CONVERSION_SATURATION, CONVERSION_WEIGHT, REFUND_WEIGHT,
};
use super::campaigns_model::{Campaign, CampaignPerformance};
use super::campaigns_traits::{CampaignAggregateTrait, CampaignScorerTrait};
use crate::Result;

/// Explicit scorer state, owned by the scorer and never ambient.
#[derive(Default)]
struct ScorerState {
    last_run: Option<DateTime<Utc>>,
    performance: HashMap<String, CampaignPerformance>,
    ranking: Vec<Campaign>,
}

/// Ranks the active campaign set from trailing-window aggregates on a
/// rate-limited cadence.
///
/// Within the refresh interval `evaluate` is idle: it returns the cached
/// ranking without touching the aggregate queries. Once the interval
/// elapses, the performance map is recomputed wholesale and replaced;
/// entries for campaigns no longer active simply disappear.
pub struct CampaignScorer {
    aggregates: Arc<dyn CampaignAggregateTrait>,
    refresh_interval: Duration,
    trailing_window: Duration,
    state: RwLock<ScorerState>,
}

impl CampaignScorer {
    pub fn new(
        aggregates: Arc<dyn CampaignAggregateTrait>,
        refresh_interval: Duration,
        trailing_window: Duration,
    ) -> Self {
        Self {
            aggregates,
            refresh_interval,
            trailing_window,
            state: RwLock::new(ScorerState::default()),
        }
    }

    pub fn with_defaults(aggregates: Arc<dyn CampaignAggregateTrait>) -> Self {
        Self::new(
            aggregates,
            Duration::minutes(super::DEFAULT_REFRESH_INTERVAL_MINUTES),
            Duration::days(super::DEFAULT_TRAILING_WINDOW_DAYS),
        )
    }

    /// Weighted composite score, floored at zero. Ratios above their
    /// saturation reference clamp to the weight's full contribution.
    pub fn composite_score(performance: &CampaignPerformance) -> Decimal {
        let sales_score = (performance.avg_sale / AVG_SALE_SATURATION).min(Decimal::ONE);
        let conversion_score =
            (performance.conversion_rate / CONVERSION_SATURATION).min(Decimal::ONE);

        let score = sales_score * AVG_SALE_WEIGHT + conversion_score * CONVERSION_WEIGHT
            - performance.refund_rate * REFUND_WEIGHT;
        score.max(Decimal::ZERO)
    }

    async fn measure_campaign(
        &self,
        campaign_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CampaignPerformance> {
        let sales = self
            .aggregates
            .campaign_sales(campaign_id, self.trailing_window)
            .await?;
        let visits = self
            .aggregates
            .campaign_visits(campaign_id, self.trailing_window)
            .await?;
        let refunds = self
            .aggregates
            .campaign_refunds(campaign_id, self.trailing_window)
            .await?;

        let conversion_rate = if visits > 0 {
            Decimal::from(sales.count) / Decimal::from(visits)
        } else {
            Decimal::ZERO
        };
        let refund_rate = if sales.count > 0 {
            Decimal::from(refunds) / Decimal::from(sales.count)
        } else {
            Decimal::ZERO
        };
        let avg_sale = if sales.count > 0 {
            sales.total_amount / Decimal::from(sales.count)
        } else {
            Decimal::ZERO
        };

        Ok(CampaignPerformance {
            campaign_id: campaign_id.to_string(),
            conversion_rate,
            refund_rate,
            avg_sale,
            total_sales: sales.count,
            total_visits: visits,
            total_refunds: refunds,
            total_sale_amount: sales.total_amount,
            last_updated: now,
        })
    }
}

#[async_trait]
impl CampaignScorerTrait for CampaignScorer {
    async fn evaluate(
        &self,
        active_campaigns: Vec<Campaign>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>> {
        let mut state = self.state.write().await;

        if let Some(last_run) = state.last_run {
            if now - last_run < self.refresh_interval {
                debug!("Scoring pass skipped, refresh interval not elapsed");
                return Ok(state.ranking.clone());
            }
        }

        let mut performance = HashMap::with_capacity(active_campaigns.len());
        let mut scored: Vec<(Campaign, Decimal)> = Vec::with_capacity(active_campaigns.len());
        for campaign in active_campaigns {
            let measured = self.measure_campaign(&campaign.id, now).await?;
            let score = Self::composite_score(&measured);
            performance.insert(campaign.id.clone(), measured);
            scored.push((campaign, score));
        }

        // Score descending, campaign id ascending as the deterministic tie-break.
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

        for (campaign, score) in scored.iter().take(5) {
            info!("Campaign {}: score={}", campaign.id, score);
        }

        let ranking: Vec<Campaign> = scored.into_iter().map(|(campaign, _)| campaign).collect();
        state.performance = performance;
        state.ranking = ranking.clone();
        state.last_run = Some(now);
        Ok(ranking)
    }

    async fn performance_snapshot(&self) -> HashMap<String, CampaignPerformance> {
        self.state.read().await.performance.clone()
    }
}
