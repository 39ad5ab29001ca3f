//! Campaigns module - scoring and the aggregate-query contract.

mod campaign_scorer;
mod campaigns_constants;
mod campaigns_model;
mod campaigns_traits;


pub use campaign_scorer::CampaignScorer;
pub use campaigns_constants::*;
pub use campaigns_model::{
    Campaign, CampaignPerformance, CampaignStatus, PerformanceReport, SalesAggregate,
};
pub use campaigns_traits::{
    ActiveCampaignSource, CampaignAggregateTrait, CampaignScorerTrait, CampaignSelectionSink,
    ReportSink,
};
