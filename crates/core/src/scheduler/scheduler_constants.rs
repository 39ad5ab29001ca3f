/// How often the active campaign set is re-scored and pushed downstream.
pub const CAMPAIGN_REFRESH_PERIOD_MINUTES: i64 = 30;

/// How often lingering sale-pending records are swept to COMPLETED.
pub const COMPLETE_STALE_SALES_PERIOD_MINUTES: i64 = 60;

/// How often completed visits are backfilled from the legacy source.
pub const BACKFILL_PERIOD_MINUTES: i64 = 60;

/// How often the trailing-window performance report is submitted.
pub const PERFORMANCE_REPORT_PERIOD_MINUTES: i64 = 15;

/// Backfill look-back, as a multiple of the trailing metrics window.
pub const BACKFILL_LOOKBACK_FACTOR: i32 = 2;
