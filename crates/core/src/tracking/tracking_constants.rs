/// Default page size for range queries between peers.
pub const DEFAULT_PAGE_SIZE: i64 = 500;

/// Age after which a recorded sale that never completed is swept to COMPLETED.
pub const SALE_COMPLETION_WINDOW_DAYS: i64 = 30;
