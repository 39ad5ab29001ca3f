use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Average sale amount at which the sales component of the score saturates.
pub const AVG_SALE_SATURATION: Decimal = dec!(500);

/// Conversion rate at which the conversion component of the score saturates.
pub const CONVERSION_SATURATION: Decimal = dec!(0.05);

/// Weight of the average-sale component.
pub const AVG_SALE_WEIGHT: Decimal = dec!(0.90);

/// Weight of the conversion-rate component.
pub const CONVERSION_WEIGHT: Decimal = dec!(0.05);

/// Weight of the refund-rate penalty.
pub const REFUND_WEIGHT: Decimal = dec!(0.05);

/// Minimum time between full scoring passes.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: i64 = 30;

/// Trailing look-back window for aggregate metrics.
pub const DEFAULT_TRAILING_WINDOW_DAYS: i64 = 30;
