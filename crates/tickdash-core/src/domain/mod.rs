//! # Domain Models
//!
//! Typed building blocks for the price pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, uppercased ticker |
//! | [`Interval`] | Source sampling interval (5m .. 1d) |
//! | [`Period`] | Look-back range (1mo .. 5y) |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`RawPriceSeries`] | Normalized fetch output, not yet cleaned |
//! | [`PriceSeries`] | Cleaned, time-sorted rows |
//! | [`HourlySeries`] | Hourly buckets plus moving-average columns |

mod interval;
mod models;
mod period;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use models::{
    HourlyBucket, HourlySeries, MovingAverageColumn, PriceRow, PriceSeries, RawPriceRow,
    RawPriceSeries,
};
pub use period::Period;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
