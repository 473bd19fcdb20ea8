//! Clean, resample and enrich price series.
//!
//! Stages take their input by value and return a new series:
//!
//! ```text
//! RawPriceSeries --clean--> PriceSeries --resample_hourly--> HourlySeries --add_moving_average--> HourlySeries
//! ```

use tracing::debug;

use crate::{
    HourlyBucket, HourlySeries, MovingAverageColumn, PriceRow, PriceSeries, RawPriceRow,
    RawPriceSeries, TransformError, UtcDateTime,
};

/// Window used by [`clean_and_transform`].
pub const DEFAULT_MA_WINDOW: usize = 3;

/// Drop incomplete rows, validate timestamps and sort ascending.
///
/// A row is dropped when any price is missing or non-finite, when volume is
/// missing, negative or fractional, or when its timestamp is out of range.
/// The sort is stable, so rows sharing a timestamp keep their source order.
pub fn clean(series: RawPriceSeries) -> PriceSeries {
    let RawPriceSeries {
        symbol,
        interval,
        period,
        utc_offset_secs,
        rows,
    } = series;

    let total = rows.len();
    let mut cleaned: Vec<PriceRow> = rows.into_iter().filter_map(clean_row).collect();
    cleaned.sort_by_key(|row| row.timestamp);

    debug!(
        ticker = %symbol,
        kept = cleaned.len(),
        dropped = total - cleaned.len(),
        "cleaned price series"
    );

    PriceSeries {
        symbol,
        interval,
        period,
        utc_offset_secs,
        rows: cleaned,
    }
}

fn clean_row(row: RawPriceRow) -> Option<PriceRow> {
    Some(PriceRow {
        timestamp: UtcDateTime::from_unix_timestamp(row.timestamp).ok()?,
        open: finite(row.open)?,
        high: finite(row.high)?,
        low: finite(row.low)?,
        close: finite(row.close)?,
        adjusted_close: finite(row.adjusted_close)?,
        volume: whole_volume(row.volume)?,
        ticker: row.ticker,
    })
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn whole_volume(value: Option<f64>) -> Option<u64> {
    let value = finite(value)?;
    if value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return None;
    }
    Some(value as u64)
}

/// Aggregate a clean series into hour buckets on the exchange clock.
///
/// Input must be sorted ascending; unsorted input yields repeated hours.
pub fn resample_hourly(series: PriceSeries) -> HourlySeries {
    let PriceSeries {
        symbol,
        period,
        utc_offset_secs,
        rows,
        ..
    } = series;

    let row_count = rows.len();
    let mut buckets: Vec<HourlyBucket> = Vec::new();
    for row in rows {
        let hour = row.timestamp.floor_to_local_hour(utc_offset_secs);
        match buckets.last_mut() {
            Some(bucket) if bucket.timestamp == hour => bucket.absorb(row),
            _ => buckets.push(HourlyBucket::open_with(hour, row)),
        }
    }

    debug!(ticker = %symbol, rows = row_count, buckets = buckets.len(), "resampled to hourly");
    HourlySeries::new(symbol, period, buckets)
}

/// Append (or replace) the `MA_{window}` column of trailing close means.
pub fn add_moving_average(
    series: HourlySeries,
    window: usize,
) -> Result<HourlySeries, TransformError> {
    if window == 0 {
        return Err(TransformError::InvalidWindow { window });
    }
    Ok(attach_moving_average(series, window))
}

fn attach_moving_average(mut series: HourlySeries, window: usize) -> HourlySeries {
    let closes: Vec<f64> = series.buckets.iter().map(|bucket| bucket.close).collect();
    series.set_moving_average(MovingAverageColumn {
        window,
        values: trailing_mean(&closes, window),
    });
    series
}

/// Mean of each trailing run of `window` values; `None` until a full run exists.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|index| {
            (index + 1 >= window).then(|| {
                let run = &values[index + 1 - window..=index];
                run.iter().sum::<f64>() / window as f64
            })
        })
        .collect()
}

/// `clean`, resample to hourly and add `MA_3`.
pub fn clean_and_transform(series: RawPriceSeries) -> HourlySeries {
    attach_moving_average(resample_hourly(clean(series)), DEFAULT_MA_WINDOW)
}

/// [`clean_and_transform`] with an explicit moving-average window.
pub fn clean_and_transform_with(
    series: RawPriceSeries,
    window: usize,
) -> Result<HourlySeries, TransformError> {
    add_moving_average(resample_hourly(clean(series)), window)
}
