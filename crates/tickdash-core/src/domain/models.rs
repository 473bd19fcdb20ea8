use serde::{Deserialize, Serialize};

use super::{Interval, Period, Symbol, UtcDateTime};

/// One OHLCV observation as delivered by the source, before cleaning.
///
/// `timestamp` is unix seconds and may be out of range; any numeric field may
/// be missing or non-finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
    pub ticker: Symbol,
}

/// Rows for one ticker as returned by the fetcher.
///
/// `utc_offset_secs` is the exchange clock's offset east of UTC; hourly
/// buckets and chart labels follow that clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    pub period: Period,
    #[serde(default)]
    pub utc_offset_secs: i32,
    pub rows: Vec<RawPriceRow>,
}

impl RawPriceSeries {
    pub fn new(symbol: Symbol, interval: Interval, period: Period) -> Self {
        Self {
            symbol,
            interval,
            period,
            utc_offset_secs: 0,
            rows: Vec::new(),
        }
    }

    pub fn with_utc_offset_secs(mut self, utc_offset_secs: i32) -> Self {
        self.utc_offset_secs = utc_offset_secs;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One cleaned OHLCV observation. Every field is present and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub timestamp: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: u64,
    pub ticker: Symbol,
}

impl From<PriceRow> for RawPriceRow {
    fn from(row: PriceRow) -> Self {
        Self {
            timestamp: row.timestamp.unix_timestamp(),
            open: Some(row.open),
            high: Some(row.high),
            low: Some(row.low),
            close: Some(row.close),
            adjusted_close: Some(row.adjusted_close),
            volume: Some(row.volume as f64),
            ticker: row.ticker,
        }
    }
}

/// Cleaned rows sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    pub period: Period,
    #[serde(default)]
    pub utc_offset_secs: i32,
    pub rows: Vec<PriceRow>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent row, if any.
    pub fn latest(&self) -> Option<&PriceRow> {
        self.rows.last()
    }
}

impl From<PriceSeries> for RawPriceSeries {
    fn from(series: PriceSeries) -> Self {
        Self {
            symbol: series.symbol,
            interval: series.interval,
            period: series.period,
            utc_offset_secs: series.utc_offset_secs,
            rows: series.rows.into_iter().map(RawPriceRow::from).collect(),
        }
    }
}

/// One hour of aggregated OHLCV data, keyed by the UTC instant at which the
/// exchange-clock hour starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub timestamp: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub ticker: Symbol,
}

impl HourlyBucket {
    /// Start a bucket at `hour` from its first contributing row.
    pub fn open_with(hour: UtcDateTime, row: PriceRow) -> Self {
        Self {
            timestamp: hour,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            ticker: row.ticker,
        }
    }

    /// Fold a later row of the same hour into the bucket.
    pub fn absorb(&mut self, row: PriceRow) {
        self.high = self.high.max(row.high);
        self.low = self.low.min(row.low);
        self.close = row.close;
        self.volume = self.volume.saturating_add(row.volume);
        self.ticker = row.ticker;
    }
}

/// Trailing mean of bucket closes. The first `window - 1` entries are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageColumn {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl MovingAverageColumn {
    pub fn name(&self) -> String {
        format!("MA_{}", self.window)
    }
}

/// Hourly buckets plus derived moving-average columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub symbol: Symbol,
    pub period: Period,
    pub buckets: Vec<HourlyBucket>,
    pub moving_averages: Vec<MovingAverageColumn>,
}

impl HourlySeries {
    pub fn new(symbol: Symbol, period: Period, buckets: Vec<HourlyBucket>) -> Self {
        Self {
            symbol,
            period,
            buckets,
            moving_averages: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn moving_average(&self, window: usize) -> Option<&MovingAverageColumn> {
        self.moving_averages
            .iter()
            .find(|column| column.window == window)
    }

    /// Add a column, replacing any existing column with the same window.
    pub fn set_moving_average(&mut self, column: MovingAverageColumn) {
        match self
            .moving_averages
            .iter_mut()
            .find(|existing| existing.window == column.window)
        {
            Some(existing) => *existing = column,
            None => self.moving_averages.push(column),
        }
    }
}
