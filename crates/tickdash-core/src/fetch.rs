//! Fetch a ticker's history and normalize it onto the fixed row schema.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::data_source::{HistoryRequest, PriceSource, SourceError, SourceFrame};
use crate::{Interval, Period, RawPriceRow, RawPriceSeries, Symbol, YahooAdapter};

const OPEN: &str = "Open";
const HIGH: &str = "High";
const LOW: &str = "Low";
const CLOSE: &str = "Close";
const ADJ_CLOSE: &str = "Adj Close";
const VOLUME: &str = "Volume";

/// Fetch failure for one ticker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to fetch '{ticker}': {source}")]
pub struct FetchError {
    ticker: String,
    source: SourceError,
}

impl FetchError {
    pub fn new(ticker: impl Into<String>, source: SourceError) -> Self {
        Self {
            ticker: ticker.into(),
            source,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn cause(&self) -> &SourceError {
        &self.source
    }
}

/// Retrieves and normalizes price history from a shared [`PriceSource`].
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn PriceSource>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// Fetcher over the Yahoo chart API with the given request timeout.
    pub fn yahoo(timeout_ms: u64) -> Self {
        Self::new(Arc::new(YahooAdapter::default().with_timeout_ms(timeout_ms)))
    }

    pub fn source_id(&self) -> &'static str {
        self.source.id()
    }

    /// Fetch `ticker` at `interval` over `period`.
    ///
    /// Zero rows is a valid, empty result. An invalid ticker is reported as an
    /// invalid request without contacting the source.
    pub async fn fetch(
        &self,
        ticker: &str,
        interval: Interval,
        period: Period,
    ) -> Result<RawPriceSeries, FetchError> {
        let requested = ticker.trim().to_ascii_uppercase();
        let symbol = Symbol::parse(ticker)
            .map_err(|e| FetchError::new(&requested, SourceError::invalid_request(e.to_string())))?;

        info!(
            ticker = %symbol,
            interval = %interval,
            period = %period,
            source = self.source.id(),
            "fetching price history"
        );

        let frame = self
            .source
            .history(HistoryRequest::new(symbol.clone(), interval, period))
            .await
            .map_err(|e| FetchError::new(symbol.as_str(), e))?;

        let series = normalize_frame(frame, symbol, interval, period)
            .map_err(|e| FetchError::new(&requested, e))?;
        info!(ticker = %series.symbol, rows = series.len(), "fetched price history");
        Ok(series)
    }
}

/// Map a source frame onto [`RawPriceRow`]s.
///
/// Column labels are flattened to their first level and matched
/// case-insensitively. When no adjusted-close column is present, adjusted close
/// is copied from close. The first column with a given flattened label wins.
pub fn normalize_frame(
    frame: SourceFrame,
    symbol: Symbol,
    interval: Interval,
    period: Period,
) -> Result<RawPriceSeries, SourceError> {
    let row_count = frame.row_count();
    let utc_offset_secs = frame.utc_offset_secs;
    let mut open = None;
    let mut high = None;
    let mut low = None;
    let mut close = None;
    let mut adj_close = None;
    let mut volume = None;

    for column in frame.columns {
        let label = column.label.flatten();
        let slot = if label.eq_ignore_ascii_case(OPEN) {
            &mut open
        } else if label.eq_ignore_ascii_case(HIGH) {
            &mut high
        } else if label.eq_ignore_ascii_case(LOW) {
            &mut low
        } else if label.eq_ignore_ascii_case(CLOSE) {
            &mut close
        } else if label.eq_ignore_ascii_case(ADJ_CLOSE) {
            &mut adj_close
        } else if label.eq_ignore_ascii_case(VOLUME) {
            &mut volume
        } else {
            debug!(label, "ignoring unknown source column");
            continue;
        };

        if slot.is_some() {
            continue;
        }
        if column.values.len() != row_count {
            return Err(SourceError::malformed(format!(
                "column '{label}' has {} values, expected {row_count}",
                column.values.len()
            )));
        }
        *slot = Some(column.values);
    }

    let open = require(open, OPEN)?;
    let high = require(high, HIGH)?;
    let low = require(low, LOW)?;
    let close = require(close, CLOSE)?;
    let volume = require(volume, VOLUME)?;
    let adj_close = adj_close.unwrap_or_else(|| close.clone());

    let rows = frame
        .timestamps
        .into_iter()
        .enumerate()
        .map(|(index, timestamp)| RawPriceRow {
            timestamp,
            open: open[index],
            high: high[index],
            low: low[index],
            close: close[index],
            adjusted_close: adj_close[index],
            volume: volume[index],
            ticker: symbol.clone(),
        })
        .collect();

    Ok(RawPriceSeries {
        symbol,
        interval,
        period,
        utc_offset_secs,
        rows,
    })
}

fn require(column: Option<Vec<Option<f64>>>, label: &str) -> Result<Vec<Option<f64>>, SourceError> {
    column.ok_or_else(|| SourceError::malformed(format!("response is missing the '{label}' column")))
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::data_source::{ColumnLabel, SourceErrorKind};

    struct StaticSource {
        frame: Result<SourceFrame, SourceError>,
        requests: Mutex<Vec<HistoryRequest>>,
    }

    impl StaticSource {
        fn new(frame: Result<SourceFrame, SourceError>) -> Self {
            Self {
                frame,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl PriceSource for StaticSource {
        fn id(&self) -> &'static str {
            "static"
        }

        fn history<'a>(
            &'a self,
            request: HistoryRequest,
        ) -> Pin<Box<dyn Future<Output = Result<SourceFrame, SourceError>> + Send + 'a>> {
            self.requests.lock().expect("requests lock").push(request);
            let frame = self.frame.clone();
            Box::pin(async move { frame })
        }
    }

    fn ohlcv_frame(symbol: &str, with_adj_close: bool) -> SourceFrame {
        let label = |field: &str| ColumnLabel::composite([field, symbol]);
        let frame = SourceFrame::new(vec![1_704_205_800, 1_704_292_200])
            .with_column(label("Open"), vec![Some(10.0), Some(11.0)])
            .with_column(label("High"), vec![Some(12.0), Some(13.0)])
            .with_column(label("Low"), vec![Some(9.0), Some(10.5)])
            .with_column(label("Close"), vec![Some(11.5), Some(12.5)])
            .with_column(label("Volume"), vec![Some(100.0), Some(200.0)]);
        if with_adj_close {
            frame.with_column(label("Adj Close"), vec![Some(11.0), Some(12.0)])
        } else {
            frame
        }
    }

    #[tokio::test]
    async fn attaches_uppercased_ticker_to_every_row() {
        let source = Arc::new(StaticSource::new(Ok(ohlcv_frame("MSFT", true))));
        let fetcher = Fetcher::new(source.clone());

        let series = fetcher
            .fetch(" msft ", Interval::OneDay, Period::OneMonth)
            .await
            .expect("fetch should succeed");

        assert_eq!(series.symbol.as_str(), "MSFT");
        assert_eq!(series.len(), 2);
        assert!(series.rows.iter().all(|row| row.ticker.as_str() == "MSFT"));
        assert_eq!(series.rows[1].adjusted_close, Some(12.0));

        let requests = source.requests.lock().expect("requests lock");
        assert_eq!(requests[0].symbol.as_str(), "MSFT");
    }

    #[tokio::test]
    async fn fills_adjusted_close_from_close_when_absent() {
        let fetcher = Fetcher::new(Arc::new(StaticSource::new(Ok(ohlcv_frame("AAPL", false)))));

        let series = fetcher
            .fetch("AAPL", Interval::FiveMinutes, Period::OneMonth)
            .await
            .expect("fetch should succeed");

        assert!(series
            .rows
            .iter()
            .all(|row| row.adjusted_close == row.close));
    }

    #[tokio::test]
    async fn invalid_ticker_fails_without_calling_source() {
        let source = Arc::new(StaticSource::new(Ok(SourceFrame::default())));
        let fetcher = Fetcher::new(source.clone());

        let error = fetcher
            .fetch("1bad$", Interval::OneDay, Period::OneMonth)
            .await
            .expect_err("invalid ticker");

        assert_eq!(error.ticker(), "1BAD$");
        assert_eq!(error.cause().kind(), SourceErrorKind::InvalidRequest);
        assert!(source.requests.lock().expect("requests lock").is_empty());
    }

    #[tokio::test]
    async fn source_errors_carry_the_ticker() {
        let fetcher = Fetcher::new(Arc::new(StaticSource::new(Err(
            SourceError::unavailable("connection refused"),
        ))));

        let error = fetcher
            .fetch("tsla", Interval::OneDay, Period::OneYear)
            .await
            .expect_err("source failure");

        assert_eq!(error.ticker(), "TSLA");
        assert_eq!(error.cause().kind(), SourceErrorKind::Unavailable);
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn flat_labels_are_accepted() {
        let frame = SourceFrame::new(vec![1])
            .with_column(ColumnLabel::flat("open"), vec![Some(1.0)])
            .with_column(ColumnLabel::flat("HIGH"), vec![Some(1.0)])
            .with_column(ColumnLabel::flat("Low"), vec![Some(1.0)])
            .with_column(ColumnLabel::flat("Close"), vec![Some(1.0)])
            .with_column(ColumnLabel::flat("Volume"), vec![None])
            .with_column(ColumnLabel::flat("Dividends"), vec![Some(0.0)]);
        let symbol = Symbol::parse("IBM").expect("symbol");

        let series = normalize_frame(frame, symbol, Interval::OneDay, Period::OneMonth)
            .expect("normalize");

        assert_eq!(series.rows[0].volume, None);
        assert_eq!(series.rows[0].adjusted_close, Some(1.0));
    }

    #[test]
    fn missing_required_column_is_malformed() {
        let frame = SourceFrame::new(vec![1])
            .with_column(ColumnLabel::flat("Open"), vec![Some(1.0)])
            .with_column(ColumnLabel::flat("Close"), vec![Some(1.0)]);
        let symbol = Symbol::parse("IBM").expect("symbol");

        let error = normalize_frame(frame, symbol, Interval::OneDay, Period::OneMonth)
            .expect_err("missing high");

        assert_eq!(error.kind(), SourceErrorKind::Malformed);
        assert!(error.message().contains("'High'"));
    }

    #[test]
    fn mismatched_column_length_is_malformed() {
        let mut frame = ohlcv_frame("AAPL", true);
        frame.columns[2].values.pop();
        let symbol = Symbol::parse("AAPL").expect("symbol");

        let error = normalize_frame(frame, symbol, Interval::OneDay, Period::OneMonth)
            .expect_err("short column");

        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }
}
