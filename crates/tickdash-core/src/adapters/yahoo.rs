use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::data_source::{ColumnLabel, HistoryRequest, PriceSource, SourceError, SourceFrame};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};

/// Public Yahoo Finance query host.
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance v8 chart adapter.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(YAHOO_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Point the adapter at another host (trailing `/` is ignored).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn chart_url(&self, req: &HistoryRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includeAdjustedClose=true",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            req.period.as_str(),
            req.interval.as_str(),
        )
    }

    async fn fetch_chart(&self, req: &HistoryRequest) -> Result<SourceFrame, SourceError> {
        let endpoint = self.chart_url(req);
        debug!(url = %endpoint, "requesting yahoo chart");

        let request = HttpRequest::get(endpoint)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            if e.timed_out() {
                SourceError::unavailable(format!(
                    "yahoo request timed out after {} ms",
                    self.timeout_ms
                ))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            }
        })?;

        if response.status == 404 {
            let message = chart_error(&response.body)
                .map(|error| error.describe())
                .unwrap_or_else(|| format!("no chart data found for {}", req.symbol));
            return Err(SourceError::not_found(message));
        }
        if !response.is_success() {
            return Err(match chart_error(&response.body) {
                Some(error) => error.into_source_error(),
                None => SourceError::unavailable(format!(
                    "yahoo returned status {}",
                    response.status
                )),
            });
        }

        parse_chart(req, &response.body)
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn history<'a>(
        &'a self,
        request: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<SourceFrame, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_chart(&request).await })
    }
}

/// Map a chart body onto a frame with `(field, SYMBOL)` column labels.
fn parse_chart(req: &HistoryRequest, body: &str) -> Result<SourceFrame, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart_response.chart.error {
        return Err(error.into_source_error());
    }

    let result = chart_response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::malformed("no chart result in response"))?;

    let utc_offset_secs = result
        .meta
        .as_ref()
        .and_then(|meta| meta.gmtoffset)
        .unwrap_or(0);
    let symbol = req.symbol.as_str();
    let label = |field: &str| ColumnLabel::composite([field, symbol]);

    let Some(timestamps) = result.timestamp else {
        // Yahoo omits the timestamp array when the range has no trading data.
        return Ok(SourceFrame::new(Vec::new())
            .with_utc_offset_secs(utc_offset_secs)
            .with_column(label("Open"), Vec::new())
            .with_column(label("High"), Vec::new())
            .with_column(label("Low"), Vec::new())
            .with_column(label("Close"), Vec::new())
            .with_column(label("Volume"), Vec::new()));
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::malformed("no quote data in chart result"))?;

    let mut frame = SourceFrame::new(timestamps)
        .with_utc_offset_secs(utc_offset_secs)
        .with_column(label("Open"), quote.open)
        .with_column(label("High"), quote.high)
        .with_column(label("Low"), quote.low)
        .with_column(label("Close"), quote.close)
        .with_column(label("Volume"), quote.volume);

    if let Some(adjclose) = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|series| series.adjclose)
        .filter(|values| !values.is_empty())
    {
        frame = frame.with_column(label("Adj Close"), adjclose);
    }

    Ok(frame)
}

fn chart_error(body: &str) -> Option<YahooChartError> {
    serde_json::from_str::<YahooChartResponse>(body)
        .ok()
        .and_then(|response| response.chart.error)
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn describe(&self) -> String {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => {
                format!("yahoo chart API error: {} ({description})", self.code)
            }
            _ => format!("yahoo chart API error: {}", self.code),
        }
    }

    fn into_source_error(self) -> SourceError {
        let message = self.describe();
        match self.code.as_str() {
            "Not Found" => SourceError::not_found(message),
            "Bad Request" | "Unprocessable Entity" => SourceError::invalid_request(message),
            _ => SourceError::unavailable(message),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

/// Exchange metadata; `gmtoffset` is the exchange clock's offset from UTC in seconds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct YahooChartMeta {
    gmtoffset: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Vec<YahooChartAdjClose>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct YahooChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct YahooChartAdjClose {
    adjclose: Vec<Option<f64>>,
}
