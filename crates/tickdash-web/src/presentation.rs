//! Turn dashboard inputs into a figure and a one-line summary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tickdash_core::{clean, Fetcher, Interval, Period, PriceSeries};
use tracing::warn;

use crate::figure::{
    Annotation, Axis, CandlestickTrace, Figure, Layout, Line, RangeSlider, ScatterTrace, Trace,
};

/// Tickers offered in the preset dropdown.
pub const PRESET_TICKERS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "JPM", "INTC",
];

pub const DEFAULT_PERIOD: Period = Period::OneMonth;
pub const DEFAULT_INTERVAL: Interval = Interval::OneDay;

pub const SELECT_PROMPT: &str = "Please select or enter a stock symbol.";

const FIGURE_HEIGHT: u32 = 700;
const VERTICAL_SPACING: f64 = 0.15;
const UPPER_SHARE: f64 = 0.4;

/// Raw dashboard inputs, as sent by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardQuery {
    pub dropdown: Option<String>,
    pub ticker: Option<String>,
    pub interval: Option<String>,
    pub period: Option<String>,
}

/// What the page draws: a chart and a status line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub figure: Figure,
    pub stats: String,
}

impl DashboardView {
    /// Empty chart with a message in the status line.
    pub fn message(stats: impl Into<String>) -> Self {
        Self {
            figure: Figure::empty(),
            stats: stats.into(),
        }
    }

    pub fn no_data(ticker: &str) -> Self {
        Self::message(format!("No data available for {ticker}."))
    }

    pub fn error(ticker: &str, cause: impl std::fmt::Display) -> Self {
        Self::message(format!("⚠️ Error fetching data for '{ticker}': {cause}"))
    }
}

/// Pick the ticker to chart: non-blank free text (uppercased) wins over the
/// dropdown.
pub fn resolve_ticker(dropdown: Option<&str>, free_text: Option<&str>) -> Option<String> {
    if let Some(text) = free_text.map(str::trim).filter(|text| !text.is_empty()) {
        return Some(text.to_uppercase());
    }
    dropdown
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Run one dashboard update: resolve inputs, fetch, clean and render.
///
/// Never fails; every problem becomes a message in the view.
pub async fn update_dashboard(fetcher: &Fetcher, query: &DashboardQuery) -> DashboardView {
    let Some(ticker) = resolve_ticker(query.dropdown.as_deref(), query.ticker.as_deref()) else {
        return DashboardView::message(SELECT_PROMPT);
    };

    let interval = match parse_or(query.interval.as_deref(), DEFAULT_INTERVAL) {
        Ok(interval) => interval,
        Err(e) => return DashboardView::error(&ticker, e),
    };
    let period = match parse_or(query.period.as_deref(), DEFAULT_PERIOD) {
        Ok(period) => period,
        Err(e) => return DashboardView::error(&ticker, e),
    };

    match fetcher.fetch(&ticker, interval, period).await {
        Ok(raw) => render(&ticker, &clean(raw)),
        Err(e) => {
            warn!(ticker = %ticker, error = %e, "dashboard fetch failed");
            DashboardView::error(&ticker, e.cause().message())
        }
    }
}

fn parse_or<T: FromStr>(value: Option<&str>, default: T) -> Result<T, T::Err> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.parse(),
        None => Ok(default),
    }
}

/// Render a cleaned series. An empty series yields the no-data view.
pub fn render(ticker: &str, series: &PriceSeries) -> DashboardView {
    match summary_stats(series) {
        Some(stats) => DashboardView {
            figure: price_figure(ticker, series),
            stats,
        },
        None => DashboardView::no_data(ticker),
    }
}

/// `Latest Close | High | Low | Volume` for the most recent row.
pub fn summary_stats(series: &PriceSeries) -> Option<String> {
    series.latest().map(|row| {
        format!(
            "Latest Close: ${:.2} | High: ${:.2} | Low: ${:.2} | Volume: {}",
            row.adjusted_close, row.high, row.low, row.volume
        )
    })
}

/// Line chart of adjusted close above a candlestick chart, sharing the x axis.
///
/// X labels are on the exchange clock.
pub fn price_figure(ticker: &str, series: &PriceSeries) -> Figure {
    let dates: Vec<String> = series
        .rows
        .iter()
        .map(|row| row.timestamp.format_local_sql(series.utc_offset_secs))
        .collect();

    let line = Trace::Scatter(ScatterTrace {
        x: dates.clone(),
        y: series.rows.iter().map(|row| row.adjusted_close).collect(),
        mode: "lines+markers",
        name: String::from("Line Chart"),
        line: Line { color: "royalblue" },
        xaxis: "x",
        yaxis: "y",
    });
    let candles = Trace::Candlestick(CandlestickTrace {
        x: dates,
        open: series.rows.iter().map(|row| row.open).collect(),
        high: series.rows.iter().map(|row| row.high).collect(),
        low: series.rows.iter().map(|row| row.low).collect(),
        close: series.rows.iter().map(|row| row.close).collect(),
        name: String::from("Candlesticks"),
        xaxis: "x2",
        yaxis: "y2",
    });

    let [upper, lower] = panel_domains();
    let mut top_x = Axis::new([0.0, 1.0], "y");
    top_x.matches = Some("x2");
    top_x.showticklabels = false;
    let mut bottom_x = Axis::new([0.0, 1.0], "y2").titled("Date");
    bottom_x.rangeslider = Some(RangeSlider { visible: false });

    let mut layout = Layout::dark();
    layout.height = Some(FIGURE_HEIGHT);
    layout.xaxis = Some(top_x);
    layout.xaxis2 = Some(bottom_x);
    layout.yaxis = Some(Axis::new(upper, "x").titled("Price"));
    layout.yaxis2 = Some(Axis::new(lower, "x2").titled("Price"));
    layout.annotations = vec![
        Annotation::subplot_title(format!("{ticker} Price Line Chart"), upper[1]),
        Annotation::subplot_title(format!("{ticker} Candlestick Chart"), lower[1]),
    ];

    Figure {
        data: vec![line, candles],
        layout,
    }
}

/// Vertical domains of the upper (40%) and lower (60%) panels.
fn panel_domains() -> [[f64; 2]; 2] {
    let usable = 1.0 - VERTICAL_SPACING;
    let lower_top = usable * (1.0 - UPPER_SHARE);
    let upper_bottom = lower_top + VERTICAL_SPACING;
    [[upper_bottom, 1.0], [0.0, lower_top]]
}

#[cfg(test)]
mod tests {
    use tickdash_core::{PriceRow, Symbol, UtcDateTime};

    use super::*;

    fn series(rows: &[(&str, f64, f64, f64, f64, f64, u64)]) -> PriceSeries {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        PriceSeries {
            symbol: symbol.clone(),
            interval: Interval::OneDay,
            period: Period::OneMonth,
            utc_offset_secs: 0,
            rows: rows
                .iter()
                .map(|&(ts, open, high, low, close, adj, volume)| PriceRow {
                    timestamp: UtcDateTime::parse(ts).expect("timestamp"),
                    open,
                    high,
                    low,
                    close,
                    adjusted_close: adj,
                    volume,
                    ticker: symbol.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn free_text_overrides_dropdown() {
        assert_eq!(
            resolve_ticker(Some("AAPL"), Some(" infy ")),
            Some(String::from("INFY"))
        );
        assert_eq!(
            resolve_ticker(Some("MSFT"), Some("   ")),
            Some(String::from("MSFT"))
        );
        assert_eq!(resolve_ticker(None, None), None);
        assert_eq!(resolve_ticker(Some(""), Some("")), None);
    }

    #[test]
    fn stats_use_latest_row_and_adjusted_close() {
        let series = series(&[
            ("2024-01-02T00:00:00Z", 1.0, 2.0, 0.5, 1.5, 1.4, 10),
            ("2024-01-03T00:00:00Z", 187.15, 188.444, 183.886, 185.64, 184.938, 82_488_700),
        ]);

        assert_eq!(
            summary_stats(&series).as_deref(),
            Some("Latest Close: $184.94 | High: $188.44 | Low: $183.89 | Volume: 82488700")
        );
    }

    #[test]
    fn empty_series_renders_no_data_message() {
        let view = render("ZZZZ", &series(&[]));
        assert!(view.figure.is_empty());
        assert_eq!(view.stats, "No data available for ZZZZ.");
    }

    #[test]
    fn figure_has_line_over_candlestick_panels() {
        let view = render(
            "AAPL",
            &series(&[("2024-01-02T00:00:00Z", 1.0, 2.0, 0.5, 1.5, 1.4, 10)]),
        );
        let json = serde_json::to_value(&view.figure).expect("serialize");

        assert_eq!(json["data"][0]["type"], "scatter");
        assert_eq!(json["data"][0]["mode"], "lines+markers");
        assert_eq!(json["data"][0]["y"][0], 1.4);
        assert_eq!(json["data"][1]["type"], "candlestick");
        assert_eq!(json["data"][1]["x"][0], "2024-01-02 00:00:00");
        assert_eq!(json["layout"]["height"], 700);
        assert_eq!(json["layout"]["showlegend"], false);
        assert_eq!(json["layout"]["xaxis2"]["title"]["text"], "Date");
        assert_eq!(json["layout"]["xaxis2"]["rangeslider"]["visible"], false);
        assert_eq!(
            json["layout"]["annotations"][0]["text"],
            "AAPL Price Line Chart"
        );
        assert_eq!(
            json["layout"]["annotations"][1]["text"],
            "AAPL Candlestick Chart"
        );
    }

    #[test]
    fn x_labels_use_exchange_local_time() {
        let mut series = series(&[("2024-01-02T03:45:00Z", 1.0, 2.0, 0.5, 1.5, 1.4, 10)]);
        series.utc_offset_secs = 19_800;

        let json = serde_json::to_value(price_figure("RELIANCE.NS", &series)).expect("serialize");

        assert_eq!(json["data"][0]["x"][0], "2024-01-02 09:15:00");
        assert_eq!(json["data"][1]["x"][0], "2024-01-02 09:15:00");
    }

    #[test]
    fn panels_split_forty_sixty_with_spacing() {
        let [upper, lower] = panel_domains();
        let upper_height = upper[1] - upper[0];
        let lower_height = lower[1] - lower[0];

        assert!((upper[0] - lower[1] - VERTICAL_SPACING).abs() < 1e-9);
        assert!((upper_height / (upper_height + lower_height) - 0.4).abs() < 1e-9);
        assert_eq!(upper[1], 1.0);
        assert_eq!(lower[0], 0.0);
    }

    #[test]
    fn error_view_names_ticker_and_cause() {
        let view = DashboardView::error("NOPE", "no chart data");
        assert!(view.figure.is_empty());
        assert_eq!(view.stats, "⚠️ Error fetching data for 'NOPE': no chart data");
    }
}
