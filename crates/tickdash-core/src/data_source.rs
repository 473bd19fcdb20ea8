//! Price source trait and the frame it returns.
//!
//! A [`PriceSource`] answers one [`HistoryRequest`] with a [`SourceFrame`]: a
//! timestamp column plus labelled value columns. Labels may be composite
//! (`("Close", "AAPL")`); the fetcher flattens them before mapping onto the
//! fixed row schema.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Interval, Period, Symbol};

/// Source error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Network failure, timeout or unexpected upstream status.
    Unavailable,
    /// The upstream does not know the symbol.
    NotFound,
    /// The response could not be mapped onto the expected shape.
    Malformed,
    /// The request was rejected before or by the upstream.
    InvalidRequest,
}

/// Structured error surfaced by a price source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request for one ticker's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub interval: Interval,
    pub period: Period,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, interval: Interval, period: Period) -> Self {
        Self {
            symbol,
            interval,
            period,
        }
    }
}

/// Possibly multi-level column label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabel(Vec<String>);

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn composite<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(levels.into_iter().map(Into::into).collect())
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    /// First level of the label, or `""` for an empty label.
    pub fn flatten(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }
}

/// One labelled numeric column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub label: ColumnLabel,
    pub values: Vec<Option<f64>>,
}

impl SourceColumn {
    pub fn new(label: ColumnLabel, values: Vec<Option<f64>>) -> Self {
        Self { label, values }
    }
}

/// Tabular response from a price source, indexed by unix-second timestamps.
///
/// `utc_offset_secs` is the exchange clock's offset east of UTC.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceFrame {
    pub timestamps: Vec<i64>,
    pub columns: Vec<SourceColumn>,
    #[serde(default)]
    pub utc_offset_secs: i32,
}

impl SourceFrame {
    pub fn new(timestamps: Vec<i64>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
            utc_offset_secs: 0,
        }
    }

    pub fn with_utc_offset_secs(mut self, utc_offset_secs: i32) -> Self {
        self.utc_offset_secs = utc_offset_secs;
        self
    }

    pub fn with_column(mut self, label: ColumnLabel, values: Vec<Option<f64>>) -> Self {
        self.columns.push(SourceColumn::new(label, values));
        self
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Market-data source contract.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// dashboard request.
pub trait PriceSource: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    /// Fetch the history for one ticker/interval/period.
    fn history<'a>(
        &'a self,
        request: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<SourceFrame, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_labels_flatten_to_first_level() {
        let label = ColumnLabel::composite(["Adj Close", "AAPL"]);
        assert_eq!(label.flatten(), "Adj Close");
        assert_eq!(label.levels().len(), 2);
        assert_eq!(ColumnLabel::composite(Vec::<String>::new()).flatten(), "");
    }

    #[test]
    fn error_display_includes_code() {
        let err = SourceError::not_found("no data for ZZZZ");
        assert_eq!(err.kind(), SourceErrorKind::NotFound);
        assert_eq!(err.to_string(), "no data for ZZZZ (source.not_found)");
    }
}
