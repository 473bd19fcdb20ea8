//! Plotly-compatible figure types.
//!
//! Only the attributes the dashboard sets are modelled; everything else is
//! left to Plotly defaults.

use serde::Serialize;

const BACKGROUND: &str = "#111111";
const FOREGROUND: &str = "#f2f5fa";
const GRID: &str = "#283442";

/// A figure as accepted by `Plotly.react(element, data, layout)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Figure with no traces and the dark theme.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            layout: Layout::dark(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Candlestick(CandlestickTrace),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    pub name: String,
    pub line: Line,
    pub xaxis: &'static str,
    pub yaxis: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickTrace {
    pub x: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub name: String,
    pub xaxis: &'static str,
    pub yaxis: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub showlegend: bool,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Layout {
    pub fn dark() -> Self {
        Self {
            height: None,
            showlegend: false,
            paper_bgcolor: BACKGROUND,
            plot_bgcolor: BACKGROUND,
            font: Font { color: FOREGROUND },
            xaxis: None,
            xaxis2: None,
            yaxis: None,
            yaxis2: None,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<AxisTitle>,
    pub domain: [f64; 2],
    pub anchor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<&'static str>,
    pub showticklabels: bool,
    pub gridcolor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

impl Axis {
    pub fn new(domain: [f64; 2], anchor: &'static str) -> Self {
        Self {
            title: None,
            domain,
            anchor,
            matches: None,
            showticklabels: true,
            gridcolor: GRID,
            rangeslider: None,
        }
    }

    pub fn titled(mut self, text: impl Into<String>) -> Self {
        self.title = Some(AxisTitle { text: text.into() });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

/// Subplot title, positioned in paper coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub xref: &'static str,
    pub yref: &'static str,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
    pub showarrow: bool,
    pub font: AnnotationFont,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationFont {
    pub size: u32,
}

impl Annotation {
    /// Centered title sitting just above a panel whose top edge is `y`.
    pub fn subplot_title(text: impl Into<String>, y: f64) -> Self {
        Self {
            text: text.into(),
            x: 0.5,
            y,
            xref: "paper",
            yref: "paper",
            xanchor: "center",
            yanchor: "bottom",
            showarrow: false,
            font: AnnotationFont { size: 16 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traces_serialize_with_plotly_type_tag() {
        let trace = Trace::Scatter(ScatterTrace {
            x: vec![String::from("2024-01-02 00:00:00")],
            y: vec![1.5],
            mode: "lines+markers",
            name: String::from("Line Chart"),
            line: Line { color: "royalblue" },
            xaxis: "x",
            yaxis: "y",
        });

        let json = serde_json::to_value(&trace).expect("serialize");
        assert_eq!(json["type"], "scatter");
        assert_eq!(json["line"]["color"], "royalblue");
    }

    #[test]
    fn empty_figure_omits_axes() {
        let json = serde_json::to_value(Figure::empty()).expect("serialize");
        assert_eq!(json["data"], serde_json::json!([]));
        assert!(json["layout"].get("xaxis").is_none());
        assert!(json["layout"].get("annotations").is_none());
    }
}
