//! # Tickdash Web
//!
//! Interactive dashboard for a single ticker.
//!
//! [`presentation`] turns `(dropdown, ticker, interval, period)` into a
//! [`DashboardView`]: a Plotly figure (price line above candlesticks) and a
//! one-line summary. [`server`] exposes it over HTTP:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | Dashboard page |
//! | `GET /api/dashboard` | `DashboardView` JSON |
//! | `GET /health` | `{"status":"ok"}` |

pub mod figure;
pub mod presentation;
pub mod server;

pub use figure::Figure;
pub use presentation::{
    render, resolve_ticker, summary_stats, update_dashboard, DashboardQuery, DashboardView,
    PRESET_TICKERS,
};
pub use server::{router, serve, AppState, ServerConfig, ServerError};
