//! axum router and server loop for the dashboard.

use std::net::SocketAddr;

use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tickdash_core::{Fetcher, Interval, Period};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::presentation::{
    update_dashboard, DashboardQuery, DashboardView, DEFAULT_INTERVAL, DEFAULT_PERIOD,
    PRESET_TICKERS,
};

/// Bind address for the dashboard server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared, immutable handler state.
#[derive(Clone)]
pub struct AppState {
    fetcher: Fetcher,
}

impl AppState {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/dashboard", get(dashboard))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard until the process is stopped.
pub async fn serve(config: ServerConfig, fetcher: Fetcher) -> Result<(), ServerError> {
    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
    let local: SocketAddr = listener.local_addr()?;
    info!("dashboard listening on http://{local}");

    axum::serve(listener, router(AppState::new(fetcher))).await?;
    Ok(())
}

struct SelectOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage {
    presets: Vec<&'static str>,
    periods: Vec<SelectOption>,
    intervals: Vec<SelectOption>,
}

impl DashboardPage {
    fn new() -> Self {
        Self {
            presets: PRESET_TICKERS.to_vec(),
            periods: Period::ALL
                .iter()
                .map(|period| SelectOption {
                    value: period.as_str(),
                    label: period.label(),
                    selected: *period == DEFAULT_PERIOD,
                })
                .collect(),
            intervals: Interval::ALL
                .iter()
                .rev()
                .map(|interval| SelectOption {
                    value: interval.as_str(),
                    label: interval.label(),
                    selected: *interval == DEFAULT_INTERVAL,
                })
                .collect(),
        }
    }
}

async fn index() -> Response {
    match DashboardPage::new().render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render dashboard page");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardView> {
    let run_id = Uuid::new_v4();
    let view = update_dashboard(&state.fetcher, &query)
        .instrument(info_span!("dashboard_update", %run_id))
        .await;
    Json(view)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
