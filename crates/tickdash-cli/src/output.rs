//! JSON report written to stdout for every data-producing command.

use serde::Serialize;
use serde_json::Value;
use tickdash_core::UtcDateTime;
use uuid::Uuid;

use crate::error::CliError;

/// Command result plus run metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub run_id: Uuid,
    pub command: &'static str,
    pub source: &'static str,
    pub generated_at: UtcDateTime,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new(run_id: Uuid, command: &'static str, source: &'static str, data: Value) -> Self {
        Self {
            meta: ReportMeta {
                run_id,
                command,
                source,
                generated_at: UtcDateTime::now(),
                latency_ms: 0,
                warnings: Vec::new(),
            },
            data,
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.meta.latency_ms = latency_ms;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.meta.warnings.push(warning.into());
        self
    }
}

pub fn render(report: &Report, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{payload}");
    Ok(())
}
