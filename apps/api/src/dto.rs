use chrono::{DateTime, Utc};
use culler_application::RepositorySweepReport;
use serde::Serialize;
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Result of an on-demand repository sweep.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SweepResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages_dispatched: Option<usize>,
}

impl SweepResponse {
    pub fn skipped() -> Self {
        Self {
            status: "skipped",
            sweep_id: None,
            invocation_time: None,
            packages_dispatched: None,
        }
    }
}

impl From<RepositorySweepReport> for SweepResponse {
    fn from(report: RepositorySweepReport) -> Self {
        Self {
            status: "dispatched",
            sweep_id: Some(report.sweep_id),
            invocation_time: Some(report.invocation_time),
            packages_dispatched: Some(report.packages_dispatched),
        }
    }
}
