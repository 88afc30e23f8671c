use serde::Serialize;
use ts_rs::TS;

use crate::route_warnings::RouteWarning;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Unmatched route recorded by the router fallback.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/route-warning-response.ts"
)]
pub struct RouteWarningResponse {
    pub method: String,
    pub path: String,
    pub hits: u32,
    pub first_seen_at: String,
    pub last_seen_at: String,
}

impl From<RouteWarning> for RouteWarningResponse {
    fn from(value: RouteWarning) -> Self {
        Self {
            method: value.method,
            path: value.path,
            hits: u32::try_from(value.hits).unwrap_or(u32::MAX),
            first_seen_at: value.first_seen_at.to_rfc3339(),
            last_seen_at: value.last_seen_at.to_rfc3339(),
        }
    }
}
