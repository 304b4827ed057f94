//! Maintenance API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use vidfetch_core::SweepReport;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MaintenanceErrorResponse {
    pub error: String,
}

/// Run a retention sweep now.
pub async fn sweep(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepReport>, (StatusCode, Json<MaintenanceErrorResponse>)> {
    match state.retention().sweep().await {
        Ok(report) => {
            info!(
                "On-demand sweep removed {} files ({} failed)",
                report.removed, report.failed
            );
            Ok(Json(report))
        }
        Err(e) => {
            error!("On-demand sweep failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MaintenanceErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
