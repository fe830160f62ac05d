//! Scheduler status HTTP endpoint.
//!
//! GET /api/v1/scheduler/status returns the current state of the
//! background refresh scheduler as JSON.

use axum::extract::State;
use axum::Json;

use crate::services::scheduler::{SchedulerState, SharedSchedulerState};

/// Get the current scheduler status.
///
/// Returns per-spot outcomes of the last cycle and global info
/// (next_wakeup_at, last_cycle_completed_at, total_cycles, active).
#[utoipa::path(
    get,
    path = "/api/v1/scheduler/status",
    tag = "Scheduler",
    responses(
        (status = 200, description = "Current scheduler status", body = SchedulerState),
    )
)]
pub async fn get_scheduler_status(
    State(state): State<SharedSchedulerState>,
) -> Json<SchedulerState> {
    let s = state.read().await;
    Json(s.clone())
}
