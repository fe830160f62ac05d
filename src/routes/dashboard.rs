//! Dashboard HTTP endpoint.
//!
//! GET /api/v1/dashboard returns the assembled per-spot, per-level view.
//! Always answers 200: read failures degrade to the static fallback inside
//! the service layer.

use axum::extract::State;
use axum::Json;
use sqlx::PgPool;

use crate::services::dashboard::{load_dashboard, DashboardData};

/// Get the surf dashboard for all spots.
///
/// Never fails: if the store is unreachable, every spot is returned as
/// stale/unavailable instead of an error.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Current dashboard (possibly degraded)", body = DashboardData),
    )
)]
pub async fn get_dashboard(State(pool): State<PgPool>) -> Json<DashboardData> {
    Json(load_dashboard(&pool).await)
}
