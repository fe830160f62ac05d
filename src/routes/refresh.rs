//! Refresh trigger HTTP endpoint.
//!
//! POST /api/v1/refresh runs one refresh cycle on demand. Intended for an
//! external scheduler; optionally protected with a bearer token. Replies
//! 200 when every spot succeeded and 207 Multi-Status when at least one
//! spot failed; setup errors (store unreachable) surface as a single
//! top-level 500.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, ErrorResponse};
use crate::services::open_meteo::OpenMeteoClient;
use crate::services::refresh::{run_refresh_cycle, SpotOutcome};

/// Shared application state for the refresh endpoint.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pool: PgPool,
    pub(crate) client: OpenMeteoClient,
    pub(crate) refresh_secret: Option<String>,
}

/// Refresh trigger response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// True when every spot refreshed successfully
    pub ok: bool,
    /// Batch id shared by all rows written in this cycle
    pub batch_id: Uuid,
    /// JST calendar date the cycle refreshed
    pub target_date: NaiveDate,
    /// Per-spot outcomes, in display order
    pub results: Vec<SpotOutcome>,
}

/// Trigger one refresh cycle for all spots.
///
/// Each spot is fetched, aggregated, scored, and persisted independently;
/// a failing spot is reported in `results` without aborting the others.
#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    tag = "Refresh",
    responses(
        (status = 200, description = "All spots refreshed", body = RefreshResponse),
        (status = 207, description = "At least one spot failed", body = RefreshResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 500, description = "Setup error before any spot was processed", body = ErrorResponse),
    )
)]
pub async fn trigger_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<RefreshResponse>), AppError> {
    authorize(&headers, state.refresh_secret.as_deref())?;

    let outcome = run_refresh_cycle(&state.pool, &state.client).await?;
    let ok = outcome.all_ok();
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((
        status,
        Json(RefreshResponse {
            ok,
            batch_id: outcome.batch_id,
            target_date: outcome.target_date,
            results: outcome.results,
        }),
    ))
}

/// Check the bearer token. No configured secret means the endpoint is open.
fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<(), AppError> {
    let Some(secret) = secret else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(value) if value == format!("Bearer {}", secret) => Ok(()),
        _ => Err(AppError::Unauthorized(
            "missing or invalid refresh token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(header::AUTHORIZATION, v.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_no_secret_allows_everything() {
        assert!(authorize(&headers_with(None), None).is_ok());
        assert!(authorize(&headers_with(Some("Bearer whatever")), None).is_ok());
    }

    #[test]
    fn test_matching_bearer_token_is_accepted() {
        let headers = headers_with(Some("Bearer sekrit"));
        assert!(authorize(&headers, Some("sekrit")).is_ok());
    }

    #[test]
    fn test_missing_or_wrong_token_is_rejected() {
        assert!(matches!(
            authorize(&headers_with(None), Some("sekrit")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&headers_with(Some("Bearer nope")), Some("sekrit")),
            Err(AppError::Unauthorized(_))
        ));
        // Scheme must be Bearer.
        assert!(matches!(
            authorize(&headers_with(Some("sekrit")), Some("sekrit")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
