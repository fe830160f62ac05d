//! Dashboard assembly.
//!
//! Merges the spot catalog, runtime health rows, and the latest persisted
//! daily verdicts into one presentation-ready structure. The read path
//! never surfaces errors: anything that goes wrong collapses into a static
//! fallback where every spot is stale and every level unavailable.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::catalog::{self, SkillLevel, Spot, STALE_LIMIT_HOURS};
use crate::db::models::{DailyEvaluationRow, RuntimeStatusRow};
use crate::db::queries;
use crate::errors::AppError;
use crate::helpers::{dec_to_f64, round1};
use crate::services::evaluation::SurfStatus;
use crate::time::{format_jst_time_range, hours_since, jst_date};

const REASON_NOT_YET_AVAILABLE: &str = "Forecast data is not available yet.";

/// Three-way dashboard decision: the stored go/tough verdict, widened with
/// "unavailable" for spots or levels with no usable row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SpotDecision {
    Go,
    Tough,
    Unavailable,
}

/// Operational warnings for one spot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpotWarnings {
    /// The most recent refresh attempt failed
    pub has_update_error: bool,
    /// Message from the last failed refresh, if any
    pub error_message: Option<String>,
    /// No successful refresh within the staleness limit
    pub is_stale: bool,
    /// Hours since the last successful refresh (1 decimal), if any
    pub hours_since_success: Option<f64>,
    /// Last successful refresh (ISO 8601)
    pub last_success_at: Option<String>,
}

/// One skill level's view of a spot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpotLevelView {
    pub level: SkillLevel,
    pub decision: SpotDecision,
    pub reason: String,
    pub score: Option<f64>,
    /// Best slot window as a JST label, e.g. "06:00 - 09:00"
    pub best_slot_label: Option<String>,
    /// When this verdict was computed (ISO 8601)
    pub updated_at: Option<String>,
}

/// One spot's dashboard entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpotDashboardItem {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub warnings: SpotWarnings,
    pub levels: Vec<SpotLevelView>,
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardData {
    /// JST calendar date the dashboard refers to
    pub date: String,
    /// When this payload was assembled (ISO 8601)
    pub generated_at: String,
    pub spots: Vec<SpotDashboardItem>,
}

/// Load and assemble the dashboard, degrading to the fallback on any error.
pub async fn load_dashboard(pool: &PgPool) -> DashboardData {
    let now = Utc::now();
    match try_load(pool, now).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("Dashboard read failed, serving fallback: {}", e);
            fallback(now)
        }
    }
}

async fn try_load(pool: &PgPool, now: DateTime<Utc>) -> Result<DashboardData, AppError> {
    let spots = queries::get_active_spots(pool).await?;
    let runtime_rows = queries::get_runtime_statuses(pool).await?;
    let eval_rows = queries::get_latest_evaluations(pool).await?;
    Ok(assemble(&spots, &runtime_rows, &eval_rows, now))
}

/// Pure assembly over already-loaded rows.
pub(crate) fn assemble(
    spots: &[Spot],
    runtime_rows: &[RuntimeStatusRow],
    eval_rows: &[DailyEvaluationRow],
    now: DateTime<Utc>,
) -> DashboardData {
    let runtime_by_spot: HashMap<&str, &RuntimeStatusRow> = runtime_rows
        .iter()
        .map(|row| (row.spot_id.as_str(), row))
        .collect();

    // Rows arrive newest-first; keep the first row per (spot, level).
    let mut latest_eval: HashMap<(&str, &str), &DailyEvaluationRow> = HashMap::new();
    for row in eval_rows {
        latest_eval
            .entry((row.spot_id.as_str(), row.level.as_str()))
            .or_insert(row);
    }

    let spots = spots
        .iter()
        .map(|spot| SpotDashboardItem {
            id: spot.id.clone(),
            name: spot.name.clone(),
            latitude: spot.latitude,
            longitude: spot.longitude,
            warnings: build_warnings(runtime_by_spot.get(spot.id.as_str()).copied(), now),
            levels: SkillLevel::ALL
                .iter()
                .map(|level| build_level_view(*level, latest_eval.get(&(spot.id.as_str(), level.as_str())).copied()))
                .collect(),
        })
        .collect();

    DashboardData {
        date: jst_date(now).to_string(),
        generated_at: now.to_rfc3339(),
        spots,
    }
}

fn build_warnings(runtime: Option<&RuntimeStatusRow>, now: DateTime<Utc>) -> SpotWarnings {
    let last_success_at = runtime.and_then(|r| r.last_success_at);
    let hours = last_success_at.map(|t| hours_since(t, now));
    let has_update_error = runtime.is_some_and(|r| match (r.last_error_at, r.last_success_at) {
        (Some(error_at), Some(success_at)) => error_at > success_at,
        (Some(_), None) => true,
        (None, _) => false,
    });

    SpotWarnings {
        has_update_error,
        error_message: runtime.and_then(|r| r.last_error_message.clone()),
        is_stale: hours.map_or(true, |h| h > STALE_LIMIT_HOURS),
        hours_since_success: hours.map(round1),
        last_success_at: last_success_at.map(|t| t.to_rfc3339()),
    }
}

fn build_level_view(level: SkillLevel, row: Option<&DailyEvaluationRow>) -> SpotLevelView {
    let Some(row) = row else {
        return SpotLevelView {
            level,
            decision: SpotDecision::Unavailable,
            reason: REASON_NOT_YET_AVAILABLE.to_string(),
            score: None,
            best_slot_label: None,
            updated_at: None,
        };
    };

    let decision = match SurfStatus::parse(&row.status) {
        Some(SurfStatus::Go) => SpotDecision::Go,
        Some(SurfStatus::Tough) => SpotDecision::Tough,
        None => SpotDecision::Unavailable,
    };

    SpotLevelView {
        level,
        decision,
        reason: row.reason.clone(),
        score: Some(dec_to_f64(row.score)),
        best_slot_label: match (row.best_slot_start, row.best_slot_end) {
            (Some(start), Some(end)) => Some(format_jst_time_range(start, end)),
            _ => None,
        },
        updated_at: Some(row.updated_at.to_rfc3339()),
    }
}

/// Static degraded view: catalog spots, everything stale and unavailable.
pub(crate) fn fallback(now: DateTime<Utc>) -> DashboardData {
    let spots = catalog::spot_seeds()
        .into_iter()
        .map(|spot| SpotDashboardItem {
            id: spot.id,
            name: spot.name,
            latitude: spot.latitude,
            longitude: spot.longitude,
            warnings: SpotWarnings {
                has_update_error: false,
                error_message: None,
                is_stale: true,
                hours_since_success: None,
                last_success_at: None,
            },
            levels: SkillLevel::ALL
                .iter()
                .map(|level| build_level_view(*level, None))
                .collect(),
        })
        .collect();

    DashboardData {
        date: jst_date(now).to_string(),
        generated_at: now.to_rfc3339(),
        spots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn now() -> DateTime<Utc> {
        "2026-08-07T03:00:00Z".parse().unwrap()
    }

    fn runtime_row(
        spot_id: &str,
        last_success_at: Option<&str>,
        last_error_at: Option<&str>,
        message: Option<&str>,
    ) -> RuntimeStatusRow {
        RuntimeStatusRow {
            spot_id: spot_id.to_string(),
            last_success_at: last_success_at.map(|s| s.parse().unwrap()),
            last_error_at: last_error_at.map(|s| s.parse().unwrap()),
            last_error_message: message.map(|s| s.to_string()),
            last_batch_id: None,
            updated_at: now(),
        }
    }

    fn eval_row(spot_id: &str, level: &str, date: &str, score: &str) -> DailyEvaluationRow {
        DailyEvaluationRow {
            spot_id: spot_id.to_string(),
            forecast_date: NaiveDate::from_str(date).unwrap(),
            level: level.to_string(),
            status: "go".to_string(),
            reason: "Wave size, period, and wind are in good balance.".to_string(),
            score: Decimal::from_str(score).unwrap(),
            best_slot_start: Some("2026-08-06T21:00:00Z".parse().unwrap()),
            best_slot_end: Some("2026-08-07T00:00:00Z".parse().unwrap()),
            updated_at: "2026-08-07T01:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_fresh_spot_has_no_warnings() {
        let spots = catalog::spot_seeds();
        let runtime = vec![runtime_row("komatsu", Some("2026-08-07T01:00:00Z"), None, None)];
        let evals = vec![eval_row("komatsu", "intermediate", "2026-08-07", "3.00")];

        let data = assemble(&spots, &runtime, &evals, now());
        let komatsu = &data.spots[0];

        assert_eq!(komatsu.id, "komatsu");
        assert!(!komatsu.warnings.has_update_error);
        assert!(!komatsu.warnings.is_stale);
        assert_eq!(komatsu.warnings.hours_since_success, Some(2.0));

        let intermediate = komatsu
            .levels
            .iter()
            .find(|v| v.level == SkillLevel::Intermediate)
            .unwrap();
        assert_eq!(intermediate.decision, SpotDecision::Go);
        assert_eq!(intermediate.score, Some(3.0));
        // 21:00Z/00:00Z render as a JST daylight window.
        assert_eq!(intermediate.best_slot_label.as_deref(), Some("06:00 - 09:00"));
    }

    #[test]
    fn test_error_newer_than_success_raises_flag() {
        let spots = catalog::spot_seeds();
        let runtime = vec![runtime_row(
            "komatsu",
            Some("2026-08-06T01:00:00Z"),
            Some("2026-08-07T02:00:00Z"),
            Some("weather API returned HTTP 502"),
        )];

        let data = assemble(&spots, &runtime, &[], now());
        let warnings = &data.spots[0].warnings;

        assert!(warnings.has_update_error);
        assert_eq!(
            warnings.error_message.as_deref(),
            Some("weather API returned HTTP 502")
        );
        // Success is 26h old → stale too.
        assert!(warnings.is_stale);
        assert_eq!(warnings.hours_since_success, Some(26.0));
    }

    #[test]
    fn test_success_newer_than_error_clears_flag() {
        let spots = catalog::spot_seeds();
        let runtime = vec![runtime_row(
            "komatsu",
            Some("2026-08-07T02:00:00Z"),
            Some("2026-08-06T02:00:00Z"),
            Some("stale message"),
        )];

        let data = assemble(&spots, &runtime, &[], now());
        assert!(!data.spots[0].warnings.has_update_error);
    }

    #[test]
    fn test_spot_without_runtime_row_is_stale() {
        let spots = catalog::spot_seeds();
        let data = assemble(&spots, &[], &[], now());

        for spot in &data.spots {
            assert!(spot.warnings.is_stale);
            assert_eq!(spot.warnings.hours_since_success, None);
            assert!(!spot.warnings.has_update_error);
        }
    }

    #[test]
    fn test_missing_evaluation_rows_map_to_unavailable() {
        let spots = catalog::spot_seeds();
        let data = assemble(&spots, &[], &[], now());

        for spot in &data.spots {
            assert_eq!(spot.levels.len(), SkillLevel::ALL.len());
            for view in &spot.levels {
                assert_eq!(view.decision, SpotDecision::Unavailable);
                assert_eq!(view.reason, REASON_NOT_YET_AVAILABLE);
                assert_eq!(view.score, None);
            }
        }
    }

    #[test]
    fn test_newest_row_wins_per_spot_and_level() {
        let spots = catalog::spot_seeds();
        // get_latest_evaluations orders newest-first; assemble keeps the first.
        let evals = vec![
            eval_row("komatsu", "beginner", "2026-08-07", "2.50"),
            eval_row("komatsu", "beginner", "2026-08-06", "1.00"),
        ];

        let data = assemble(&spots, &[], &evals, now());
        let beginner = data.spots[0]
            .levels
            .iter()
            .find(|v| v.level == SkillLevel::Beginner)
            .unwrap();
        assert_eq!(beginner.score, Some(2.5));
    }

    #[test]
    fn test_fallback_is_fully_degraded() {
        let data = fallback(now());

        assert_eq!(data.spots.len(), catalog::spot_seeds().len());
        assert_eq!(data.date, "2026-08-07");
        for spot in &data.spots {
            assert!(spot.warnings.is_stale);
            assert!(!spot.warnings.has_update_error);
            for view in &spot.levels {
                assert_eq!(view.decision, SpotDecision::Unavailable);
            }
        }
    }
}
