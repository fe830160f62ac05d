//! The forecast refresh cycle.
//!
//! One cycle = for every active spot, sequentially: fetch today's hourly
//! data, aggregate it into daylight slots, score every slot for every skill
//! level, persist the slot rows and daily verdicts, and record runtime
//! status. Each spot's pipeline is independently fallible: one spot's
//! provider/persistence failure is recorded against that spot only and the
//! cycle carries on. Failures *before* the per-spot loop (can't reach the
//! store at all) are setup errors and abort the whole cycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::{self, SkillLevel, Spot, PROVIDER_SOURCE};
use crate::db::queries::{self, DailyEvaluationUpsert, ForecastSlotUpsert};
use crate::errors::AppError;
use crate::helpers::{f64_to_decimal_1dp, f64_to_decimal_2dp};
use crate::services::evaluation::{evaluate_daily, evaluate_slot};
use crate::services::open_meteo::OpenMeteoClient;
use crate::services::slots::{build_slots, SlotAggregate};
use crate::time::jst_date;

/// Per-spot outcome of one refresh cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpotOutcome {
    pub spot_id: String,
    pub ok: bool,
    pub message: String,
}

/// Result of one full refresh cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub batch_id: Uuid,
    pub target_date: NaiveDate,
    pub results: Vec<SpotOutcome>,
}

impl CycleOutcome {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.ok).count()
    }
}

/// Run one refresh cycle for all active spots.
///
/// Returns `Err` only for setup errors; per-spot failures are reported in
/// the outcome list.
pub async fn run_refresh_cycle(
    pool: &PgPool,
    client: &OpenMeteoClient,
) -> Result<CycleOutcome, AppError> {
    let batch_id = Uuid::new_v4();
    let now = Utc::now();
    let target_date = jst_date(now);

    queries::seed_spots(pool, &catalog::spot_seeds()).await?;
    let spots = queries::get_active_spots(pool).await?;

    let mut results = Vec::with_capacity(spots.len());
    for spot in &spots {
        match process_spot(pool, client, spot, target_date, batch_id, now).await {
            Ok(message) => {
                tracing::info!("Refreshed spot {}: {}", spot.id, message);
                results.push(SpotOutcome {
                    spot_id: spot.id.clone(),
                    ok: true,
                    message,
                });
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("Refresh failed for spot {}: {}", spot.id, message);
                if let Err(status_err) =
                    queries::mark_spot_error(pool, &spot.id, batch_id, now, &message).await
                {
                    tracing::error!(
                        "Failed to record error status for spot {}: {}",
                        spot.id,
                        status_err
                    );
                }
                results.push(SpotOutcome {
                    spot_id: spot.id.clone(),
                    ok: false,
                    message,
                });
            }
        }
    }

    Ok(CycleOutcome {
        batch_id,
        target_date,
        results,
    })
}

/// Fetch, aggregate, score, and persist one spot. Returns a short summary
/// message for the outcome list.
async fn process_spot(
    pool: &PgPool,
    client: &OpenMeteoClient,
    spot: &Spot,
    target_date: NaiveDate,
    batch_id: Uuid,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let samples = client.fetch_day(spot, target_date).await?;
    let slots = build_slots(&spot.id, target_date, &samples);

    if slots.is_empty() {
        return Err(AppError::NoUsableData(
            "no usable hours in any daylight slot".to_string(),
        ));
    }

    let slot_rows = build_slot_rows(spot, &slots, batch_id, now);
    queries::upsert_forecast_slots(pool, &slot_rows).await?;

    let daily_rows = build_daily_rows(spot, target_date, &slots, now);
    queries::upsert_daily_evaluations(pool, &daily_rows).await?;

    queries::mark_spot_success(pool, &spot.id, batch_id, now).await?;

    Ok(format!("stored {} slots", slots.len()))
}

/// Slot upsert rows, each carrying the slot's score for every skill level.
fn build_slot_rows(
    spot: &Spot,
    slots: &[SlotAggregate],
    batch_id: Uuid,
    now: DateTime<Utc>,
) -> Vec<ForecastSlotUpsert> {
    slots
        .iter()
        .map(|slot| {
            let score_for = |level: SkillLevel| {
                evaluate_slot(
                    level,
                    catalog::threshold(level),
                    spot.offshore_direction_deg,
                    slot,
                )
                .score
            };

            ForecastSlotUpsert {
                spot_id: slot.spot_id.clone(),
                forecast_date: slot.forecast_date,
                slot_start: slot.slot_start,
                slot_end: slot.slot_end,
                wave_height_m: f64_to_decimal_2dp(slot.wave_height_m),
                wave_period_s: f64_to_decimal_2dp(slot.wave_period_s),
                wind_speed_ms: f64_to_decimal_2dp(slot.wind_speed_ms),
                wind_direction_deg: f64_to_decimal_1dp(slot.wind_direction_deg),
                score_beginner: f64_to_decimal_2dp(score_for(SkillLevel::Beginner)),
                score_intermediate: f64_to_decimal_2dp(score_for(SkillLevel::Intermediate)),
                score_advanced: f64_to_decimal_2dp(score_for(SkillLevel::Advanced)),
                batch_id,
                source: PROVIDER_SOURCE.to_string(),
                created_at: now,
            }
        })
        .collect()
}

/// Daily verdict rows, one per skill level.
fn build_daily_rows(
    spot: &Spot,
    target_date: NaiveDate,
    slots: &[SlotAggregate],
    now: DateTime<Utc>,
) -> Vec<DailyEvaluationUpsert> {
    SkillLevel::ALL
        .iter()
        .map(|level| {
            let daily = evaluate_daily(
                *level,
                catalog::threshold(*level),
                spot.offshore_direction_deg,
                slots,
            );

            DailyEvaluationUpsert {
                spot_id: spot.id.clone(),
                forecast_date: target_date,
                level: level.as_str().to_string(),
                status: daily.status.as_str().to_string(),
                reason: daily.reason.to_string(),
                score: f64_to_decimal_2dp(daily.score),
                best_slot_start: daily.best_slot_start,
                best_slot_end: daily.best_slot_end,
                source: PROVIDER_SOURCE.to_string(),
                updated_at: now,
            }
        })
        .collect()
}
