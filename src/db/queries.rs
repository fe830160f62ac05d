use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{DailyEvaluationRow, RuntimeStatusRow, SpotRow};
use crate::catalog::{self, Spot};
use crate::helpers::{dec_to_f64, f64_to_decimal_full};

/// One slot aggregate row, upserted on the (spot_id, slot_start) key.
pub struct ForecastSlotUpsert {
    pub spot_id: String,
    pub forecast_date: NaiveDate,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub wave_height_m: Decimal,
    pub wave_period_s: Decimal,
    pub wind_speed_ms: Decimal,
    pub wind_direction_deg: Decimal,
    pub score_beginner: Decimal,
    pub score_intermediate: Decimal,
    pub score_advanced: Decimal,
    pub batch_id: Uuid,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// One daily verdict row, upserted on the (spot_id, forecast_date, level) key.
pub struct DailyEvaluationUpsert {
    pub spot_id: String,
    pub forecast_date: NaiveDate,
    pub level: String,
    pub status: String,
    pub reason: String,
    pub score: Decimal,
    pub best_slot_start: Option<DateTime<Utc>>,
    pub best_slot_end: Option<DateTime<Utc>>,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

/// Upsert the static spot catalog into the spots table.
pub async fn seed_spots(pool: &PgPool, spots: &[Spot]) -> Result<(), sqlx::Error> {
    for spot in spots {
        sqlx::query(
            "INSERT INTO spots (id, name, latitude, longitude, sort_order)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 latitude = EXCLUDED.latitude,
                 longitude = EXCLUDED.longitude,
                 sort_order = EXCLUDED.sort_order",
        )
        .bind(&spot.id)
        .bind(&spot.name)
        .bind(f64_to_decimal_full(spot.latitude))
        .bind(f64_to_decimal_full(spot.longitude))
        .bind(spot.sort_order)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// All spots in display order, with offshore bearings joined back from the
/// catalog. Falls back to the catalog seeds if the table is empty.
pub async fn get_active_spots(pool: &PgPool) -> Result<Vec<Spot>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SpotRow>(
        "SELECT id, name, latitude, longitude, sort_order
         FROM spots
         ORDER BY sort_order",
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(catalog::spot_seeds());
    }

    Ok(rows
        .into_iter()
        .map(|row| Spot {
            offshore_direction_deg: catalog::offshore_direction_for(&row.id),
            id: row.id,
            name: row.name,
            latitude: dec_to_f64(row.latitude),
            longitude: dec_to_f64(row.longitude),
            sort_order: row.sort_order,
        })
        .collect())
}

/// Upsert slot aggregates; each cycle supersedes the previous values for
/// the same (spot, slot_start).
pub async fn upsert_forecast_slots(
    pool: &PgPool,
    rows: &[ForecastSlotUpsert],
) -> Result<(), sqlx::Error> {
    for row in rows {
        sqlx::query(
            "INSERT INTO forecast_slots (
                id, spot_id, forecast_date, slot_start, slot_end,
                wave_height_m, wave_period_s, wind_speed_ms, wind_direction_deg,
                score_beginner, score_intermediate, score_advanced,
                batch_id, source, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (spot_id, slot_start) DO UPDATE SET
                forecast_date = EXCLUDED.forecast_date,
                slot_end = EXCLUDED.slot_end,
                wave_height_m = EXCLUDED.wave_height_m,
                wave_period_s = EXCLUDED.wave_period_s,
                wind_speed_ms = EXCLUDED.wind_speed_ms,
                wind_direction_deg = EXCLUDED.wind_direction_deg,
                score_beginner = EXCLUDED.score_beginner,
                score_intermediate = EXCLUDED.score_intermediate,
                score_advanced = EXCLUDED.score_advanced,
                batch_id = EXCLUDED.batch_id,
                source = EXCLUDED.source,
                created_at = EXCLUDED.created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&row.spot_id)
        .bind(row.forecast_date)
        .bind(row.slot_start)
        .bind(row.slot_end)
        .bind(row.wave_height_m)
        .bind(row.wave_period_s)
        .bind(row.wind_speed_ms)
        .bind(row.wind_direction_deg)
        .bind(row.score_beginner)
        .bind(row.score_intermediate)
        .bind(row.score_advanced)
        .bind(row.batch_id)
        .bind(&row.source)
        .bind(row.created_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Upsert daily verdicts, one row per (spot, date, level).
pub async fn upsert_daily_evaluations(
    pool: &PgPool,
    rows: &[DailyEvaluationUpsert],
) -> Result<(), sqlx::Error> {
    for row in rows {
        sqlx::query(
            "INSERT INTO daily_evaluations (
                id, spot_id, forecast_date, level, status, reason, score,
                best_slot_start, best_slot_end, source, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (spot_id, forecast_date, level) DO UPDATE SET
                status = EXCLUDED.status,
                reason = EXCLUDED.reason,
                score = EXCLUDED.score,
                best_slot_start = EXCLUDED.best_slot_start,
                best_slot_end = EXCLUDED.best_slot_end,
                source = EXCLUDED.source,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&row.spot_id)
        .bind(row.forecast_date)
        .bind(&row.level)
        .bind(&row.status)
        .bind(&row.reason)
        .bind(row.score)
        .bind(row.best_slot_start)
        .bind(row.best_slot_end)
        .bind(&row.source)
        .bind(row.updated_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Record a successful refresh for a spot, clearing any prior error.
pub async fn mark_spot_success(
    pool: &PgPool,
    spot_id: &str,
    batch_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO spot_runtime_status (
            spot_id, last_success_at, last_error_at, last_error_message,
            last_batch_id, updated_at
        ) VALUES ($1, $2, NULL, NULL, $3, $2)
        ON CONFLICT (spot_id) DO UPDATE SET
            last_success_at = EXCLUDED.last_success_at,
            last_error_at = NULL,
            last_error_message = NULL,
            last_batch_id = EXCLUDED.last_batch_id,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(spot_id)
    .bind(at)
    .bind(batch_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a failed refresh for a spot, preserving the last success timestamp.
pub async fn mark_spot_error(
    pool: &PgPool,
    spot_id: &str,
    batch_id: Uuid,
    at: DateTime<Utc>,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO spot_runtime_status (
            spot_id, last_error_at, last_error_message, last_batch_id, updated_at
        ) VALUES ($1, $2, $3, $4, $2)
        ON CONFLICT (spot_id) DO UPDATE SET
            last_error_at = EXCLUDED.last_error_at,
            last_error_message = EXCLUDED.last_error_message,
            last_batch_id = EXCLUDED.last_batch_id,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(spot_id)
    .bind(at)
    .bind(message)
    .bind(batch_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Runtime status for every spot (at most one row per spot).
pub async fn get_runtime_statuses(pool: &PgPool) -> Result<Vec<RuntimeStatusRow>, sqlx::Error> {
    sqlx::query_as::<_, RuntimeStatusRow>(
        "SELECT spot_id, last_success_at, last_error_at, last_error_message,
                last_batch_id, updated_at
         FROM spot_runtime_status",
    )
    .fetch_all(pool)
    .await
}

/// Daily verdicts ordered newest-first; callers keep the first row they see
/// per (spot, level).
pub async fn get_latest_evaluations(pool: &PgPool) -> Result<Vec<DailyEvaluationRow>, sqlx::Error> {
    sqlx::query_as::<_, DailyEvaluationRow>(
        "SELECT spot_id, forecast_date, level, status, reason, score,
                best_slot_start, best_slot_end, updated_at
         FROM daily_evaluations
         ORDER BY forecast_date DESC, updated_at DESC",
    )
    .fetch_all(pool)
    .await
}
