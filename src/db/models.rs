use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// A surf spot row. Offshore bearing is intentionally absent; it is joined
/// back from the static catalog on read.
#[derive(Debug, Clone, FromRow)]
pub struct SpotRow {
    pub id: String,
    pub name: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub sort_order: i32,
}

/// Operational health for one spot, overwritten once per refresh cycle.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some accessed only via dashboard assembly
pub struct RuntimeStatusRow {
    pub spot_id: String,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
    pub last_batch_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// One persisted daily verdict for a (spot, date, level) key.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // forecast_date is part of the upsert key, ordered on in SQL only
pub struct DailyEvaluationRow {
    pub spot_id: String,
    pub forecast_date: NaiveDate,
    pub level: String,
    pub status: String,
    pub reason: String,
    pub score: Decimal,
    pub best_slot_start: Option<DateTime<Utc>>,
    pub best_slot_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
