//! Background refresh scheduler.
//!
//! Runs the refresh cycle on a fixed interval so the dashboard stays
//! populated even when no external trigger fires. State is in-memory
//! (`Arc<RwLock<SchedulerState>>`) and exposed via the status endpoint; on
//! restart the first cycle simply runs again; the storage layer's upserts
//! make that safe.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::open_meteo::OpenMeteoClient;
use crate::services::refresh::{self, SpotOutcome};

/// Sleep after a cycle-fatal setup error (seconds).
const SETUP_ERROR_RETRY_SECS: u64 = 300;

/// Global scheduler state, exposed via the status endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchedulerState {
    pub active: bool,
    pub next_wakeup_at: Option<DateTime<Utc>>,
    pub last_cycle_completed_at: Option<DateTime<Utc>>,
    pub last_cycle_duration_ms: Option<u64>,
    pub total_cycles: u64,
    pub last_batch_id: Option<Uuid>,
    /// Setup error from the last cycle, if it never reached the spot loop.
    pub last_setup_error: Option<String>,
    pub spots: Vec<SpotOutcome>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self {
            active: true,
            next_wakeup_at: None,
            last_cycle_completed_at: None,
            last_cycle_duration_ms: None,
            total_cycles: 0,
            last_batch_id: None,
            last_setup_error: None,
            spots: Vec::new(),
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared scheduler state handle.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Run the background scheduler. Never returns; spawn via `tokio::spawn`.
pub async fn run_scheduler(
    pool: PgPool,
    client: OpenMeteoClient,
    state: SharedSchedulerState,
    interval_secs: u64,
) {
    tracing::info!("Refresh scheduler started (interval {}s)", interval_secs);

    loop {
        let cycle_start = Utc::now();

        let sleep_secs = match refresh::run_refresh_cycle(&pool, &client).await {
            Ok(outcome) => {
                let duration_ms = (Utc::now() - cycle_start).num_milliseconds().max(0) as u64;
                tracing::info!(
                    "Refresh cycle {} complete in {}ms ({} spots, {} failed)",
                    outcome.batch_id,
                    duration_ms,
                    outcome.results.len(),
                    outcome.failed_count(),
                );

                let mut s = state.write().await;
                s.last_cycle_completed_at = Some(Utc::now());
                s.last_cycle_duration_ms = Some(duration_ms);
                s.total_cycles += 1;
                s.last_batch_id = Some(outcome.batch_id);
                s.last_setup_error = None;
                s.spots = outcome.results;
                interval_secs
            }
            Err(e) => {
                tracing::error!("Refresh cycle setup error: {}", e);
                let mut s = state.write().await;
                s.last_setup_error = Some(e.to_string());
                SETUP_ERROR_RETRY_SECS
            }
        };

        {
            let mut s = state.write().await;
            s.next_wakeup_at = Some(Utc::now() + Duration::seconds(sleep_secs as i64));
        }

        tokio::time::sleep(std::time::Duration::from_secs(sleep_secs)).await;
    }
}
