//! Open-Meteo client.
//!
//! Fetches one JST day of hourly data from two endpoints, the weather API
//! (wind speed/direction at 10 m) and the marine API (wave height/period),
//! and merges them by timestamp into per-hour samples. Field absence is a
//! first-class state: the provider may omit whole arrays or null individual
//! hours, and a sample keeps `None` for whatever is missing so the slot
//! aggregator can filter on completeness.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::catalog::Spot;
use crate::errors::AppError;

const WEATHER_BASE_URL: &str = "https://api.open-meteo.com";
const MARINE_BASE_URL: &str = "https://marine-api.open-meteo.com";

const WEATHER_PATH: &str = "/v1/forecast";
const MARINE_PATH: &str = "/v1/marine";

/// Client for the Open-Meteo weather and marine forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    weather_base: String,
    marine_base: String,
}

/// One merged forecast hour. `hour` is the JST wall-clock hour parsed from
/// the provider's local timestamp; measurement fields stay optional.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySample {
    pub hour: u32,
    pub wave_height_m: Option<f64>,
    pub wave_period_s: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub wind_direction_deg: Option<f64>,
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HourlyBlock {
    #[serde(default)]
    pub(crate) time: Vec<String>,
    #[serde(default)]
    pub(crate) wave_height: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub(crate) wave_period: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub(crate) wind_speed_10m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub(crate) wind_direction_10m: Option<Vec<Option<f64>>>,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self::with_bases(WEATHER_BASE_URL.to_string(), MARINE_BASE_URL.to_string())
    }

    /// Client with custom base URLs (tests point this at a mock server).
    pub fn with_bases(weather_base: String, marine_base: String) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            weather_base,
            marine_base,
        }
    }

    /// Fetch and merge all hourly samples for one spot on one JST date.
    pub async fn fetch_day(
        &self,
        spot: &Spot,
        date: NaiveDate,
    ) -> Result<Vec<HourlySample>, AppError> {
        let date_str = date.to_string();
        let lat = format!("{:.4}", spot.latitude);
        let lon = format!("{:.4}", spot.longitude);

        let weather_query = [
            ("latitude", lat.as_str()),
            ("longitude", lon.as_str()),
            ("hourly", "wind_speed_10m,wind_direction_10m"),
            ("wind_speed_unit", "ms"),
            ("timezone", "Asia/Tokyo"),
            ("start_date", date_str.as_str()),
            ("end_date", date_str.as_str()),
        ];
        let marine_query = [
            ("latitude", lat.as_str()),
            ("longitude", lon.as_str()),
            ("hourly", "wave_height,wave_period"),
            ("timezone", "Asia/Tokyo"),
            ("start_date", date_str.as_str()),
            ("end_date", date_str.as_str()),
        ];

        let weather_url = format!("{}{}", self.weather_base, WEATHER_PATH);
        let marine_url = format!("{}{}", self.marine_base, MARINE_PATH);

        let (weather, marine) = futures::future::try_join(
            self.get_hourly(&weather_url, &weather_query, "weather API"),
            self.get_hourly(&marine_url, &marine_query, "marine API"),
        )
        .await?;

        Ok(merge_hourly(&weather, &marine))
    }

    async fn get_hourly(
        &self,
        url: &str,
        query: &[(&str, &str)],
        source: &str,
    ) -> Result<HourlyBlock, AppError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("{} request failed: {}", source, e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "{} returned HTTP {}",
                source,
                response.status()
            )));
        }

        let body: OpenMeteoResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("{} JSON parse error: {}", source, e))
        })?;

        body.hourly.ok_or_else(|| {
            AppError::ExternalServiceError(format!("{} response is missing hourly data", source))
        })
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Join weather and marine hourly arrays on their local timestamps.
///
/// Pure function: no I/O. Hours whose timestamp cannot be parsed are
/// dropped entirely; everything else becomes a sample with `None` for each
/// missing field.
pub(crate) fn merge_hourly(weather: &HourlyBlock, marine: &HourlyBlock) -> Vec<HourlySample> {
    let mut marine_by_time: HashMap<&str, (Option<f64>, Option<f64>)> = HashMap::new();
    for (i, time) in marine.time.iter().enumerate() {
        marine_by_time.insert(
            time.as_str(),
            (
                value_at(&marine.wave_height, i),
                value_at(&marine.wave_period, i),
            ),
        );
    }

    let mut merged = Vec::with_capacity(weather.time.len());
    for (i, time) in weather.time.iter().enumerate() {
        let Some(hour) = parse_hour(time) else {
            continue;
        };
        let (wave_height_m, wave_period_s) = marine_by_time
            .get(time.as_str())
            .copied()
            .unwrap_or((None, None));

        merged.push(HourlySample {
            hour,
            wave_height_m,
            wave_period_s,
            wind_speed_ms: value_at(&weather.wind_speed_10m, i),
            wind_direction_deg: value_at(&weather.wind_direction_10m, i),
        });
    }

    merged
}

fn value_at(series: &Option<Vec<Option<f64>>>, index: usize) -> Option<f64> {
    series.as_ref().and_then(|v| v.get(index).copied().flatten())
}

/// Parse the hour from a local ISO-like timestamp ("2026-08-07T06:00").
fn parse_hour(local_iso: &str) -> Option<u32> {
    local_iso.get(11..13)?.parse().ok()
}
