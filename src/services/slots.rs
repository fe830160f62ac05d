//! Slot aggregation: hourly samples → fixed daylight windows.
//!
//! A day is partitioned into four contiguous 3-hour windows covering
//! 06:00–18:00 JST. Each window averages the hours that fall inside it and
//! carry all four measurements; windows with no such hours are omitted, so
//! a day yields 0..=4 slots. Rounding happens exactly once, here (2
//! decimals for magnitudes, 1 decimal for direction); downstream code
//! never re-rounds.

use chrono::{DateTime, NaiveDate, Utc};

use crate::helpers::{round1, round2};
use crate::services::open_meteo::HourlySample;
use crate::time::jst_instant;

pub const DAYLIGHT_START_HOUR: u32 = 6;
pub const DAYLIGHT_END_HOUR: u32 = 18;
pub const SLOT_WIDTH_HOURS: u32 = 3;

/// One time window's averaged conditions for one spot on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAggregate {
    pub spot_id: String,
    pub forecast_date: NaiveDate,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub wave_height_m: f64,
    pub wave_period_s: f64,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: f64,
}

/// Aggregate a day's hourly samples into daylight slots.
///
/// Hours missing any of the four fields are excluded from every window,
/// never treated as zero.
pub fn build_slots(spot_id: &str, date: NaiveDate, samples: &[HourlySample]) -> Vec<SlotAggregate> {
    let complete: Vec<(u32, f64, f64, f64, f64)> = samples
        .iter()
        .filter_map(|s| {
            match (
                s.wave_height_m,
                s.wave_period_s,
                s.wind_speed_ms,
                s.wind_direction_deg,
            ) {
                (Some(height), Some(period), Some(speed), Some(direction)) => {
                    Some((s.hour, height, period, speed, direction))
                }
                _ => None,
            }
        })
        .collect();

    let mut slots = Vec::new();
    let mut start_hour = DAYLIGHT_START_HOUR;
    while start_hour < DAYLIGHT_END_HOUR {
        let end_hour = start_hour + SLOT_WIDTH_HOURS;
        let window: Vec<&(u32, f64, f64, f64, f64)> = complete
            .iter()
            .filter(|(hour, ..)| *hour >= start_hour && *hour < end_hour)
            .collect();

        if !window.is_empty() {
            let heights: Vec<f64> = window.iter().map(|(_, h, ..)| *h).collect();
            let periods: Vec<f64> = window.iter().map(|(_, _, p, ..)| *p).collect();
            let speeds: Vec<f64> = window.iter().map(|(_, _, _, w, _)| *w).collect();
            let directions: Vec<f64> = window.iter().map(|(.., d)| *d).collect();

            slots.push(SlotAggregate {
                spot_id: spot_id.to_string(),
                forecast_date: date,
                slot_start: jst_instant(date, start_hour),
                slot_end: jst_instant(date, end_hour),
                wave_height_m: round2(mean(&heights)),
                wave_period_s: round2(mean(&periods)),
                wind_speed_ms: round2(mean(&speeds)),
                wind_direction_deg: round1(mean_direction(&directions)) % 360.0,
            });
        }

        start_hour = end_hour;
    }

    slots
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Circular mean of compass directions, in [0, 360).
///
/// Each direction becomes a unit vector on the compass circle; the vector
/// components are averaged and converted back through atan2, so 350° and
/// 10° average to 0°, not 180°.
fn mean_direction(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    for deg in values {
        let rad = deg.to_radians();
        x += rad.cos();
        y += rad.sin();
    }
    (y / n).atan2(x / n).to_degrees().rem_euclid(360.0)
}
