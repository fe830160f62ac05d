//! Suitability scoring: slot evaluation and daily selection.
//!
//! Pure functions from aggregated slots to verdicts. Three dimension
//! sub-scores (wave height, period, wind) each land in {0, 0.5, 1}; the
//! wind sub-score is the minimum of a speed component and a direction
//! component derived from the spot's offshore bearing. A hard-fail
//! predicate can force a "tough" verdict regardless of the total score.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{SkillLevel, Threshold};
use crate::helpers::round2;
use crate::services::slots::SlotAggregate;

/// Total score at or above this is a "go" (absent a hard fail).
pub const GO_SCORE_THRESHOLD: f64 = 2.2;

/// The "balanced conditions" reason uses its own, slightly looser gate.
const BALANCED_REASON_THRESHOLD: f64 = 2.0;

/// Wind speed this far above max+grace is a hard fail (m/s).
const WIND_HARD_FAIL_MARGIN_MS: f64 = 1.5;

/// Wave height this far above max+grace is a hard fail (m).
const WAVE_HARD_FAIL_MARGIN_M: f64 = 0.5;

/// Minimum wind speed for the onshore-direction hard fail (m/s).
const ONSHORE_HARD_FAIL_SPEED_MS: f64 = 4.5;

/// Arc around the onshore bearing that forces the direction component to 0.
const ONSHORE_ARC_DEG: f64 = 25.0;

pub const REASON_WIND_HARD_FAIL: &str = "Wind is far too strong for a workable session.";
pub const REASON_ONSHORE_HARD_FAIL: &str = "Strong onshore wind will crumble the wave faces.";
pub const REASON_WAVE_HARD_FAIL: &str = "Surf is too big to be manageable.";
pub const REASON_BALANCED: &str = "Wave size, period, and wind are in good balance.";
pub const REASON_WAVE_TOO_SMALL: &str = "Waves are too small and lack push.";
pub const REASON_PERIOD_TOO_SHORT: &str = "Swell period is short and disorganized.";
pub const REASON_WIND_TOO_STRONG: &str = "Wind is on the strong side and chops the surface.";
pub const REASON_DIRECTION_MISMATCH: &str = "Wind direction works against clean faces.";
pub const REASON_UNSTABLE: &str = "Conditions are unsettled and hard to line up.";
pub const REASON_INSUFFICIENT_DATA: &str = "Not enough usable forecast data for this day.";

/// Binary slot/day verdict. The dashboard widens this to a three-way
/// decision by adding "unavailable" for missing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SurfStatus {
    Go,
    Tough,
}

impl SurfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfStatus::Go => "go",
            SurfStatus::Tough => "tough",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "go" => Some(SurfStatus::Go),
            "tough" => Some(SurfStatus::Tough),
            _ => None,
        }
    }
}

/// Result of scoring one slot against one skill level.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLevelEvaluation {
    pub level: SkillLevel,
    pub score: f64,
    pub status: SurfStatus,
    pub reason: &'static str,
}

/// The best slot's verdict for a spot/level/date, with a pointer to the
/// winning slot (absent when the day had no slots).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyLevelEvaluation {
    pub level: SkillLevel,
    pub status: SurfStatus,
    pub reason: &'static str,
    pub score: f64,
    pub best_slot_start: Option<DateTime<Utc>>,
    pub best_slot_end: Option<DateTime<Utc>>,
}

/// 1 inside [min, max], 0.5 inside the grace-widened band (inclusive), else 0.
fn range_score(value: f64, min: f64, max: f64, grace: f64) -> f64 {
    if value >= min && value <= max {
        return 1.0;
    }
    if value >= min - grace && value <= max + grace {
        return 0.5;
    }
    0.0
}

/// 1 at or below max, 0.5 at or below max+grace, else 0.
fn upper_bound_score(value: f64, max: f64, grace: f64) -> f64 {
    if value <= max {
        return 1.0;
    }
    if value <= max + grace {
        return 0.5;
    }
    0.0
}

/// Shortest arc between two compass bearings, in [0, 180].
pub fn circular_diff(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Direction component of the wind sub-score.
///
/// Wind near the onshore bearing (offshore + 180°) is penalized to 0
/// outright; otherwise the component decays with distance from the
/// offshore bearing.
pub fn wind_direction_score(wind_direction_deg: f64, offshore_direction_deg: f64) -> f64 {
    let offshore_diff = circular_diff(wind_direction_deg, offshore_direction_deg);
    let onshore_diff = circular_diff(wind_direction_deg, (offshore_direction_deg + 180.0) % 360.0);

    if onshore_diff <= ONSHORE_ARC_DEG {
        return 0.0;
    }
    if offshore_diff <= 50.0 {
        1.0
    } else if offshore_diff <= 80.0 {
        0.7
    } else if offshore_diff <= 110.0 {
        0.4
    } else {
        0.2
    }
}

fn status_from(score: f64, hard_fail: bool) -> SurfStatus {
    if hard_fail {
        return SurfStatus::Tough;
    }
    if score >= GO_SCORE_THRESHOLD {
        SurfStatus::Go
    } else {
        SurfStatus::Tough
    }
}

/// Fixed-priority reason list, first match wins.
fn reason_for(
    threshold: &Threshold,
    slot: &SlotAggregate,
    wind_dir_score: f64,
    score: f64,
    hard_fail: bool,
) -> &'static str {
    if hard_fail
        && slot.wind_speed_ms > threshold.wind_speed_max + threshold.wind_grace + WIND_HARD_FAIL_MARGIN_MS
    {
        return REASON_WIND_HARD_FAIL;
    }
    if hard_fail && wind_dir_score <= 0.2 && slot.wind_speed_ms >= ONSHORE_HARD_FAIL_SPEED_MS {
        return REASON_ONSHORE_HARD_FAIL;
    }
    if hard_fail
        && slot.wave_height_m > threshold.wave_height_max + threshold.wave_grace + WAVE_HARD_FAIL_MARGIN_M
    {
        return REASON_WAVE_HARD_FAIL;
    }
    if score >= BALANCED_REASON_THRESHOLD {
        return REASON_BALANCED;
    }
    if slot.wave_height_m < threshold.wave_height_min - threshold.wave_grace {
        return REASON_WAVE_TOO_SMALL;
    }
    if slot.wave_period_s < threshold.period_min - threshold.period_grace {
        return REASON_PERIOD_TOO_SHORT;
    }
    if slot.wind_speed_ms > threshold.wind_speed_max + threshold.wind_grace {
        return REASON_WIND_TOO_STRONG;
    }
    if wind_dir_score <= 0.4 {
        return REASON_DIRECTION_MISMATCH;
    }
    REASON_UNSTABLE
}

/// Score one slot against one skill level.
pub fn evaluate_slot(
    level: SkillLevel,
    threshold: &Threshold,
    offshore_direction_deg: f64,
    slot: &SlotAggregate,
) -> SlotLevelEvaluation {
    let wave = range_score(
        slot.wave_height_m,
        threshold.wave_height_min,
        threshold.wave_height_max,
        threshold.wave_grace,
    );
    let period = range_score(
        slot.wave_period_s,
        threshold.period_min,
        threshold.period_max,
        threshold.period_grace,
    );
    let wind_speed_score = upper_bound_score(
        slot.wind_speed_ms,
        threshold.wind_speed_max,
        threshold.wind_grace,
    );
    let wind_dir_score = wind_direction_score(slot.wind_direction_deg, offshore_direction_deg);
    let wind = round2(wind_speed_score.min(wind_dir_score));

    let score = round2(wave + period + wind);
    let hard_fail = slot.wind_speed_ms
        > threshold.wind_speed_max + threshold.wind_grace + WIND_HARD_FAIL_MARGIN_MS
        || slot.wave_height_m
            > threshold.wave_height_max + threshold.wave_grace + WAVE_HARD_FAIL_MARGIN_M
        || (wind_dir_score <= 0.2 && slot.wind_speed_ms >= ONSHORE_HARD_FAIL_SPEED_MS);

    SlotLevelEvaluation {
        level,
        score,
        status: status_from(score, hard_fail),
        reason: reason_for(threshold, slot, wind_dir_score, score, hard_fail),
    }
}

/// Pick the day's best slot for one skill level.
///
/// The stable descending sort over chronologically ordered slots means
/// score ties go to the earliest slot of the day.
pub fn evaluate_daily(
    level: SkillLevel,
    threshold: &Threshold,
    offshore_direction_deg: f64,
    slots: &[SlotAggregate],
) -> DailyLevelEvaluation {
    if slots.is_empty() {
        return DailyLevelEvaluation {
            level,
            status: SurfStatus::Tough,
            reason: REASON_INSUFFICIENT_DATA,
            score: 0.0,
            best_slot_start: None,
            best_slot_end: None,
        };
    }

    let mut evaluated: Vec<(&SlotAggregate, SlotLevelEvaluation)> = slots
        .iter()
        .map(|slot| {
            (
                slot,
                evaluate_slot(level, threshold, offshore_direction_deg, slot),
            )
        })
        .collect();
    evaluated.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let (slot, best) = &evaluated[0];
    DailyLevelEvaluation {
        level,
        status: best.status,
        reason: best.reason,
        score: best.score,
        best_slot_start: Some(slot.slot_start),
        best_slot_end: Some(slot.slot_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::time::jst_instant;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    fn slot(start_hour: u32, height: f64, period: f64, speed: f64, direction: f64) -> SlotAggregate {
        SlotAggregate {
            spot_id: "komatsu".to_string(),
            forecast_date: date(),
            slot_start: jst_instant(date(), start_hour),
            slot_end: jst_instant(date(), start_hour + 3),
            wave_height_m: height,
            wave_period_s: period,
            wind_speed_ms: speed,
            wind_direction_deg: direction,
        }
    }

    // Clean boundary numbers so the inclusive grace edges are exact in f64.
    const TEST_RANGE: (f64, f64, f64) = (1.0, 2.0, 0.5);

    #[test]
    fn test_range_score_tiers() {
        let (min, max, grace) = TEST_RANGE;
        assert_eq!(range_score(1.5, min, max, grace), 1.0);
        assert_eq!(range_score(1.0, min, max, grace), 1.0);
        assert_eq!(range_score(2.0, min, max, grace), 1.0);
        // Inclusive grace boundaries score 0.5.
        assert_eq!(range_score(0.5, min, max, grace), 0.5);
        assert_eq!(range_score(2.5, min, max, grace), 0.5);
        // Strictly outside the widened band scores 0.
        assert_eq!(range_score(0.49, min, max, grace), 0.0);
        assert_eq!(range_score(2.51, min, max, grace), 0.0);
    }

    #[test]
    fn test_upper_bound_score_tiers() {
        assert_eq!(upper_bound_score(7.5, 7.5, 1.7), 1.0);
        assert_eq!(upper_bound_score(9.2, 7.5, 1.7), 0.5);
        assert_eq!(upper_bound_score(9.3, 7.5, 1.7), 0.0);
    }

    #[test]
    fn test_circular_diff_properties() {
        assert_eq!(circular_diff(40.0, 40.0), 0.0);
        assert_eq!(circular_diff(0.0, 180.0), 180.0);
        assert_eq!(circular_diff(350.0, 10.0), 20.0);
        assert_eq!(circular_diff(10.0, 350.0), 20.0);
        for (a, b) in [(0.0, 90.0), (123.0, 321.0), (359.0, 1.0)] {
            assert_eq!(circular_diff(a, b), circular_diff(b, a));
            assert!(circular_diff(a, b) <= 180.0);
        }
    }

    #[test]
    fn test_wind_direction_score_tiers() {
        // Offshore bearing 0: onshore bearing is 180.
        assert_eq!(wind_direction_score(0.0, 0.0), 1.0);
        assert_eq!(wind_direction_score(50.0, 0.0), 1.0);
        assert_eq!(wind_direction_score(60.0, 0.0), 0.7);
        assert_eq!(wind_direction_score(100.0, 0.0), 0.4);
        assert_eq!(wind_direction_score(115.0, 0.0), 0.2);
        // Within 25° of onshore: forced to 0 no matter the offshore arc.
        assert_eq!(wind_direction_score(180.0, 0.0), 0.0);
        assert_eq!(wind_direction_score(160.0, 0.0), 0.0);
        assert_eq!(wind_direction_score(205.0, 0.0), 0.0);
    }

    #[test]
    fn test_wind_subscore_is_min_of_components() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        // Perfect wave/period, light wind but dead onshore (offshore 320 → onshore 140).
        let evaluation = evaluate_slot(
            SkillLevel::Intermediate,
            threshold,
            320.0,
            &slot(6, 1.0, 10.0, 2.0, 140.0),
        );
        // speed component 1.0, direction component 0.0 → wind 0.0 → total 2.0.
        assert_eq!(evaluation.score, 2.0);
        // Below 4.5 m/s the onshore hard fail does not trip, and 2.0 < 2.2.
        assert_eq!(evaluation.status, SurfStatus::Tough);
    }

    #[test]
    fn test_pure_offshore_day_is_a_go() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        let evaluation = evaluate_slot(
            SkillLevel::Intermediate,
            threshold,
            320.0,
            &slot(6, 1.0, 10.0, 4.0, 320.0),
        );

        assert_eq!(evaluation.score, 3.0);
        assert_eq!(evaluation.status, SurfStatus::Go);
        assert_eq!(evaluation.reason, REASON_BALANCED);
    }

    #[test]
    fn test_storm_wind_hard_fails_regardless_of_waves() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        // 12 m/s > 7.5 + 1.7 + 1.5; wave/period perfect. Onshore direction too,
        // but the wind-speed message wins the priority list.
        let evaluation = evaluate_slot(
            SkillLevel::Intermediate,
            threshold,
            320.0,
            &slot(6, 1.0, 10.0, 12.0, 140.0),
        );

        assert_eq!(evaluation.status, SurfStatus::Tough);
        assert_eq!(evaluation.reason, REASON_WIND_HARD_FAIL);
    }

    #[test]
    fn test_onshore_hard_fail_reason() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        // 5 m/s onshore: within speed bounds, but direction 0 and speed ≥ 4.5.
        let evaluation = evaluate_slot(
            SkillLevel::Intermediate,
            threshold,
            320.0,
            &slot(6, 1.0, 10.0, 5.0, 140.0),
        );

        assert_eq!(evaluation.status, SurfStatus::Tough);
        assert_eq!(evaluation.reason, REASON_ONSHORE_HARD_FAIL);
    }

    #[test]
    fn test_oversize_surf_hard_fail_reason() {
        let threshold = catalog::threshold(SkillLevel::Beginner);
        // 2.1 m > 1.35 + 0.2 + 0.5 with calm offshore wind.
        let evaluation = evaluate_slot(
            SkillLevel::Beginner,
            threshold,
            320.0,
            &slot(6, 2.1, 10.0, 2.0, 320.0),
        );

        assert_eq!(evaluation.status, SurfStatus::Tough);
        assert_eq!(evaluation.reason, REASON_WAVE_HARD_FAIL);
    }

    #[test]
    fn test_small_wave_reason() {
        let threshold = catalog::threshold(SkillLevel::Advanced);
        // 0.3 m < 0.9 - 0.35; wind only cross-shore (component 0.7) so the
        // total stays under the balanced-reason gate.
        let evaluation = evaluate_slot(
            SkillLevel::Advanced,
            threshold,
            320.0,
            &slot(6, 0.3, 10.0, 3.0, 30.0),
        );

        assert_eq!(evaluation.status, SurfStatus::Tough);
        assert_eq!(evaluation.reason, REASON_WAVE_TOO_SMALL);
    }

    #[test]
    fn test_evaluate_slot_is_idempotent() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        let sample = slot(9, 1.2, 8.0, 6.0, 10.0);

        let first = evaluate_slot(SkillLevel::Intermediate, threshold, 320.0, &sample);
        let second = evaluate_slot(SkillLevel::Intermediate, threshold, 320.0, &sample);
        assert_eq!(first, second);
    }

    #[test]
    fn test_daily_empty_slots_yield_insufficient_data() {
        let threshold = catalog::threshold(SkillLevel::Beginner);
        let daily = evaluate_daily(SkillLevel::Beginner, threshold, 320.0, &[]);

        assert_eq!(daily.status, SurfStatus::Tough);
        assert_eq!(daily.reason, REASON_INSUFFICIENT_DATA);
        assert_eq!(daily.score, 0.0);
        assert_eq!(daily.best_slot_start, None);
        assert_eq!(daily.best_slot_end, None);
    }

    #[test]
    fn test_daily_tie_goes_to_earliest_slot() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        // Identical conditions in two slots: identical scores, earliest wins.
        let slots = vec![
            slot(6, 1.0, 10.0, 4.0, 320.0),
            slot(9, 1.0, 10.0, 4.0, 320.0),
        ];

        let daily = evaluate_daily(SkillLevel::Intermediate, threshold, 320.0, &slots);
        assert_eq!(daily.best_slot_start, Some(jst_instant(date(), 6)));
        assert_eq!(daily.best_slot_end, Some(jst_instant(date(), 9)));
    }

    #[test]
    fn test_daily_picks_highest_score() {
        let threshold = catalog::threshold(SkillLevel::Intermediate);
        // Morning slop, clean afternoon.
        let slots = vec![
            slot(6, 1.0, 10.0, 8.0, 140.0),
            slot(12, 1.0, 10.0, 3.0, 320.0),
        ];

        let daily = evaluate_daily(SkillLevel::Intermediate, threshold, 320.0, &slots);
        assert_eq!(daily.status, SurfStatus::Go);
        assert_eq!(daily.score, 3.0);
        assert_eq!(daily.best_slot_start, Some(jst_instant(date(), 12)));
    }
}
