//! JST (UTC+9) time helpers.
//!
//! Spot local civil time is Japan Standard Time, which has no DST, so a
//! `chrono::FixedOffset` is sufficient and no tz database is needed. Storage is
//! always `DateTime<Utc>`; JST appears only when choosing the forecast
//! date, building slot boundaries, and rendering dashboard labels.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("JST offset is in range")
}

/// The JST calendar date of a UTC instant.
pub fn jst_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&jst()).date_naive()
}

/// A UTC instant for the given JST calendar date at the given wall-clock hour.
pub fn jst_instant(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let naive = date
        .and_hms_opt(hour, 0, 0)
        .expect("slot hours are within 0..24");
    naive
        .and_local_timezone(jst())
        .single()
        .expect("fixed-offset local times are unambiguous")
        .with_timezone(&Utc)
}

/// Render a slot window as a JST wall-clock label, e.g. "06:00 - 09:00".
pub fn format_jst_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let tz = jst();
    format!(
        "{} - {}",
        start.with_timezone(&tz).format("%H:%M"),
        end.with_timezone(&tz).format("%H:%M")
    )
}

/// Hours elapsed between `earlier` and `now`, clamped at zero.
pub fn hours_since(earlier: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - earlier).num_seconds() as f64 / 3600.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jst_date_rolls_over_before_utc() {
        // 16:00 UTC is 01:00 JST the next day.
        let now = "2026-08-06T16:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            jst_date(now),
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
        );
    }

    #[test]
    fn test_jst_instant_converts_to_utc() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let instant = jst_instant(date, 6);
        assert_eq!(
            instant,
            "2026-08-06T21:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_format_jst_time_range() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let label = format_jst_time_range(jst_instant(date, 6), jst_instant(date, 9));
        assert_eq!(label, "06:00 - 09:00");
    }

    #[test]
    fn test_hours_since_clamps_negative_to_zero() {
        let earlier = "2026-08-07T06:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let now = "2026-08-07T09:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert!((hours_since(earlier, now) - 3.5).abs() < 1e-9);
        assert_eq!(hours_since(now, earlier), 0.0);
    }
}
