//! Shared numeric helpers: f64 rounding and Decimal ↔ f64 conversions.
//!
//! Three f64→Decimal strategies exist because the stored values have
//! different precision contracts:
//!
//! - `f64_to_decimal_2dp`: 2 decimal places (wave height, period, wind speed, scores)
//! - `f64_to_decimal_1dp`: 1 decimal place (wind direction)
//! - `f64_to_decimal_full`: full f64 precision (geo: lat, lon)
//!
//! The Decimal conversions return `Decimal::ZERO` for non-finite inputs.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Round to 2 decimal places (magnitude fields and scores).
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to 1 decimal place (compass directions).
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Convert an f64 to Decimal, rounded to 2 decimal places.
pub(crate) fn f64_to_decimal_2dp(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_2dp received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_str_exact(&format!("{:.2}", v)).unwrap_or_default()
}

/// Convert an f64 to Decimal, rounded to 1 decimal place.
pub(crate) fn f64_to_decimal_1dp(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_1dp received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_str_exact(&format!("{:.1}", v)).unwrap_or_default()
}

/// Convert an f64 to Decimal preserving full precision (geo coordinates).
pub(crate) fn f64_to_decimal_full(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_full received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_f64(v).unwrap_or_else(|| Decimal::new(v as i64, 0))
}

/// Convert a Decimal to f64, defaulting to 0.0 for values that can't be represented.
pub(crate) fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}
