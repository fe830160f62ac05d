//! Static catalog: surf spots, skill levels, and suitability thresholds.
//!
//! Everything here is immutable seed configuration, constructed once and
//! referenced by the scoring core. Spots are also materialized into the
//! `spots` table at startup, but the table never becomes authoritative for
//! offshore bearings; those stay catalog-only.

use serde::Serialize;
use utoipa::ToSchema;

/// Hours after the last successful refresh before a spot is considered stale.
pub const STALE_LIMIT_HOURS: f64 = 6.0;

/// Source tag written to persisted rows.
pub const PROVIDER_SOURCE: &str = "open-meteo";

/// Offshore bearing used for spot ids missing from the catalog.
pub const DEFAULT_OFFSHORE_DIRECTION_DEG: f64 = 350.0;

/// Surfer proficiency tier. Display order is shortboard-first
/// (advanced → intermediate → beginner); the ids double as DB keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Advanced,
    Intermediate,
    Beginner,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 3] = [
        SkillLevel::Advanced,
        SkillLevel::Intermediate,
        SkillLevel::Beginner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Advanced => "advanced",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Beginner => "beginner",
        }
    }
}

/// Per-level acceptability envelope. Ranges are hard bounds; the grace
/// margin widens them for the half-credit band.
#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    pub wave_height_min: f64,
    pub wave_height_max: f64,
    pub wave_grace: f64,
    pub period_min: f64,
    pub period_max: f64,
    pub period_grace: f64,
    pub wind_speed_max: f64,
    pub wind_grace: f64,
}

// Longboard conditions
static BEGINNER: Threshold = Threshold {
    wave_height_min: 0.45,
    wave_height_max: 1.35,
    wave_grace: 0.2,
    period_min: 6.0,
    period_max: 12.0,
    period_grace: 1.0,
    wind_speed_max: 6.5,
    wind_grace: 1.3,
};

// Mid-length conditions
static INTERMEDIATE: Threshold = Threshold {
    wave_height_min: 0.65,
    wave_height_max: 1.95,
    wave_grace: 0.25,
    period_min: 7.0,
    period_max: 14.0,
    period_grace: 1.5,
    wind_speed_max: 7.5,
    wind_grace: 1.7,
};

// Shortboard conditions
static ADVANCED: Threshold = Threshold {
    wave_height_min: 0.9,
    wave_height_max: 2.6,
    wave_grace: 0.35,
    period_min: 8.0,
    period_max: 16.0,
    period_grace: 2.0,
    wind_speed_max: 8.5,
    wind_grace: 2.0,
};

pub fn threshold(level: SkillLevel) -> &'static Threshold {
    match level {
        SkillLevel::Beginner => &BEGINNER,
        SkillLevel::Intermediate => &INTERMEDIATE,
        SkillLevel::Advanced => &ADVANCED,
    }
}

/// A fixed surf location. `offshore_direction_deg` is the compass bearing
/// the wind blows toward when going from land to sea (wind *from* this
/// bearing grooms the faces).
#[derive(Debug, Clone)]
pub struct Spot {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub offshore_direction_deg: f64,
    pub sort_order: i32,
}

pub fn spot_seeds() -> Vec<Spot> {
    vec![
        Spot {
            id: "komatsu".to_string(),
            name: "Komatsu".to_string(),
            latitude: 34.085,
            longitude: 134.613,
            offshore_direction_deg: 320.0,
            sort_order: 1,
        },
        Spot {
            id: "ikumi".to_string(),
            name: "Ikumi".to_string(),
            latitude: 33.558,
            longitude: 134.303,
            offshore_direction_deg: 320.0,
            sort_order: 2,
        },
        Spot {
            id: "ukibuchi".to_string(),
            name: "Ukibuchi".to_string(),
            latitude: 33.021,
            longitude: 133.078,
            offshore_direction_deg: 335.0,
            sort_order: 3,
        },
    ]
}

/// Offshore bearing for a spot id, falling back to the default for ids the
/// catalog does not know (e.g. rows hand-inserted into the spots table).
pub fn offshore_direction_for(spot_id: &str) -> f64 {
    spot_seeds()
        .iter()
        .find(|spot| spot.id == spot_id)
        .map(|spot| spot.offshore_direction_deg)
        .unwrap_or(DEFAULT_OFFSHORE_DIRECTION_DEG)
}
