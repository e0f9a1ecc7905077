//! Static lookup tables for canonical variable keys.
//!
//! Three tables live here: the header alias table used at ingestion time to
//! map source column names onto canonical keys, and the display-name and
//! unit tables used to describe discovered variables to callers.

use crate::models::VariableDescriptor;

// ── Canonical keys ────────────────────────────────────────────────────────────

/// Canonical key of the observation date column.
pub const DATE_KEY: &str = "date";
/// Canonical key of the latitude column.
pub const LAT_KEY: &str = "lat";
/// Canonical key of the longitude column.
pub const LON_KEY: &str = "lon";

/// Fallback unit for keys missing from [`UNITS`].
pub const DEFAULT_UNIT: &str = "units";

// ── Header aliases ────────────────────────────────────────────────────────────

/// Canonical key → accepted (lowercased, trimmed) source header spellings.
///
/// Order matters: header resolution walks this table top to bottom and the
/// first source header matching an alias wins for that key.
pub const HEADER_ALIASES: &[(&str, &[&str])] = &[
    (DATE_KEY, &["date", "validdate"]),
    (LAT_KEY, &["lat", "latitude", "y"]),
    (LON_KEY, &["lon", "longitude", "x", "lng"]),
    (
        "temperature",
        &[
            "temperature",
            "temp",
            "tavg",
            "tmean",
            "t_2m",
            "temperature(⁰c)",
            "temperature(°c)",
            "temperature_c",
        ],
    ),
    (
        "humidity",
        &[
            "humidity",
            "rh",
            "humidity(%)",
            "relative_humidity",
            "humidity_pct",
        ],
    ),
    (
        "precipitation",
        &[
            "precipitation",
            "prcp",
            "rain",
            "rainfall",
            "precipitation_mm",
        ],
    ),
    ("wind", &["wind", "wind_speed", "wind_speed_10m"]),
    ("cloud", &["cloud", "cloud_cover", "clt"]),
    ("dust", &["dust", "aerosol", "pm25", "pm10", "aod"]),
    ("snow", &["snow", "snow_depth", "snd"]),
    ("solar", &["solar", "uv", "uv_index", "solar_radiation"]),
];

/// Human-readable names for the tracked variables.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("temperature", "Temperature"),
    ("precipitation", "Precipitation"),
    ("wind", "Wind Speed"),
    ("humidity", "Humidity"),
    ("cloud", "Cloud Cover"),
    ("dust", "Dust/Aerosols"),
    ("snow", "Snow"),
    ("solar", "Solar Radiation"),
];

/// Default units for the tracked variables.
const UNITS: &[(&str, &str)] = &[
    ("temperature", "°C"),
    ("humidity", "%"),
    ("precipitation", "mm"),
    ("wind", "km/h"),
    ("cloud", "%"),
    ("dust", "μg/m³"),
    ("snow", "cm"),
    ("solar", "UV Index"),
];

// ── Lookups ───────────────────────────────────────────────────────────────────

/// `true` for the three structural keys (`date`, `lat`, `lon`) that are not
/// measured variables.
pub fn is_structural_key(key: &str) -> bool {
    matches!(key, DATE_KEY | LAT_KEY | LON_KEY)
}

/// Canonical keys of every measured variable in the alias table, in table
/// order.
pub fn tracked_variables() -> impl Iterator<Item = &'static str> {
    HEADER_ALIASES
        .iter()
        .map(|(key, _)| *key)
        .filter(|key| !is_structural_key(key))
}

/// Accepted header spellings for `key`, or `None` for keys outside the
/// alias table.
pub fn aliases_for(key: &str) -> Option<&'static [&'static str]> {
    HEADER_ALIASES
        .iter()
        .find(|(canon, _)| *canon == key)
        .map(|(_, aliases)| *aliases)
}

/// Display name for `key`; unknown keys are returned with their first
/// character upper-cased.
pub fn display_name(key: &str) -> String {
    if let Some((_, name)) = DISPLAY_NAMES.iter().find(|(k, _)| *k == key) {
        return (*name).to_string();
    }
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Unit for `key`, falling back to [`DEFAULT_UNIT`].
pub fn unit(key: &str) -> &'static str {
    UNITS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, u)| *u)
        .unwrap_or(DEFAULT_UNIT)
}

/// Build the public descriptor for a discovered variable key.
pub fn describe(key: &str) -> VariableDescriptor {
    VariableDescriptor {
        key: key.to_string(),
        display_name: display_name(key),
        unit: unit(key).to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
