use chrono::{DateTime, Local, NaiveDateTime};
use tariff_core::StayInterval;

use crate::config::StayParams;
use crate::error::{AppError, Result};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a wall-clock timestamp of the lot. RFC 3339 input keeps the local
/// time it was written in; the offset itself is dropped.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| AppError::InvalidInput(format!("invalid timestamp: {value}")))
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn resolve_stay(params: &StayParams, default_category: &str) -> Result<StayInterval> {
    let entry = parse_timestamp(&params.entry)?;
    let exit = parse_timestamp(&params.exit)?;
    let vehicle_category = params
        .vehicle_category
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default_category)
        .to_string();
    Ok(StayInterval {
        entry,
        exit,
        vehicle_category,
    })
}
