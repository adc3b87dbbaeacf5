use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::{gate::SpeedRange, location::SpeedUnit};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_unit(value: &str) -> Result<SpeedUnit> {
    match value {
        "kph" => Ok(SpeedUnit::Kph),
        "mph" => Ok(SpeedUnit::Mph),
        other => Err(anyhow!("unknown speed unit {other}")),
    }
}

pub fn parse_optional_range(
    start: Option<f64>,
    finish: Option<f64>,
    field: &str,
) -> Result<Option<SpeedRange>> {
    match (start, finish) {
        (Some(start), Some(finish)) => SpeedRange::new(start, finish)
            .map(Some)
            .with_context(|| format!("failed to parse {field}")),
        (None, None) => Ok(None),
        _ => Err(anyhow!("{field} is only partially set")),
    }
}
