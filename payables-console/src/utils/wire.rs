//! Serde helpers for the collaborator's wire format.
//!
//! Dates may arrive as `YYYY-MM-DD` or as a full timestamp
//! (`YYYY-MM-DDTHH:MM:SS`); only the calendar date is kept.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_wire_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let day = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(day, DATE_FORMAT)
}

pub fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_wire_date(&raw).map_err(de::Error::custom)
}

pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            parse_wire_date(&raw).map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Plan position counters are nullable upstream and default to 1.
pub fn count_or_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(1))
}

pub fn default_count() -> u32 {
    1
}
