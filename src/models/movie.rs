use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Release years outside this range are treated as bad data
const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1800..=2200;

/// Raw movie record as returned by the movie service
///
/// Category fields are comma-joined strings and any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub production_countries: Option<String>,
    #[serde(default)]
    pub spoken_languages: Option<String>,
    #[serde(default)]
    pub runtime: Option<f64>,
}

/// Movie metadata with its category fields parsed into token sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieMetadata {
    pub id: String,
    pub genres: BTreeSet<String>,
    pub release_year: Option<i32>,
    pub production_countries: BTreeSet<String>,
    pub spoken_languages: BTreeSet<String>,
    /// Always finite and non-negative
    pub runtime_minutes: f64,
}

impl From<MovieRecord> for MovieMetadata {
    fn from(record: MovieRecord) -> Self {
        Self {
            id: record.id,
            genres: parse_tokens(record.genres.as_deref()),
            release_year: record.release_date.as_deref().and_then(parse_release_year),
            production_countries: parse_tokens(record.production_countries.as_deref()),
            spoken_languages: parse_tokens(record.spoken_languages.as_deref()),
            runtime_minutes: sanitize_runtime(record.runtime),
        }
    }
}

/// Splits a comma-joined field into trimmed, non-empty, unique tokens
pub fn parse_tokens(field: Option<&str>) -> BTreeSet<String> {
    field
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts the release year from an RFC 3339 timestamp, a `YYYY-MM-DD` date
/// or a string starting with a four-digit year
///
/// Years outside 1800..=2200 yield `None`, keeping one corrupt date from
/// stretching the gap-filled year range.
pub fn parse_release_year(raw: &str) -> Option<i32> {
    parse_year(raw).filter(|year| PLAUSIBLE_YEARS.contains(year))
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.year());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }

    let prefix = raw.get(..4)?;
    let followed_by_digit = raw[4..].starts_with(|c: char| c.is_ascii_digit());
    if prefix.chars().all(|c| c.is_ascii_digit()) && !followed_by_digit {
        return prefix.parse().ok();
    }

    None
}

fn sanitize_runtime(runtime: Option<f64>) -> f64 {
    match runtime {
        Some(minutes) if minutes.is_finite() && minutes > 0.0 => minutes,
        _ => 0.0,
    }
}
