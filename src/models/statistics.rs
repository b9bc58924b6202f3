use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Viewing statistics derived from one user's watch history
///
/// Rating fields are rendered as fixed two-decimal strings. Field names on the
/// wire match the existing statistics consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    /// Watch entries that joined to catalog metadata
    #[serde(rename = "films")]
    pub total_films: u64,
    #[serde(rename = "hours")]
    pub total_hours: u64,
    #[serde(rename = "averageRating")]
    pub average_rating: String,
    /// Every year between the oldest and newest watched release, inclusive
    #[serde(rename = "averageRatingYears")]
    pub ratings_by_year: BTreeMap<i32, String>,
    /// Only genres with at least one rated movie
    #[serde(rename = "averageRatingGenres")]
    pub ratings_by_genre: BTreeMap<String, String>,
    /// Number of distinct production countries
    #[serde(rename = "countries")]
    pub country_count: u64,
    #[serde(rename = "languages")]
    pub language_counts: BTreeMap<String, u64>,
    #[serde(rename = "genres")]
    pub genre_counts: BTreeMap<String, u64>,
    #[serde(rename = "years")]
    pub year_counts: BTreeMap<i32, u64>,
}
