use serde::{Deserialize, Deserializer, Serialize};

/// A user's record of having watched one movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEntry {
    pub movie_id: String,
    /// Personal rating. Zero means "watched but unrated".
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: f64,
}

impl WatchEntry {
    pub fn new(movie_id: impl Into<String>, rating: f64) -> Self {
        Self {
            movie_id: movie_id.into(),
            rating,
        }
    }

    /// Returns the rating if it can take part in rating aggregates
    ///
    /// Zero, negative and non-finite values all mean the movie was watched
    /// without a usable rating.
    pub fn rated_value(&self) -> Option<f64> {
        (self.rating.is_finite() && self.rating > 0.0).then_some(self.rating)
    }
}

/// Accepts numbers, numeric strings and null; anything else becomes 0 (unrated)
fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let rating = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(rating)
}

/// One entry returned by the external watch-history importer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedEntry {
    #[serde(default)]
    pub movie_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rated_value_excludes_sentinels() {
        assert_eq!(WatchEntry::new("m1", 7.5).rated_value(), Some(7.5));
        assert_eq!(WatchEntry::new("m1", 0.0).rated_value(), None);
        assert_eq!(WatchEntry::new("m1", -3.0).rated_value(), None);
        assert_eq!(WatchEntry::new("m1", f64::NAN).rated_value(), None);
        assert_eq!(WatchEntry::new("m1", f64::INFINITY).rated_value(), None);
    }

    #[test]
    fn test_watch_entry_wire_names() {
        let entry = WatchEntry::new("tt0111161", 9.0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["movieId"], "tt0111161");
        assert_eq!(json["rating"], 9.0);
    }

    #[test]
    fn test_watch_entry_missing_rating_is_unrated() {
        let entry: WatchEntry = serde_json::from_str(r#"{"movieId":"m1"}"#).unwrap();
        assert_eq!(entry.rating, 0.0);
        assert_eq!(entry.rated_value(), None);
    }

    #[test]
    fn test_watch_entry_non_numeric_rating_is_unrated() {
        let entry: WatchEntry =
            serde_json::from_str(r#"{"movieId":"m1","rating":"great"}"#).unwrap();
        assert_eq!(entry.rated_value(), None);

        let entry: WatchEntry = serde_json::from_str(r#"{"movieId":"m1","rating":null}"#).unwrap();
        assert_eq!(entry.rated_value(), None);
    }

    #[test]
    fn test_watch_entry_numeric_string_rating() {
        let entry: WatchEntry = serde_json::from_str(r#"{"movieId":"m1","rating":"4.5"}"#).unwrap();
        assert_eq!(entry.rated_value(), Some(4.5));
    }

    #[test]
    fn test_imported_entry_without_movie_id() {
        let entry: ImportedEntry = serde_json::from_str(r#"{"rating":3}"#).unwrap();
        assert_eq!(entry.movie_id, None);
        assert_eq!(entry.rating, 3.0);
    }
}
