use serde::{Deserialize, Serialize};

use super::WatchEntry;

/// A user profile together with its watch history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Username on the external watch-tracking site, empty when not linked
    #[serde(default)]
    pub letterboxd: String,
    #[serde(default)]
    pub allow_watched: bool,
    #[serde(default)]
    pub watched: Vec<WatchEntry>,
}

impl User {
    pub fn new(id: String, username: String, email: String) -> Self {
        Self {
            id,
            username,
            email,
            letterboxd: String::new(),
            allow_watched: false,
            watched: Vec::new(),
        }
    }

    /// Records a watched movie, replacing the rating if it is already listed
    pub fn upsert_watched(&mut self, movie_id: &str, rating: f64) {
        match self.watched.iter_mut().find(|w| w.movie_id == movie_id) {
            Some(entry) => entry.rating = rating,
            None => self.watched.push(WatchEntry::new(movie_id, rating)),
        }
    }

    pub fn remove_watched(&mut self, movie_id: &str) {
        self.watched.retain(|w| w.movie_id != movie_id);
    }

    pub fn rating_for(&self, movie_id: &str) -> Option<f64> {
        self.watched
            .iter()
            .find(|w| w.movie_id == movie_id)
            .map(|w| w.rating)
    }

    /// Appends entries for movies not yet listed; returns how many were added
    pub fn merge_watched(&mut self, entries: Vec<WatchEntry>) -> usize {
        let mut added = 0;
        for entry in entries {
            if entry.movie_id.is_empty() || self.rating_for(&entry.movie_id).is_some() {
                continue;
            }
            self.watched.push(entry);
            added += 1;
        }
        added
    }

    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(letterboxd) = update.letterboxd {
            self.letterboxd = letterboxd;
        }
        if let Some(allow_watched) = update.allow_watched {
            self.allow_watched = allow_watched;
        }
    }
}

/// Request to create a user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub letterboxd: Option<String>,
    pub allow_watched: Option<bool>,
}

/// Request to mark a movie as watched or change its rating
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchedRequest {
    pub movie_id: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveWatchedRequest {
    pub movie_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportWatchedRequest {
    pub letterboxd: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("u1".to_string(), "ana".to_string(), "ana@example.com".to_string())
    }

    #[test]
    fn test_upsert_watched_updates_in_place() {
        let mut user = user();
        user.upsert_watched("m1", 6.0);
        user.upsert_watched("m2", 0.0);
        user.upsert_watched("m1", 9.0);

        assert_eq!(user.watched.len(), 2);
        assert_eq!(user.rating_for("m1"), Some(9.0));
    }

    #[test]
    fn test_remove_watched() {
        let mut user = user();
        user.upsert_watched("m1", 6.0);
        user.remove_watched("m1");
        user.remove_watched("missing");
        assert!(user.watched.is_empty());
    }

    #[test]
    fn test_merge_watched_keeps_existing_ratings() {
        let mut user = user();
        user.upsert_watched("m1", 6.0);

        let added = user.merge_watched(vec![
            WatchEntry::new("m1", 2.0),
            WatchEntry::new("m2", 8.0),
            WatchEntry::new("", 5.0),
        ]);

        assert_eq!(added, 1);
        assert_eq!(user.rating_for("m1"), Some(6.0));
        assert_eq!(user.rating_for("m2"), Some(8.0));
    }

    #[test]
    fn test_apply_partial_update() {
        let mut user = user();
        user.apply(UserUpdate {
            letterboxd: Some("ana_lb".to_string()),
            ..Default::default()
        });

        assert_eq!(user.username, "ana");
        assert_eq!(user.letterboxd, "ana_lb");
        assert!(!user.allow_watched);
    }
}
