use std::time::Instant;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{CreateUserRequest, StatisticsReport, User, WatchEntry},
    services::{catalog::MovieCatalog, importer::WatchImporter, statistics::compute_statistics},
};

fn user_not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

pub async fn create_user(store: &dyn UserStore, request: CreateUserRequest) -> AppResult<()> {
    for (field, value) in [
        ("userId", &request.user_id),
        ("username", &request.username),
        ("email", &request.email),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
        }
    }

    store
        .create_user(User::new(request.user_id, request.username, request.email))
        .await
}

/// Validates a rating supplied by a client; absent means unrated
pub fn validate_rating(rating: Option<f64>) -> AppResult<f64> {
    match rating {
        None => Ok(0.0),
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Some(value) => Err(AppError::InvalidInput(format!(
            "Rating must be a non-negative number, got {}",
            value
        ))),
    }
}

pub async fn add_watched(
    store: &dyn UserStore,
    user_id: &str,
    movie_id: &str,
    rating: Option<f64>,
) -> AppResult<()> {
    if movie_id.trim().is_empty() {
        return Err(AppError::InvalidInput("movieId must not be empty".to_string()));
    }
    let rating = validate_rating(rating)?;

    if !store.upsert_watched(user_id, movie_id, rating).await? {
        return Err(user_not_found(user_id));
    }
    Ok(())
}

pub async fn remove_watched(store: &dyn UserStore, user_id: &str, movie_id: &str) -> AppResult<()> {
    if !store.remove_watched(user_id, movie_id).await? {
        return Err(user_not_found(user_id));
    }
    Ok(())
}

pub async fn watched(store: &dyn UserStore, user_id: &str) -> AppResult<Vec<WatchEntry>> {
    store
        .watch_history(user_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))
}

/// Builds the viewing statistics report for one user
///
/// Metadata is fetched once for the whole history. A catalog failure fails
/// the request; a partial catalog answer does not.
pub async fn user_statistics(
    store: &dyn UserStore,
    catalog: &dyn MovieCatalog,
    user_id: &str,
) -> AppResult<StatisticsReport> {
    let start = Instant::now();

    let history = watched(store, user_id).await?;
    let movie_ids: Vec<String> = history.iter().map(|w| w.movie_id.clone()).collect();

    let metadata = if movie_ids.is_empty() {
        Vec::new()
    } else {
        catalog.fetch_batch(&movie_ids).await?
    };

    if metadata.len() < movie_ids.len() {
        tracing::warn!(
            user_id = %user_id,
            provider = catalog.name(),
            watched = movie_ids.len(),
            resolved = metadata.len(),
            "Some watched movies have no catalog metadata"
        );
    }

    let report = compute_statistics(&history, &metadata);

    tracing::info!(
        user_id = %user_id,
        films = report.total_films,
        processing_time_ms = start.elapsed().as_millis(),
        "Statistics computed"
    );

    Ok(report)
}

/// Pulls watch history from the external site and adds movies not yet listed
///
/// Existing ratings are left alone. Returns the number of movies added.
pub async fn import_watched(
    store: &dyn UserStore,
    importer: &dyn WatchImporter,
    user_id: &str,
    username: &str,
) -> AppResult<usize> {
    if username.trim().is_empty() {
        return Err(AppError::InvalidInput("letterboxd username must not be empty".to_string()));
    }

    // Fail fast before calling out for an unknown user
    if store.get_user(user_id).await?.is_none() {
        return Err(user_not_found(user_id));
    }

    let entries: Vec<WatchEntry> = importer
        .fetch_watched(username)
        .await?
        .into_iter()
        .filter_map(|entry| {
            let movie_id = entry.movie_id.filter(|id| !id.is_empty())?;
            Some(WatchEntry::new(movie_id, entry.rating))
        })
        .collect();

    let added = store
        .merge_watched(user_id, entries)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    tracing::info!(user_id = %user_id, added, "Imported external watch history");

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockUserStore;
    use crate::models::{ImportedEntry, MovieMetadata};
    use crate::services::catalog::MockMovieCatalog;
    use crate::services::importer::MockWatchImporter;
    use std::collections::BTreeSet;

    fn drama(id: &str, year: i32) -> MovieMetadata {
        MovieMetadata {
            id: id.to_string(),
            genres: BTreeSet::from(["Drama".to_string()]),
            release_year: Some(year),
            production_countries: BTreeSet::new(),
            spoken_languages: BTreeSet::new(),
            runtime_minutes: 120.0,
        }
    }

    #[test]
    fn test_validate_rating() {
        assert_eq!(validate_rating(None).unwrap(), 0.0);
        assert_eq!(validate_rating(Some(7.5)).unwrap(), 7.5);
        assert!(validate_rating(Some(-1.0)).is_err());
        assert!(validate_rating(Some(f64::NAN)).is_err());
    }

    #[tokio::test]
    async fn test_user_statistics_joins_history_with_catalog() {
        let mut store = MockUserStore::new();
        store
            .expect_watch_history()
            .withf(|user_id| user_id.to_string() == "u1")
            .returning(|_| {
                Ok(Some(vec![
                    WatchEntry::new("m1", 8.0),
                    WatchEntry::new("m2", 6.0),
                    WatchEntry::new("gone", 10.0),
                ]))
            });

        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_batch()
            .withf(|ids| ids.len() == 3)
            .times(1)
            .returning(|_| Ok(vec![drama("m1", 2000), drama("m2", 2002)]));
        catalog.expect_name().return_const("mock");

        let report = user_statistics(&store, &catalog, "u1").await.unwrap();

        assert_eq!(report.total_films, 2);
        assert_eq!(report.total_hours, 4);
        assert_eq!(report.average_rating, "7.00");
        assert_eq!(report.year_counts.len(), 3);
    }

    #[tokio::test]
    async fn test_user_statistics_empty_history_skips_catalog() {
        let mut store = MockUserStore::new();
        store
            .expect_watch_history()
            .returning(|_| Ok(Some(Vec::new())));

        let mut catalog = MockMovieCatalog::new();
        catalog.expect_fetch_batch().never();

        let report = user_statistics(&store, &catalog, "u1").await.unwrap();
        assert_eq!(report.total_films, 0);
        assert_eq!(report.average_rating, "0.00");
    }

    #[tokio::test]
    async fn test_user_statistics_unknown_user() {
        let mut store = MockUserStore::new();
        store.expect_watch_history().returning(|_| Ok(None));
        let catalog = MockMovieCatalog::new();

        let result = user_statistics(&store, &catalog, "ghost").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_user_statistics_catalog_failure_propagates() {
        let mut store = MockUserStore::new();
        store
            .expect_watch_history()
            .returning(|_| Ok(Some(vec![WatchEntry::new("m1", 8.0)])));

        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_batch()
            .returning(|_| Err(AppError::ExternalApi("movie service down".to_string())));

        let result = user_statistics(&store, &catalog, "u1").await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_import_watched_filters_entries_without_ids() {
        let mut store = MockUserStore::new();
        store.expect_get_user().returning(|id| {
            Ok(Some(User::new(
                id.to_string(),
                "lee".to_string(),
                "lee@example.com".to_string(),
            )))
        });
        store
            .expect_merge_watched()
            .withf(|_, entries| {
                entries.len() == 1 && entries[0].movie_id == "m1" && entries[0].rating == 4.0
            })
            .returning(|_, entries| Ok(Some(entries.len())));

        let mut importer = MockWatchImporter::new();
        importer.expect_fetch_watched().returning(|_| {
            Ok(vec![
                ImportedEntry {
                    movie_id: Some("m1".to_string()),
                    rating: 4.0,
                },
                ImportedEntry {
                    movie_id: None,
                    rating: 5.0,
                },
                ImportedEntry {
                    movie_id: Some(String::new()),
                    rating: 2.0,
                },
            ])
        });

        let added = import_watched(&store, &importer, "u1", "lee_lb").await.unwrap();
        assert_eq!(added, 1);
    }

    #[tokio::test]
    async fn test_import_watched_unknown_user_skips_importer() {
        let mut store = MockUserStore::new();
        store.expect_get_user().returning(|_| Ok(None));

        let mut importer = MockWatchImporter::new();
        importer.expect_fetch_watched().never();

        let result = import_watched(&store, &importer, "ghost", "someone").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_watched_rejects_negative_rating() {
        let mut store = MockUserStore::new();
        store.expect_upsert_watched().never();

        let result = add_watched(&store, "u1", "m1", Some(-2.0)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_user_rejects_blank_fields() {
        let mut store = MockUserStore::new();
        store.expect_create_user().never();

        let request = CreateUserRequest {
            user_id: "u1".to_string(),
            username: "  ".to_string(),
            email: "a@example.com".to_string(),
        };
        let result = create_user(&store, request).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
