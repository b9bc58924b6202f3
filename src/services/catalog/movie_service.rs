/// Movie service client
///
/// Resolves movie ids through the movie service's bulk endpoint:
/// `POST /movies/batch` with `{"ids": [...]}` answers with an array of raw
/// movie records. Parsed metadata is cached per movie in Redis, and only the
/// ids missing from the cache are requested upstream.
use std::collections::BTreeSet;

use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieMetadata, MovieRecord},
    services::catalog::MovieCatalog,
};

const MOVIE_CACHE_TTL: u64 = 86400; // 1 day
const MAX_IDS_PER_REQUEST: usize = 500;

#[derive(Serialize)]
struct BatchRequest<'a> {
    ids: &'a [String],
}

#[derive(Clone)]
pub struct MovieServiceCatalog {
    http_client: HttpClient,
    api_url: String,
    cache: Option<Cache>,
}

impl MovieServiceCatalog {
    pub fn new(api_url: String, cache: Option<Cache>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Looks up ids in the cache; returns the hits and the ids still to fetch
    ///
    /// A failing cache is treated as a miss for every id.
    async fn lookup_cached(&self, movie_ids: Vec<String>) -> (Vec<MovieMetadata>, Vec<String>) {
        let Some(cache) = &self.cache else {
            return (Vec::new(), movie_ids);
        };

        let keys: Vec<CacheKey> = movie_ids.iter().cloned().map(CacheKey::Movie).collect();
        let cached = match cache.get_many_from_cache::<MovieMetadata>(&keys).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, "Movie cache lookup failed, fetching all ids");
                return (Vec::new(), movie_ids);
            }
        };

        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for (movie_id, entry) in movie_ids.into_iter().zip(cached) {
            match entry {
                Some(movie) => hits.push(movie),
                None => misses.push(movie_id),
            }
        }

        (hits, misses)
    }

    /// Calls the bulk endpoint for one chunk of ids
    async fn call_api(&self, movie_ids: &[String]) -> AppResult<Vec<MovieRecord>> {
        let url = format!("{}/movies/batch", self.api_url);

        tracing::debug!(count = movie_ids.len(), "Fetching movies from movie service");

        let response = self
            .http_client
            .post(&url)
            .json(&BatchRequest { ids: movie_ids })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Movie service batch request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Movie service returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Keeps the records that were asked for, parsed and without repeats
fn select_requested(requested: &[String], records: Vec<MovieRecord>) -> Vec<MovieMetadata> {
    let mut wanted: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    records
        .into_iter()
        .filter(|record| wanted.remove(record.id.as_str()))
        .map(MovieMetadata::from)
        .collect()
}

#[async_trait::async_trait]
impl MovieCatalog for MovieServiceCatalog {
    async fn fetch_batch(&self, movie_ids: &[String]) -> AppResult<Vec<MovieMetadata>> {
        let unique: BTreeSet<&String> = movie_ids.iter().collect();
        let unique: Vec<String> = unique.into_iter().cloned().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let (mut movies, misses) = self.lookup_cached(unique).await;
        let cache_hits = movies.len();

        for chunk in misses.chunks(MAX_IDS_PER_REQUEST) {
            let records = self.call_api(chunk).await?;
            let fetched = select_requested(chunk, records);

            if let Some(cache) = &self.cache {
                for movie in &fetched {
                    cache.set_in_background(&CacheKey::Movie(movie.id.clone()), movie, MOVIE_CACHE_TTL);
                }
            }

            movies.extend(fetched);
        }

        tracing::info!(
            requested = movie_ids.len(),
            resolved = movies.len(),
            cache_hits,
            "Movie metadata batch resolved"
        );

        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "movie-service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn record(id: &str) -> MovieRecord {
        MovieRecord {
            id: id.to_string(),
            genres: Some("Drama".to_string()),
            ..Default::default()
        }
    }

    /// Serves a fake `/movies/batch` that knows movies "m1" and "m2"
    async fn spawn_movie_service() -> String {
        async fn batch(Json(body): Json<Value>) -> Json<Value> {
            let known = json!({
                "m1": {"_id": "m1", "genres": "Drama", "release_date": "2010-01-01T00:00:00.000Z", "runtime": 120},
                "m2": {"_id": "m2", "genres": "Drama,Comedy", "release_date": "2012-01-01", "runtime": 90},
            });
            let movies: Vec<Value> = body["ids"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|id| id.as_str().and_then(|id| known.get(id)).cloned())
                .collect();
            Json(Value::Array(movies))
        }

        let app = Router::new().route("/movies/batch", post(batch));
        serve(app).await
    }

    async fn spawn_failing_service() -> String {
        let app = Router::new().route(
            "/movies/batch",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database offline") }),
        );
        serve(app).await
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_select_requested_drops_unrequested_and_repeats() {
        let requested = vec!["m1".to_string(), "m2".to_string()];
        let records = vec![record("m1"), record("m3"), record("m1"), record("m2")];

        let movies = select_requested(&requested, records);
        let ids: Vec<&str> = movies.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_fetch_batch_omits_unknown_ids() {
        let url = spawn_movie_service().await;
        let catalog = MovieServiceCatalog::new(format!("{}/", url), None);

        let ids = vec!["m1".to_string(), "ghost".to_string(), "m2".to_string(), "m1".to_string()];
        let mut movies = catalog.fetch_batch(&ids).await.unwrap();
        movies.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].release_year, Some(2010));
        assert_eq!(movies[1].genres.len(), 2);
        assert_eq!(movies[1].runtime_minutes, 90.0);
    }

    #[tokio::test]
    async fn test_fetch_batch_empty_skips_request() {
        // Nothing listens here; an empty batch must not call out.
        let catalog = MovieServiceCatalog::new("http://127.0.0.1:1".to_string(), None);
        let movies = catalog.fetch_batch(&[]).await.unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_batch_upstream_error() {
        let url = spawn_failing_service().await;
        let catalog = MovieServiceCatalog::new(url, None);

        let result = catalog.fetch_batch(&["m1".to_string()]).await;
        match result {
            Err(AppError::ExternalApi(msg)) => assert!(msg.contains("database offline")),
            other => panic!("expected ExternalApi error, got {:?}", other.map(|m| m.len())),
        }
    }

    #[tokio::test]
    async fn test_fetch_batch_with_unreachable_cache_falls_back() {
        let url = spawn_movie_service().await;
        let client = crate::db::create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client);
        let catalog = MovieServiceCatalog::new(url, Some(cache));

        let movies = catalog.fetch_batch(&["m1".to_string()]).await.unwrap();
        assert_eq!(movies.len(), 1);
    }
}
