use reqwest::{Client as HttpClient, Url};

use crate::{
    error::{AppError, AppResult},
    models::ImportedEntry,
};

/// Source of watch history kept on an external tracking site
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchImporter: Send + Sync {
    /// Fetches everything the given external account has marked as watched
    async fn fetch_watched(&self, username: &str) -> AppResult<Vec<ImportedEntry>>;
}

/// Client for the Letterboxd importer service
///
/// `GET /letterboxd/watched/{username}` answers with `[{movieId, rating}]`,
/// where ids are already mapped to catalog ids.
#[derive(Clone)]
pub struct LetterboxdImporter {
    http_client: HttpClient,
    api_url: String,
}

impl LetterboxdImporter {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    fn watched_url(&self, username: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AppError::Internal(format!("Invalid importer URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Importer URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["letterboxd", "watched", username]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl WatchImporter for LetterboxdImporter {
    async fn fetch_watched(&self, username: &str) -> AppResult<Vec<ImportedEntry>> {
        let url = self.watched_url(username)?;

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                username = %username,
                status = %status,
                body = %body,
                "Importer request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Importer returned status {}: {}",
                status, body
            )));
        }

        let entries: Vec<ImportedEntry> = response.json().await.map_err(|e| {
            AppError::ExternalApi(format!("Importer returned invalid data: {}", e))
        })?;

        tracing::info!(username = %username, count = entries.len(), "Fetched external watch history");

        Ok(entries)
    }
}
