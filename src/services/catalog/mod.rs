/// Movie metadata lookups
///
/// The statistics endpoint needs metadata for every movie a user has watched.
/// Providers resolve ids in bulk and leave out ids they do not know, so a
/// partial answer is still a successful one.
use crate::{error::AppResult, models::MovieMetadata};

pub mod movie_service;

pub use movie_service::MovieServiceCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fetches metadata for the given movie ids
    ///
    /// Unknown ids are omitted from the result rather than failing the batch.
    async fn fetch_batch(&self, movie_ids: &[String]) -> AppResult<Vec<MovieMetadata>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
