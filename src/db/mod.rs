pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::InMemoryUserStore;
pub use postgres::{create_pool, PgUserStore};
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;

use crate::{
    error::AppResult,
    models::{User, UserUpdate, WatchEntry},
};

/// Storage for user profiles and their watch history
///
/// Methods addressing a single user return `None`/`false` when that user does
/// not exist, leaving the caller to decide how to report it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>>;

    /// Fails with `AppError::AlreadyExists` if the id is taken
    async fn create_user(&self, user: User) -> AppResult<()>;

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> AppResult<bool>;

    async fn delete_user(&self, user_id: &str) -> AppResult<bool>;

    /// Adds a watched movie or replaces its rating
    async fn upsert_watched(&self, user_id: &str, movie_id: &str, rating: f64) -> AppResult<bool>;

    async fn remove_watched(&self, user_id: &str, movie_id: &str) -> AppResult<bool>;

    /// The user's watch history, one entry per movie
    async fn watch_history(&self, user_id: &str) -> AppResult<Option<Vec<WatchEntry>>>;

    /// Appends entries for movies not already watched, returning how many were added
    async fn merge_watched(
        &self,
        user_id: &str,
        entries: Vec<WatchEntry>,
    ) -> AppResult<Option<usize>>;
}
