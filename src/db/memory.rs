use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{User, UserUpdate, WatchEntry},
};

/// Process-local user store
///
/// Backs the HTTP tests; nothing is persisted across restarts.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn create_user(&self, user: User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(AppError::AlreadyExists(format!("User {} already exists", user.id)));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> AppResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.users.write().await.remove(user_id).is_some())
    }

    async fn upsert_watched(&self, user_id: &str, movie_id: &str, rating: f64) -> AppResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.upsert_watched(movie_id, rating);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_watched(&self, user_id: &str, movie_id: &str) -> AppResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.remove_watched(movie_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn watch_history(&self, user_id: &str) -> AppResult<Option<Vec<WatchEntry>>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|user| user.watched.clone()))
    }

    async fn merge_watched(
        &self,
        user_id: &str,
        entries: Vec<WatchEntry>,
    ) -> AppResult<Option<usize>> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(user_id)
            .map(|user| user.merge_watched(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User::new(id.to_string(), "sam".to_string(), "sam@example.com".to_string())
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        store.create_user(user("u1")).await.unwrap();

        let result = store.create_user(user("u1")).await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_watched_lifecycle() {
        let store = InMemoryUserStore::new();
        store.create_user(user("u1")).await.unwrap();

        assert!(store.upsert_watched("u1", "m1", 7.0).await.unwrap());
        assert!(store.upsert_watched("u1", "m1", 9.0).await.unwrap());
        assert!(store.upsert_watched("u1", "m2", 0.0).await.unwrap());

        let history = store.watch_history("u1").await.unwrap().unwrap();
        assert_eq!(history, vec![WatchEntry::new("m1", 9.0), WatchEntry::new("m2", 0.0)]);

        assert!(store.remove_watched("u1", "m1").await.unwrap());
        let history = store.watch_history("u1").await.unwrap().unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = InMemoryUserStore::new();

        assert!(!store.upsert_watched("ghost", "m1", 5.0).await.unwrap());
        assert!(!store.remove_watched("ghost", "m1").await.unwrap());
        assert!(!store.delete_user("ghost").await.unwrap());
        assert!(store.watch_history("ghost").await.unwrap().is_none());
        assert!(store.merge_watched("ghost", vec![]).await.unwrap().is_none());
    }
}
