use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{User, UserUpdate, WatchEntry},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    letterboxd: String,
    allow_watched: bool,
}

#[derive(Debug, FromRow)]
struct WatchedRow {
    movie_id: String,
    rating: f64,
}

impl From<WatchedRow> for WatchEntry {
    fn from(row: WatchedRow) -> Self {
        WatchEntry::new(row.movie_id, row.rating)
    }
}

/// User store backed by the `users` and `watched_movies` tables
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn load_watched(&self, user_id: &str) -> AppResult<Vec<WatchEntry>> {
        let rows: Vec<WatchedRow> = sqlx::query_as(
            r#"
            SELECT movie_id, rating
            FROM watched_movies
            WHERE user_id = $1
            ORDER BY position
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WatchEntry::from).collect())
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, letterboxd, allow_watched FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let watched = self.load_watched(user_id).await?;

        Ok(Some(User {
            id: row.id,
            username: row.username,
            email: row.email,
            letterboxd: row.letterboxd,
            allow_watched: row.allow_watched,
            watched,
        }))
    }

    async fn create_user(&self, user: User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, letterboxd, allow_watched)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.letterboxd)
        .bind(user.allow_watched)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyExists(format!("User {} already exists", user.id)));
        }

        Ok(())
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                letterboxd = COALESCE($4, letterboxd),
                allow_watched = COALESCE($5, allow_watched)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.username)
        .bind(update.email)
        .bind(update.letterboxd)
        .bind(update.allow_watched)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: &str) -> AppResult<bool> {
        // watched_movies rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_watched(&self, user_id: &str, movie_id: &str, rating: f64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO watched_movies (user_id, movie_id, rating)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET rating = EXCLUDED.rating
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(rating)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_watched(&self, user_id: &str, movie_id: &str) -> AppResult<bool> {
        if !self.user_exists(user_id).await? {
            return Ok(false);
        }

        sqlx::query("DELETE FROM watched_movies WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    async fn watch_history(&self, user_id: &str) -> AppResult<Option<Vec<WatchEntry>>> {
        if !self.user_exists(user_id).await? {
            return Ok(None);
        }

        Ok(Some(self.load_watched(user_id).await?))
    }

    async fn merge_watched(
        &self,
        user_id: &str,
        entries: Vec<WatchEntry>,
    ) -> AppResult<Option<usize>> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(None);
        }

        let mut added = 0;
        for entry in entries.iter().filter(|e| !e.movie_id.is_empty()) {
            let result = sqlx::query(
                r#"
                INSERT INTO watched_movies (user_id, movie_id, rating)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, movie_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(&entry.movie_id)
            .bind(entry.rating)
            .execute(&mut *tx)
            .await?;
            added += result.rows_affected() as usize;
        }

        tx.commit().await?;

        Ok(Some(added))
    }
}
