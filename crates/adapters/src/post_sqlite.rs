//! SQLite post store implementation

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chirp_domain::{Clock, FEED_LIMIT, Post, PostStore, PostStoreError};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

type PostRow = (String, String, String, i64);

/// SQLite-backed post store
pub struct SqlitePostStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqlitePostStore {
    /// Create a new SQLite post store, initializing the database if needed
    pub async fn new(
        db_path: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PostStoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PostStoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| PostStoreError::Database(e.to_string()))?;

        let store = Self { pool, clock };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory(clock: Arc<dyn Clock>) -> Result<Self, PostStoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| PostStoreError::Database(e.to_string()))?;

        let store = Self { pool, clock };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), PostStoreError> {
        // Timestamps are unix nanoseconds so ORDER BY gives the exact
        // recency order; RFC 3339 text does not sort across fractional
        // second widths.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                author_id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at_ns INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PostStoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_posts_author
            ON posts(author_id, created_at_ns)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PostStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_post(row: PostRow) -> Result<Post, PostStoreError> {
        let (id, author_id, content, created_at_ns) = row;

        let id =
            Uuid::parse_str(&id).map_err(|e| PostStoreError::Serialization(e.to_string()))?;

        let created_at = OffsetDateTime::from_unix_timestamp_nanos(created_at_ns as i128)
            .map_err(|e| PostStoreError::Serialization(e.to_string()))?;

        Ok(Post {
            id,
            author_id,
            content,
            created_at,
        })
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn list_recent(&self) -> Result<Vec<Post>, PostStoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, content, created_at_ns
            FROM posts
            ORDER BY created_at_ns DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(FEED_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PostStoreError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_post).collect()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Post, PostStoreError> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, author_id, content, created_at_ns FROM posts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PostStoreError::Database(e.to_string()))?;

        match row {
            Some(row) => Self::row_to_post(row),
            None => Err(PostStoreError::NotFound(id)),
        }
    }

    async fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>, PostStoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, content, created_at_ns
            FROM posts
            WHERE author_id = ?
            ORDER BY created_at_ns DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(author_id)
        .bind(FEED_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PostStoreError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_post).collect()
    }

    async fn create(&self, author_id: &str, content: &str) -> Result<Post, PostStoreError> {
        if content.trim().is_empty() {
            return Err(PostStoreError::EmptyContent);
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: self.clock.now(),
        };

        sqlx::query(
            "INSERT INTO posts (id, author_id, content, created_at_ns) VALUES (?, ?, ?, ?)",
        )
        .bind(post.id.to_string())
        .bind(&post.author_id)
        .bind(&post.content)
        .bind(post.created_at.unix_timestamp_nanos() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| PostStoreError::Database(e.to_string()))?;

        Ok(post)
    }
}
