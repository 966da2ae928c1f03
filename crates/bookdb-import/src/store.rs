//! Database access for the books table
//!
//! The store is an explicitly constructed handle passed into the importer;
//! there is no global pool. It issues only the statements the importer
//! needs: max-id and count reads plus the transactional batch insert.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ImportConfig;
use crate::record::BookRecord;

const INSERT_BOOK: &str = "\
INSERT INTO books (
    id, isbn13, original_title, authors, publication_year,
    image_url, rating_avg, rating_count, rating_1_star,
    rating_2_star, rating_3_star, rating_4_star, rating_5_star
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
ON CONFLICT (id) DO NOTHING";

/// Handle on the books table, scoped to one importer run.
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    /// Connect a small pool using the importer configuration.
    pub async fn connect(config: &ImportConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        debug!("Connected to database");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (dependency injection for tests and callers
    /// that manage their own pool).
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current maximum book id, 0 when the table is empty.
    pub async fn max_id(&self) -> Result<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM books")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read max book id")?;
        Ok(max.unwrap_or(0))
    }

    /// Total row count of the books table.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count books")
    }

    /// Insert a batch of records in a single transaction.
    ///
    /// Each insert is keyed on `id` and no-ops on conflict, so replaying a
    /// committed batch cannot duplicate rows. Any other insert error rolls
    /// the whole batch back; no partial batch ever persists.
    pub async fn insert_batch(&self, batch: &[BookRecord]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin batch transaction")?;

        for book in batch {
            let result = sqlx::query(INSERT_BOOK)
                .bind(book.id)
                .bind(&book.isbn13)
                .bind(&book.title)
                .bind(&book.authors)
                .bind(book.publication_year)
                .bind(&book.image_url)
                .bind(book.rating_avg)
                .bind(book.rating_count)
                .bind(book.rating_1_star)
                .bind(book.rating_2_star)
                .bind(book.rating_3_star)
                .bind(book.rating_4_star)
                .bind(book.rating_5_star)
                .execute(&mut *tx)
                .await;

            if let Err(err) = result {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after batch insert error");
                }
                return Err(err)
                    .with_context(|| format!("Batch insert failed at book id {}", book.id));
            }
        }

        tx.commit().await.context("Failed to commit batch")?;
        Ok(())
    }

    /// Close the underlying pool. Called on every exit path of the CLI.
    pub async fn close(self) {
        self.pool.close().await;
        debug!("Database connection closed");
    }
}
