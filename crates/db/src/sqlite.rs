//! SQLite-backed record store.

use std::str::FromStr;

use async_trait::async_trait;
use shelf_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row};

use crate::error::{StoreError, StoreResult};
use crate::record::{Book, BookFields, BookId};
use crate::BookStore;

/// Schema of the `books` table. The rating range is enforced here as well as
/// at input validation.
pub const CREATE_BOOKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        title            TEXT    NOT NULL,
        author           TEXT    NOT NULL,
        rating           INTEGER NOT NULL,
        cover_identifier TEXT,
        notes            TEXT,
        CONSTRAINT books_title_present  CHECK (length(trim(title)) > 0),
        CONSTRAINT books_author_present CHECK (length(trim(author)) > 0),
        CONSTRAINT books_rating_range   CHECK (rating BETWEEN 1 AND 5)
    );
"#;

const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, author, rating, cover_identifier, notes FROM books";

#[derive(Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    /// Connect to `url`, creating the database file (and its directory) if
    /// needed. In-memory databases are pinned to a single long-lived
    /// connection so every query sees the same database.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }
}

fn book_from_row(row: &SqliteRow) -> StoreResult<Book> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        rating: row.try_get("rating")?,
        cover_id: row.try_get("cover_identifier")?,
        notes: row.try_get("notes")?,
    })
}

/// Map CHECK constraint failures onto typed store errors.
fn translate(err: sqlx::Error, rating: i64) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let message = db_err.message();
        if message.contains("CHECK constraint failed") {
            if message.contains("rating") {
                return StoreError::RatingOutOfRange(rating);
            }
            return StoreError::Constraint(message.to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl BookStore for SqliteBookStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn apply_migration(&self, module: &str, migration: &Migration) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(CREATE_MIGRATIONS_TABLE)
            .execute(&mut *tx)
            .await?;

        let already: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM schema_migrations WHERE module = ? AND id = ?",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_one(&mut *tx)
        .await?;

        if already > 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let conn: &mut sqlx::SqliteConnection = &mut tx;
        conn.execute(sqlx::raw_sql(migration.up)).await?;
        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn get(&self, id: BookId) -> StoreResult<Option<Book>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn insert(&self, fields: BookFields) -> StoreResult<Book> {
        let result = sqlx::query(
            "INSERT INTO books (title, author, rating, cover_identifier, notes)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(fields.rating)
        .bind(&fields.cover_id)
        .bind(&fields.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, fields.rating))?;

        Ok(fields.into_book(result.last_insert_rowid()))
    }

    async fn update(&self, id: BookId, fields: BookFields) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE books
             SET title = ?, author = ?, rating = ?, cover_identifier = ?, notes = ?
             WHERE id = ?",
        )
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(fields.rating)
        .bind(&fields.cover_id)
        .bind(&fields.notes)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, fields.rating))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: BookId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
