//! Record store backends.
//!
//! The engine needs four primitives: get, put, delete, scan-all. The SQLite
//! store persists one database per project; the in-memory store backs tests
//! and environments without durable storage. Callers observe identical
//! semantics either way.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::error::{FsError, FsResult};
use crate::record::{EntryKind, FileRecord};

/// Storage primitives behind [`ProjectFilesystem`](crate::ProjectFilesystem).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, path: &str) -> FsResult<Option<FileRecord>>;
    async fn put(&self, record: FileRecord) -> FsResult<()>;
    async fn delete(&self, path: &str) -> FsResult<()>;
    async fn all(&self) -> FsResult<Vec<FileRecord>>;
}

/// In-memory store. Semantically identical to the SQLite store; contents die
/// with the process.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, FileRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, path: &str) -> FsResult<Option<FileRecord>> {
        Ok(self.records.get(path).map(|entry| entry.value().clone()))
    }

    async fn put(&self, record: FileRecord) -> FsResult<()> {
        self.records.insert(record.path.clone(), record);
        Ok(())
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        self.records.remove(path);
        Ok(())
    }

    async fn all(&self) -> FsResult<Vec<FileRecord>> {
        Ok(self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// SQLite-backed store: one database file per project, a single `entries`
/// table keyed by normalized path.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn open(path: impl AsRef<Path>) -> FsResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS entries (
                path TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                content TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> FsResult<FileRecord> {
        let kind_text: String = row.try_get("kind")?;
        let kind = EntryKind::parse(&kind_text).ok_or_else(|| FsError::Storage {
            reason: format!("unknown entry kind '{kind_text}' in store"),
        })?;
        Ok(FileRecord {
            path: row.try_get("path")?,
            kind,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, path: &str) -> FsResult<Option<FileRecord>> {
        let row = sqlx::query(
            "SELECT path, kind, content, created_at, updated_at FROM entries WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn put(&self, record: FileRecord) -> FsResult<()> {
        sqlx::query(
            "INSERT INTO entries (path, kind, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET
                kind = excluded.kind,
                content = excluded.content,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
        )
        .bind(&record.path)
        .bind(record.kind.as_str())
        .bind(&record.content)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        sqlx::query("DELETE FROM entries WHERE path = ?")
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all(&self) -> FsResult<Vec<FileRecord>> {
        let rows =
            sqlx::query("SELECT path, kind, content, created_at, updated_at FROM entries")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(Self::record_from_row).collect()
    }
}
