// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A durable map from fixed keys to opaque text blobs.
///
/// Every collection is read and written whole, so this is the only storage
/// surface the rest of the crate needs. A `set` replaces the previous value
/// in one step: readers see either the old blob or the new one.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the blob stored under `key`, or `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the blob stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

const CREATE_KV_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at TIMESTAMP NOT NULL
    );
"#;

/// SQLite-backed store: one row per key in the `kv_store` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database at `database_url`, creating the file (and its
    /// parent directory) if it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            if let Some(dir) = database_dir(database_url) {
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("Failed to create directory {}", dir.display()))?;
            }
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url)
                .await
                .context("Failed to create database")?;
        } else {
            info!("Database already exists.");
        }

        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool and makes sure the `kv_store` table exists.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_KV_TABLE)
            .execute(&pool)
            .await
            .context("Failed to create 'kv_store' table")?;

        debug!("'kv_store' table is ready.");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{key}'"))?;

        debug!(key, found = value.is_some(), "kv get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write key '{key}'"))?;

        debug!(key, bytes = value.len(), "kv set");
        Ok(())
    }
}

/// In-process store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a blob directly, bypassing the async interface.
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
    }

    /// Reads a blob directly, bypassing the async interface.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.seed(key, value);
        Ok(())
    }
}

/// Directory holding the database file named by a `sqlite:` URL, if any.
fn database_dir(database_url: &str) -> Option<std::path::PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let file = rest.split('?').next().unwrap_or(rest);
    if file.is_empty() || file.contains(":memory:") {
        return None;
    }
    Path::new(file)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
