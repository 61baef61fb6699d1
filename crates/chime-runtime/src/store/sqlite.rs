//! SQLite storage backend.
//!
//! Scopes and prefixes live in two tables created by the embedded
//! migrations. Get-or-create relies on the `UNIQUE(frontend, kind,
//! native_id)` constraint: `INSERT .. ON CONFLICT DO NOTHING` followed by a
//! `SELECT` returns the same row to every concurrent caller.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chime_core::{
    CommandType, Prefix, PrefixStore, Scope, ScopeKey, ScopeKind, ScopeStore, StoreError,
    StoreResult,
};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info, warn};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A [`ScopeStore`] and [`PrefixStore`] on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Opens the database at `path`, creating it if needed, and runs the
    /// migrations. `:memory:` opens a private in-memory database.
    pub async fn connect(path: &str) -> StoreResult<Self> {
        let pool = if path == ":memory:" {
            // Every store gets its own shared-cache database so parallel
            // tests never see each other's rows.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let uri = format!(
                "file:chime-memdb-{}-{id}?mode=memory&cache=shared",
                std::process::id()
            );
            let options = SqliteConnectOptions::new()
                .filename(&uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await
                .map_err(StoreError::backend)?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await
                .map_err(StoreError::backend)?
        };

        info!(path = %path, "Database connected");
        Self::from_pool(pool).await
    }

    /// Wraps an existing pool and runs the migrations.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StoreError::backend)?;
        debug!("Database migrations checked/applied");

        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every connection. Later calls fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed => StoreError::Closed,
        other => StoreError::backend(other),
    }
}

fn decode_prefix((prefix, kind): (String, i64)) -> StoreResult<Prefix> {
    let kind = CommandType::from_db(kind)
        .ok_or_else(|| StoreError::corrupt(format!("unknown command type {kind} for prefix '{prefix}'")))?;
    Ok(Prefix::new(kind, prefix))
}

#[async_trait]
impl ScopeStore for SqliteStore {
    async fn scope_get_or_create(&self, key: &ScopeKey) -> StoreResult<Scope> {
        sqlx::query(
            "INSERT INTO scopes (frontend, kind, native_id) VALUES (?, ?, ?) \
             ON CONFLICT (frontend, kind, native_id) DO NOTHING",
        )
        .bind(&key.frontend)
        .bind(key.kind.as_str())
        .bind(&key.native_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        let id: i64 = sqlx::query_scalar(
            "SELECT id FROM scopes WHERE frontend = ? AND kind = ? AND native_id = ?",
        )
        .bind(&key.frontend)
        .bind(key.kind.as_str())
        .bind(&key.native_id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(Scope(id))
    }

    async fn scope_key(&self, scope: Scope) -> StoreResult<Option<ScopeKey>> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT frontend, kind, native_id FROM scopes WHERE id = ?")
                .bind(scope.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(|(frontend, kind, native_id)| {
            let kind = ScopeKind::parse(&kind)
                .ok_or_else(|| StoreError::corrupt(format!("unknown scope kind '{kind}'")))?;
            Ok(ScopeKey::new(frontend, kind, native_id))
        })
        .transpose()
    }
}

#[async_trait]
impl PrefixStore for SqliteStore {
    async fn prefix_list(&self, place: Scope) -> StoreResult<Vec<Prefix>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT prefix, kind FROM prefixes WHERE place = ? ORDER BY id")
                .bind(place.get())
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;

        rows.into_iter().map(decode_prefix).collect()
    }

    async fn prefix_insert(&self, place: Scope, prefix: &Prefix) -> StoreResult<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO prefixes (place, prefix, kind) VALUES (?, ?, ?)")
                .bind(place.get())
                .bind(&prefix.prefix)
                .bind(prefix.kind.to_db())
                .execute(&self.pool)
                .await
                .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn prefix_insert_many(&self, place: Scope, prefixes: &[Prefix]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        for prefix in prefixes {
            sqlx::query("INSERT OR IGNORE INTO prefixes (place, prefix, kind) VALUES (?, ?, ?)")
                .bind(place.get())
                .bind(&prefix.prefix)
                .bind(prefix.kind.to_db())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }
        tx.commit().await.map_err(backend)
    }

    async fn prefix_delete(&self, place: Scope, literal: &str) -> StoreResult<Option<Prefix>> {
        let row: Option<(String, i64)> = sqlx::query_as(
            "DELETE FROM prefixes WHERE place = ? AND prefix = ? RETURNING prefix, kind",
        )
        .bind(place.get())
        .bind(literal)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(decode_prefix).transpose()
    }

    async fn prefix_reset(&self, place: Scope) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM prefixes WHERE place = ?")
            .bind(place.get())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn store() -> SqliteStore {
        SqliteStore::connect(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = store().await;
        let alice = ScopeKey::person("discord", "alice");

        let first = store.scope_get_or_create(&alice).await.unwrap();
        let again = store.scope_get_or_create(&alice).await.unwrap();
        let place = store
            .scope_get_or_create(&ScopeKey::place("discord", "alice"))
            .await
            .unwrap();

        assert_eq!(first, again);
        assert_ne!(first, place);
        assert_eq!(store.scope_key(first).await.unwrap(), Some(alice));
        assert_eq!(store.scope_key(Scope(9999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_first_sight() {
        let store = Arc::new(store().await);
        let key = ScopeKey::place("twitch", "channel");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                tokio::spawn(async move { store.scope_get_or_create(&key).await.unwrap() })
            })
            .collect();

        let mut scopes = Vec::new();
        for handle in handles {
            scopes.push(handle.await.unwrap());
        }
        scopes.dedup();
        assert_eq!(scopes.len(), 1);
    }

    #[tokio::test]
    async fn test_prefix_rows() {
        let store = store().await;
        let place = Scope(1);
        let other = Scope(2);

        store
            .prefix_insert_many(
                place,
                &[
                    Prefix::new(CommandType::Normal, "!"),
                    Prefix::new(CommandType::Advanced, "$"),
                ],
            )
            .await
            .unwrap();
        assert!(store.prefix_insert(place, &Prefix::new(CommandType::Normal, "?")).await.unwrap());
        assert!(!store.prefix_insert(place, &Prefix::new(CommandType::Advanced, "?")).await.unwrap());
        assert!(store.prefix_insert(other, &Prefix::new(CommandType::Normal, "?")).await.unwrap());

        let listed: Vec<_> = store
            .prefix_list(place)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.prefix)
            .collect();
        assert_eq!(listed, vec!["!", "$", "?"]);

        assert_eq!(
            store.prefix_delete(place, "$").await.unwrap(),
            Some(Prefix::new(CommandType::Advanced, "$"))
        );
        assert_eq!(store.prefix_delete(place, "$").await.unwrap(), None);

        assert_eq!(store.prefix_reset(place).await.unwrap(), 2);
        assert!(store.prefix_list(place).await.unwrap().is_empty());
        assert_eq!(store.prefix_list(other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool() {
        let store = store().await;
        store.close().await;

        let err = store
            .scope_get_or_create(&ScopeKey::person("x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }
}
