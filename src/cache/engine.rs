// (C) Coralbits SL 2025
// This file is part of Pgcache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Connection, PgConnection, Row};
use tracing::{debug, info};

use crate::cache::key::CacheKey;
use crate::cache::statements::StatementSet;
use crate::config::CacheConfig;
use crate::types::CacheError;

// SQLSTATE for "relation already exists", raised when two processes
// bootstrap the same table concurrently.
const DUPLICATE_TABLE: &str = "42P07";

/// A key-value cache persisted in a Postgres table.
///
/// Each engine owns one connection and one statement set scoped to one table.
/// The table is created on construction when missing, as an UNLOGGED table:
/// cache contents are disposable, so losing them on a crash is a fair trade
/// for write throughput. Several engines, in the same process or not, may
/// share one table.
///
/// Values are stored as self-describing serde_json bytes in the `value`
/// bytea column; anything `Serialize + DeserializeOwned` round-trips,
/// including a cached `None`. Methods take `&mut self` since a single
/// Postgres connection cannot multiplex queries; use one engine per task.
pub struct PgCache {
    conn: PgConnection,
    table_name: String,
    statements: StatementSet,
}

impl PgCache {
    /// Connects, creates the cache table if it does not exist yet, and
    /// builds the statement set. Connection failure is returned as-is;
    /// retrying is the caller's call.
    pub async fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let options = config.connect_options()?;
        info!("Connecting to Postgres cache table={}", config.table_name);
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(CacheError::Connection)?;

        let statements = StatementSet::new(&config.table_name);
        let mut cache = Self {
            conn,
            table_name: config.table_name,
            statements,
        };

        if !cache.table_exists().await? {
            cache.create_table().await?;
        }
        debug!(
            "Cache ready table={} statements={}",
            cache.table_name, cache.statements.id
        );
        Ok(cache)
    }

    pub async fn from_url(url: &str) -> Result<Self, CacheError> {
        Self::new(CacheConfig::from_url(url)).await
    }

    /// Connects using the `DATABASE_URL` environment variable.
    pub async fn from_env() -> Result<Self, CacheError> {
        Self::new(CacheConfig::from_env()?).await
    }

    /// The underlying Postgres connection.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn table_exists(&mut self) -> Result<bool, CacheError> {
        let row = sqlx::query("SELECT 1 FROM pg_class WHERE pg_class.relname = $1::text")
            .bind(&self.table_name)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(row.is_some())
    }

    async fn create_table(&mut self) -> Result<(), CacheError> {
        let sql = format!(
            "CREATE UNLOGGED TABLE {t} (key text UNIQUE NOT NULL, value bytea NULL)",
            t = self.table_name
        );
        match sqlx::query(&sql).execute(&mut self.conn).await {
            Ok(_) => {
                info!("Created cache table name={}", self.table_name);
                Ok(())
            }
            // lost the bootstrap race to another process, the table is there
            Err(e) if is_duplicate_table(&e) => {
                debug!("Cache table already created concurrently name={}", self.table_name);
                Ok(())
            }
            Err(e) => Err(CacheError::Query(e)),
        }
    }

    /// Stores `value` under `key`, replacing any previous value atomically.
    pub async fn write<T: Serialize>(
        &mut self,
        key: impl Into<CacheKey>,
        value: &T,
    ) -> Result<(), CacheError> {
        let key = key.into().normalize();
        let bytes = serde_json::to_vec(value).map_err(CacheError::Serialization)?;
        sqlx::query(&self.statements.write)
            .bind(&key)
            .bind(&bytes)
            .execute(&mut self.conn)
            .await?;
        debug!("write key={} bytes={}", key, bytes.len());
        Ok(())
    }

    /// Returns the value stored under `key`, or `None` when there is no row.
    /// A cached null is a present value: reading it as `Option<U>` yields
    /// `Some(None)`, distinct from the absent `None`.
    pub async fn read<T: DeserializeOwned>(
        &mut self,
        key: impl Into<CacheKey>,
    ) -> Result<Option<T>, CacheError> {
        let key = key.into().normalize();
        let row = sqlx::query(&self.statements.read)
            .bind(&key)
            .fetch_optional(&mut self.conn)
            .await?;
        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        // a foreign writer may have left a SQL NULL; treat it as a cached null
        let bytes: Option<Vec<u8>> = row.try_get("value")?;
        let value = match bytes {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(CacheError::Serialization)?,
            None => serde_json::from_slice(b"null").map_err(CacheError::Serialization)?,
        };
        Ok(Some(value))
    }

    /// Removes `key`. Returns `true` if a row existed and was deleted.
    pub async fn delete(&mut self, key: impl Into<CacheKey>) -> Result<bool, CacheError> {
        let key = key.into().normalize();
        let result = sqlx::query(&self.statements.delete)
            .bind(&key)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Returns `true` if `key` has a row, without transferring the value.
    pub async fn exists(&mut self, key: impl Into<CacheKey>) -> Result<bool, CacheError> {
        let key = key.into().normalize();
        let row = sqlx::query(&self.statements.exists)
            .bind(&key)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(row.is_some())
    }

    /// Removes every entry in the table. This affects all processes sharing
    /// the cache table.
    pub async fn clear(&mut self) -> Result<(), CacheError> {
        sqlx::query(&self.statements.clear)
            .execute(&mut self.conn)
            .await?;
        info!("Cleared cache table name={}", self.table_name);
        Ok(())
    }

    /// Read-through: returns the stored value when the row is present,
    /// otherwise computes one, writes it and returns it. Hit/miss is decided
    /// by row presence, so a cached null is a hit and is never recomputed.
    ///
    /// There is no single-flight guard: two callers racing on the same
    /// missing key both compute, and the last write wins per the upsert.
    pub async fn fetch<T, F>(
        &mut self,
        key: impl Into<CacheKey>,
        compute: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let key = key.into().normalize();
        if let Some(value) = self.read(CacheKey::Str(key.clone())).await? {
            return Ok(value);
        }
        let value = compute();
        self.write(CacheKey::Str(key), &value).await?;
        Ok(value)
    }
}

fn is_duplicate_table(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(DUPLICATE_TABLE),
        _ => false,
    }
}
