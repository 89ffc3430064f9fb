use crate::{decode_key, exhausted_key_space};
use async_trait::async_trait;
use hopper_core::error::{Result, StorageError};
use hopper_core::{Codec, Link, LinkStore, NewLink, RedirectCode};
use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, trace};

const SCHEMA: &str = include_str!("../ddl/sqlite/links.sql");
const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// SQLite implementation of the link store contract.
///
/// Keys come from `AUTOINCREMENT`, so they are never reused. Visits live in
/// their own table, one row per visit; recording a visit is an insert rather
/// than a rewrite of the link row, so concurrent visits cannot clobber each
/// other. Reads fetch the link and its visits inside one transaction to get a
/// consistent snapshot.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    codec: Codec,
}

impl SqliteStore {
    /// Creates a store from an existing pool. The schema must already exist;
    /// see [`SqliteStore::migrate`].
    pub fn new(pool: SqlitePool, codec: Codec) -> Self {
        Self { pool, codec }
    }

    /// Opens a pool for `dsn` and applies the schema.
    ///
    /// In-memory databases exist per connection, so for those the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn connect(dsn: &str, codec: Codec) -> Result<Self> {
        let in_memory = is_in_memory(dsn);

        let mut options = SqliteConnectOptions::from_str(dsn)
            .map_err(map_sqlx_error)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(DEFAULT_MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self::new(pool, codec);
        store.migrate().await?;
        info!(in_memory, "connected to sqlite link store");
        Ok(store)
    }

    /// Creates the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

fn row_id(key: u64) -> Result<i64> {
    i64::try_from(key).map_err(|_| exhausted_key_space())
}

fn parse_redirect(raw: i64) -> Result<RedirectCode> {
    u16::try_from(raw)
        .ok()
        .and_then(|code| RedirectCode::try_from(code).ok())
        .ok_or_else(|| StorageError::InvalidData(format!("invalid redirect code '{raw}'")))
}

fn parse_visited_at(micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid visited_at timestamp '{micros}': {e}"))
    })
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

async fn fetch_link(conn: &mut SqliteConnection, codec: &Codec, key: u64) -> Result<Option<Link>> {
    let id = row_id(key)?;

    let row = sqlx::query(
        r#"
        SELECT target, redirect
        FROM links
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let target: String = row.try_get("target").map_err(map_sqlx_error)?;
    let redirect: i64 = row.try_get("redirect").map_err(map_sqlx_error)?;

    let visits = sqlx::query(
        r#"
        SELECT visited_at
        FROM visits
        WHERE link_id = ?
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_error)?
    .iter()
    .map(|row| {
        let micros: i64 = row.try_get("visited_at").map_err(map_sqlx_error)?;
        parse_visited_at(micros)
    })
    .collect::<Result<Vec<_>>>()?;

    Ok(Some(Link::from_parts(
        codec,
        key,
        target,
        parse_redirect(redirect)?,
        visits,
    )))
}

#[async_trait]
impl LinkStore for SqliteStore {
    async fn create(&self, link: NewLink) -> Result<Link> {
        let row = sqlx::query(
            r#"
            INSERT INTO links (target, redirect)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(&link.target)
        .bind(i64::from(link.redirect.as_u16()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let key = u64::try_from(id)
            .map_err(|_| StorageError::InvalidData(format!("negative link id '{id}'")))?;

        let link = Link::created(&self.codec, key, link);
        debug!(key, public_id = %link.public_id(), "created link");
        Ok(link)
    }

    async fn read(&self, public_id: &str) -> Result<Option<Link>> {
        let Some(key) = decode_key(&self.codec, public_id) else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let link = fetch_link(&mut tx, &self.codec, key).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(link)
    }

    async fn visit(&self, public_id: &str, at: Timestamp) -> Result<Option<Link>> {
        let Some(key) = decode_key(&self.codec, public_id) else {
            return Ok(None);
        };
        let id = row_id(key)?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // The write comes first so the transaction takes the write lock up
        // front instead of upgrading from a read lock.
        let inserted = sqlx::query(
            r#"
            INSERT INTO visits (link_id, visited_at)
            SELECT id, ?
            FROM links
            WHERE id = ?
            "#,
        )
        .bind(at.as_microsecond())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(None);
        }

        let link = fetch_link(&mut tx, &self.codec, key).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        trace!(key, "recorded visit");

        Ok(link)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_dsns() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:links?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://hopper.db"));
    }

    #[test]
    fn rejects_corrupt_redirects() {
        assert!(matches!(parse_redirect(302), Ok(RedirectCode::Found)));
        assert!(matches!(
            parse_redirect(200),
            Err(StorageError::InvalidData(_))
        ));
        assert!(matches!(
            parse_redirect(-1),
            Err(StorageError::InvalidData(_))
        ));
    }

    #[test]
    fn visited_at_round_trips_through_micros() {
        let at: Timestamp = "2024-03-10T14:15:16.123456Z".parse().unwrap();
        assert_eq!(parse_visited_at(at.as_microsecond()).unwrap(), at);
    }
}
