use crate::{decode_key, exhausted_key_space};
use async_trait::async_trait;
use hopper_core::error::{Result, StorageError};
use hopper_core::{Codec, Link, LinkStore, NewLink, RedirectCode, MAX_KEY};
use jiff::Timestamp;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Link records keyed by record key. Values are JSON-serialized [`StoredLink`]s.
const LINKS: TableDefinition<u64, &[u8]> = TableDefinition::new("links_v1");

/// Last issued key per sequence name.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences_v1");
const LINK_SEQUENCE: &str = "links";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLink {
    target: String,
    redirect: RedirectCode,
    visits: Vec<Timestamp>,
}

impl StoredLink {
    fn into_link(self, codec: &Codec, key: u64) -> Link {
        Link::from_parts(codec, key, self.target, self.redirect, self.visits)
    }
}

fn encode_record(record: &StoredLink) -> Result<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| StorageError::InvalidData(format!("cannot serialize link: {e}")))
}

fn decode_record(raw: &[u8]) -> Result<StoredLink> {
    serde_json::from_slice(raw)
        .map_err(|e| StorageError::InvalidData(format!("cannot deserialize link: {e}")))
}

fn map_redb_error(err: impl Into<redb::Error>) -> StorageError {
    let err: redb::Error = err.into();
    let message = err.to_string();

    match err {
        redb::Error::Io(_) | redb::Error::DatabaseAlreadyOpen => StorageError::Unavailable(message),
        _ => StorageError::Operation(message),
    }
}

/// Embedded key-value implementation of the link store contract, on redb.
///
/// redb allows a single write transaction at a time. Create bumps the key
/// sequence and inserts the record in one write transaction; visit reads,
/// appends and writes back in one write transaction. Both are therefore
/// serialized, which is what keeps keys unique and visits lossless.
///
/// redb is synchronous, so every operation runs on the blocking thread pool.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    codec: Codec,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Creates or opens the database file at `path` and makes sure the
    /// tables exist.
    pub fn open(path: impl AsRef<Path>, codec: Codec) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(map_redb_error)?;

        let txn = db.begin_write().map_err(map_redb_error)?;
        {
            txn.open_table(LINKS).map_err(map_redb_error)?;
            txn.open_table(SEQUENCES).map_err(map_redb_error)?;
        }
        txn.commit().map_err(map_redb_error)?;

        info!(path = %path.display(), "opened redb link store");
        Ok(Self {
            db: Arc::new(db),
            codec,
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::Operation(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl LinkStore for RedbStore {
    async fn create(&self, link: NewLink) -> Result<Link> {
        let raw = encode_record(&StoredLink {
            target: link.target.clone(),
            redirect: link.redirect,
            visits: Vec::new(),
        })?;

        let key = self
            .blocking(move |db| {
                let txn = db.begin_write().map_err(map_redb_error)?;
                let key = {
                    let mut sequences = txn.open_table(SEQUENCES).map_err(map_redb_error)?;
                    let last = sequences
                        .get(LINK_SEQUENCE)
                        .map_err(map_redb_error)?
                        .map(|guard| guard.value())
                        .unwrap_or(0);
                    if last >= MAX_KEY {
                        return Err(exhausted_key_space());
                    }
                    let key = last + 1;
                    sequences
                        .insert(LINK_SEQUENCE, key)
                        .map_err(map_redb_error)?;

                    let mut links = txn.open_table(LINKS).map_err(map_redb_error)?;
                    links.insert(key, raw.as_slice()).map_err(map_redb_error)?;
                    key
                };
                txn.commit().map_err(map_redb_error)?;
                Ok(key)
            })
            .await?;

        let link = Link::created(&self.codec, key, link);
        debug!(key, public_id = %link.public_id(), "created link");
        Ok(link)
    }

    async fn read(&self, public_id: &str) -> Result<Option<Link>> {
        let Some(key) = decode_key(&self.codec, public_id) else {
            return Ok(None);
        };

        let record = self
            .blocking(move |db| {
                let txn = db.begin_read().map_err(map_redb_error)?;
                let links = txn.open_table(LINKS).map_err(map_redb_error)?;
                let record = links
                    .get(key)
                    .map_err(map_redb_error)?
                    .map(|guard| decode_record(guard.value()))
                    .transpose()?;
                Ok(record)
            })
            .await?;

        Ok(record.map(|record| record.into_link(&self.codec, key)))
    }

    async fn visit(&self, public_id: &str, at: Timestamp) -> Result<Option<Link>> {
        let Some(key) = decode_key(&self.codec, public_id) else {
            return Ok(None);
        };

        let record = self
            .blocking(move |db| {
                let txn = db.begin_write().map_err(map_redb_error)?;
                let updated = {
                    let mut links = txn.open_table(LINKS).map_err(map_redb_error)?;
                    let existing = links
                        .get(key)
                        .map_err(map_redb_error)?
                        .map(|guard| decode_record(guard.value()))
                        .transpose()?;

                    match existing {
                        Some(mut record) => {
                            record.visits.push(at);
                            let raw = encode_record(&record)?;
                            links.insert(key, raw.as_slice()).map_err(map_redb_error)?;
                            Some(record)
                        }
                        None => None,
                    }
                };

                if updated.is_some() {
                    txn.commit().map_err(map_redb_error)?;
                } else {
                    txn.abort().map_err(map_redb_error)?;
                }
                Ok(updated)
            })
            .await?;

        if record.is_some() {
            trace!(key, "recorded visit");
        }
        Ok(record.map(|record| record.into_link(&self.codec, key)))
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
