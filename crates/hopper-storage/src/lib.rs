//! Link store backends.
//!
//! Three interchangeable [`LinkStore`] implementations:
//!
//! - [`InMemoryStore`]: process-local, for tests and ephemeral runs.
//! - [`SqliteStore`]: relational, keys from `AUTOINCREMENT`.
//! - [`RedbStore`]: embedded key-value, keys from a stored sequence.

pub mod embedded;
pub mod memory;
pub mod sqlite;

pub use embedded::RedbStore;
pub use hopper_core::error::{Result, StorageError};
pub use hopper_core::LinkStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use hopper_core::Codec;
use tracing::trace;

/// Decodes a public id to a record key, treating failures as "no such link".
pub(crate) fn decode_key(codec: &Codec, public_id: &str) -> Option<u64> {
    match codec.decode(public_id) {
        Ok(key) => Some(key),
        Err(err) => {
            trace!(public_id, error = %err, "public id does not decode");
            None
        }
    }
}

pub(crate) fn exhausted_key_space() -> StorageError {
    StorageError::Operation("link key space exhausted".to_string())
}
