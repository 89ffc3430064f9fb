use crate::error::Result;
use crate::link::{Link, NewLink};
use async_trait::async_trait;
use jiff::Timestamp;

/// Persistence contract for links.
///
/// Every backend owns a [`Codec`](crate::Codec): it mints the public id from
/// the assigned key on create and decodes public ids back to keys on lookup.
/// A public id that does not decode is reported exactly like one that decodes
/// to a missing key, as `Ok(None)`.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Persists `link` under a fresh, unique key.
    ///
    /// Concurrent calls never receive the same key. Either the whole record
    /// becomes visible or, on error, nothing does.
    async fn create(&self, link: NewLink) -> Result<Link>;

    /// Retrieves a link and its visits without side effects.
    async fn read(&self, public_id: &str) -> Result<Option<Link>>;

    /// Appends `at` to the link's visits and returns the updated link.
    ///
    /// Concurrent visits to the same link are all recorded; none is lost to
    /// a read-modify-write race.
    ///
    /// Backends may keep `at` at microsecond resolution only; callers that
    /// need identical results across backends pass whole microseconds.
    async fn visit(&self, public_id: &str, at: Timestamp) -> Result<Option<Link>>;

    /// Short name of the backend, for logs.
    fn backend(&self) -> &'static str;
}
