use crate::{decode_key, exhausted_key_space};
use async_trait::async_trait;
use dashmap::DashMap;
use hopper_core::error::Result;
use hopper_core::{Codec, Link, LinkStore, NewLink, RedirectCode, MAX_KEY};
use jiff::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// In-memory storage entry for a link.
#[derive(Debug, Clone)]
struct Entry {
    target: String,
    redirect: RedirectCode,
    visits: Vec<Timestamp>,
}

impl Entry {
    fn to_link(&self, codec: &Codec, key: u64) -> Link {
        Link::from_parts(
            codec,
            key,
            self.target.clone(),
            self.redirect,
            self.visits.clone(),
        )
    }
}

/// In-memory implementation of [`LinkStore`] using DashMap.
///
/// Keys come from an atomic counter, so concurrent creates never collide.
/// A visit appends while holding the write lock of the entry's shard, which
/// serializes appends to the same link.
#[derive(Debug)]
pub struct InMemoryStore {
    codec: Codec,
    links: DashMap<u64, Entry>,
    last_key: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            links: DashMap::new(),
            last_key: AtomicU64::new(0),
        }
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn create(&self, link: NewLink) -> Result<Link> {
        let key = self.last_key.fetch_add(1, Ordering::SeqCst) + 1;
        if key > MAX_KEY {
            return Err(exhausted_key_space());
        }

        self.links.insert(
            key,
            Entry {
                target: link.target.clone(),
                redirect: link.redirect,
                visits: Vec::new(),
            },
        );

        let link = Link::created(&self.codec, key, link);
        debug!(key, public_id = %link.public_id(), "created link");
        Ok(link)
    }

    async fn read(&self, public_id: &str) -> Result<Option<Link>> {
        let Some(key) = decode_key(&self.codec, public_id) else {
            return Ok(None);
        };

        Ok(self
            .links
            .get(&key)
            .map(|entry| entry.to_link(&self.codec, key)))
    }

    async fn visit(&self, public_id: &str, at: Timestamp) -> Result<Option<Link>> {
        let Some(key) = decode_key(&self.codec, public_id) else {
            return Ok(None);
        };

        let Some(mut entry) = self.links.get_mut(&key) else {
            return Ok(None);
        };
        entry.visits.push(at);
        trace!(key, visits = entry.visits.len(), "recorded visit");

        Ok(Some(entry.to_link(&self.codec, key)))
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::CodecSettings;
    use jiff::SignedDuration;
    use std::sync::Arc;

    fn store() -> InMemoryStore {
        let codec = Codec::new(CodecSettings::builder().salt("memory-tests").build()).unwrap();
        InMemoryStore::new(codec)
    }

    fn new_link(url: &str) -> NewLink {
        NewLink {
            target: url.to_string(),
            redirect: RedirectCode::Found,
        }
    }

    #[tokio::test]
    async fn create_and_read() {
        let store = store();

        let created = store.create(new_link("https://example.com")).await.unwrap();
        assert_eq!(created.key(), 1);

        let read = store
            .read(created.public_id().as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, created);
        assert_eq!(read.target(), "https://example.com");
    }

    #[tokio::test]
    async fn keys_are_sequential() {
        let store = store();

        let first = store.create(new_link("https://one.example")).await.unwrap();
        let second = store.create(new_link("https://two.example")).await.unwrap();

        assert_eq!(first.key(), 1);
        assert_eq!(second.key(), 2);
        assert_ne!(first.public_id(), second.public_id());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn read_unknown_and_garbage() {
        let store = store();

        assert!(store.read("!!!").await.unwrap().is_none());
        assert!(store.read("").await.unwrap().is_none());

        // decodes fine, but nothing was created under it
        let unused = store.codec.encode(99);
        assert!(store.read(&unused).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_has_no_side_effects() {
        let store = store();
        let created = store.create(new_link("https://example.com")).await.unwrap();

        for _ in 0..3 {
            let read = store.read(created.public_id().as_str()).await.unwrap();
            assert!(read.unwrap().visits().is_empty());
        }
    }

    #[tokio::test]
    async fn visit_appends_in_order() {
        let store = store();
        let created = store.create(new_link("https://example.com")).await.unwrap();
        let id = created.public_id().as_str();

        let t = Timestamp::now();
        store.visit(id, t).await.unwrap();
        let after = store
            .visit(id, t + SignedDuration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.visits(), &[t, t + SignedDuration::from_secs(1)]);
    }

    #[tokio::test]
    async fn visit_unknown_is_none() {
        let store = store();
        assert!(store.visit("nope", Timestamp::now()).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_visits_are_not_lost() {
        let store = Arc::new(store());
        let created = store.create(new_link("https://example.com")).await.unwrap();

        let mut handles = vec![];
        for _ in 0..50 {
            let store = Arc::clone(&store);
            let id = created.public_id().clone();
            handles.push(tokio::spawn(async move {
                store.visit(id.as_str(), Timestamp::now()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let read = store
            .read(created.public_id().as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.visits().len(), 50);
    }
}
