//! Behaviour every link store backend must share.

#![allow(dead_code)]

use hopper_core::{BucketWidth, Codec, CodecSettings, LinkStore, NewLink, RedirectCode};
use jiff::{SignedDuration, Timestamp};
use std::collections::HashSet;
use std::sync::Arc;

pub fn codec() -> Codec {
    Codec::new(
        CodecSettings::builder()
            .salt("5c1e0b6a9d3f47e2b8a4c07f61d92e3b")
            .build(),
    )
    .expect("valid codec settings")
}

pub fn new_link(url: &str) -> NewLink {
    NewLink {
        target: url.to_string(),
        redirect: RedirectCode::Found,
    }
}

pub async fn create_then_read<S: LinkStore>(store: &S) {
    let created = store
        .create(NewLink {
            target: "https://example.com/a?b=c".to_string(),
            redirect: RedirectCode::PermanentRedirect,
        })
        .await
        .unwrap();

    assert_eq!(codec().decode(created.public_id().as_str()), Ok(created.key()));
    assert!(created.visits().is_empty());

    let read = store
        .read(created.public_id().as_str())
        .await
        .unwrap()
        .expect("created link should be readable");
    assert_eq!(read.key(), created.key());
    assert_eq!(read.public_id(), created.public_id());
    assert_eq!(read.target(), "https://example.com/a?b=c");
    assert_eq!(read.redirect(), RedirectCode::PermanentRedirect);
    assert!(read.visits().is_empty());
}

pub async fn unknown_ids_are_none<S: LinkStore>(store: &S) {
    let created = store.create(new_link("https://example.com")).await.unwrap();

    for garbage in ["", "!!!", "a", "not-an-id"] {
        assert!(store.read(garbage).await.unwrap().is_none(), "{garbage:?}");
        assert!(
            store.visit(garbage, Timestamp::now()).await.unwrap().is_none(),
            "{garbage:?}"
        );
    }

    // a valid encoding of a key nobody was given
    let unused = codec().encode(created.key() + 1_000);
    assert!(store.read(&unused).await.unwrap().is_none());
    assert!(store.visit(&unused, Timestamp::now()).await.unwrap().is_none());
    assert!(store.read(&unused).await.unwrap().is_none());
}

pub async fn read_has_no_side_effects<S: LinkStore>(store: &S) {
    let created = store.create(new_link("https://example.com")).await.unwrap();
    let id = created.public_id().as_str();

    store.visit(id, Timestamp::now()).await.unwrap().unwrap();
    for _ in 0..3 {
        let read = store.read(id).await.unwrap().unwrap();
        assert_eq!(read.visits().len(), 1);
    }
}

pub async fn visit_returns_updated_link<S: LinkStore>(store: &S) {
    let created = store.create(new_link("https://example.com")).await.unwrap();
    let id = created.public_id().as_str();
    let t: Timestamp = "2024-03-10T14:15:16Z".parse().unwrap();

    let first = store.visit(id, t).await.unwrap().unwrap();
    assert_eq!(first.visits(), &[t]);
    assert_eq!(first.target(), "https://example.com");
    assert_eq!(first.redirect(), RedirectCode::Found);

    let second = store
        .visit(id, t + SignedDuration::from_secs(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.visits(), &[t, t + SignedDuration::from_secs(5)]);
}

pub async fn visits_only_touch_their_link<S: LinkStore>(store: &S) {
    let a = store.create(new_link("https://a.example")).await.unwrap();
    let b = store.create(new_link("https://b.example")).await.unwrap();

    store
        .visit(a.public_id().as_str(), Timestamp::now())
        .await
        .unwrap();

    let b = store.read(b.public_id().as_str()).await.unwrap().unwrap();
    assert!(b.visits().is_empty());
}

pub async fn visits_aggregate_per_second<S: LinkStore>(store: &S) {
    let created = store.create(new_link("https://example.com")).await.unwrap();
    let id = created.public_id().as_str();
    let t: Timestamp = "2024-03-10T14:15:16.500Z".parse().unwrap();
    let s = SignedDuration::from_secs;

    for at in [t, t + s(1), t + s(1), t + s(2), t + s(2), t + s(2)] {
        store.visit(id, at).await.unwrap().unwrap();
    }

    let read = store.read(id).await.unwrap().unwrap();
    let counts = read.visits_per(BucketWidth::Second);
    assert_eq!(counts.len(), 3);
    assert_eq!(counts.values().copied().collect::<Vec<_>>(), vec![1, 2, 3]);

    let hourly = read.visits_per(BucketWidth::Hour);
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly["2024-03-10T14"], 6);
}

pub async fn concurrent_creates_are_unique<S: LinkStore>(store: Arc<S>, count: usize) {
    let mut handles = Vec::with_capacity(count);
    for i in 0..count {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create(new_link(&format!("https://example{i}.com")))
                .await
                .unwrap()
        }));
    }

    let mut ids = HashSet::with_capacity(count);
    let mut keys = HashSet::with_capacity(count);
    for handle in handles {
        let link = handle.await.unwrap();
        keys.insert(link.key());
        ids.insert(link.public_id().clone());
    }

    assert_eq!(keys.len(), count);
    assert_eq!(ids.len(), count);

    for id in &ids {
        assert!(store.read(id.as_str()).await.unwrap().is_some());
    }
}

pub async fn concurrent_visits_are_lossless<S: LinkStore>(store: Arc<S>, count: usize) {
    let created = store.create(new_link("https://example.com")).await.unwrap();

    let mut handles = Vec::with_capacity(count);
    for _ in 0..count {
        let store = Arc::clone(&store);
        let id = created.public_id().clone();
        handles.push(tokio::spawn(async move {
            store
                .visit(id.as_str(), Timestamp::now())
                .await
                .unwrap()
                .expect("link exists")
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
    assert_eq!(read.visits().len(), count);
}
