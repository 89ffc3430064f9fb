//! Core types and traits for the Hopper URL shortener.
//!
//! This crate holds the link model, visit aggregation, the error taxonomy and
//! the [`LinkStore`] / [`Shortener`] contracts shared by the storage backends
//! and the shortener service.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod link;
pub mod public_id;
pub mod shortener;
pub mod store;

pub use aggregate::BucketWidth;
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use error::{ShortenerError, StorageError, UnsupportedBucketWidth};
pub use hopper_codec::{Codec, CodecSettings, DecodeError, DEFAULT_MIN_LENGTH, MAX_KEY};
pub use link::{Link, NewLink, RedirectCode};
pub use public_id::PublicId;
pub use shortener::{ShortenParams, Shortener};
pub use store::LinkStore;
