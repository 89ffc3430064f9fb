//! Salted, reversible encoding of numeric record keys into short public ids.
//!
//! The encoding is the single-integer form of the "hashids" construction:
//! it is deterministic for a given salt and alphabet, URL-safe, and hides the
//! sequential nature of the keys from anyone who does not know the salt. It is
//! obfuscation, not encryption.

mod codec;
pub mod error;
mod shuffle;

pub use codec::{Codec, CodecSettings, DEFAULT_ALPHABET, DEFAULT_MIN_LENGTH, MAX_KEY};
pub use error::{DecodeError, SettingsError};
