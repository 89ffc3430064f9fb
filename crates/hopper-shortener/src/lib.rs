//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], which applies defaults and
//! validation before delegating to a [`LinkStore`](hopper_core::LinkStore).
//! Core types are re-exported from `hopper_core`.

pub mod service;

pub use hopper_core::{BucketWidth, Link, ShortenParams, Shortener, ShortenerError};
pub use service::ShortenerService;
