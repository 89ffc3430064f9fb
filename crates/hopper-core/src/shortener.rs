use crate::aggregate::BucketWidth;
use crate::link::Link;
use async_trait::async_trait;
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a short link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenParams {
    /// The URL to redirect to.
    pub target: String,
    /// Redirect status. `0` means unset and selects 302 Found.
    pub redirect: u16,
}

impl ShortenParams {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            redirect: 0,
        }
    }

    pub fn with_redirect(mut self, redirect: u16) -> Self {
        self.redirect = redirect;
        self
    }
}

/// The operations exposed to a transport layer.
///
/// Both [`read`](Shortener::read) and [`visit`](Shortener::visit) are part of
/// the contract; which of them a transport publishes is its own decision.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Validates and persists a new link.
    async fn create(&self, params: ShortenParams) -> Result<Link>;

    /// Looks a link up without recording a visit.
    async fn read(&self, public_id: &str) -> Result<Link>;

    /// Looks a link up and records a visit at the current time.
    async fn visit(&self, public_id: &str) -> Result<Link>;

    /// Counts a link's visits per bucket of `width`.
    async fn visits_per(
        &self,
        public_id: &str,
        width: BucketWidth,
    ) -> Result<BTreeMap<String, usize>>;
}
