use async_trait::async_trait;
use hopper_core::{
    BucketWidth, Clock, Link, LinkStore, NewLink, RedirectCode, ShortenParams, Shortener,
    ShortenerError, SystemClock,
};
use jiff::Timestamp;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace};
use url::{SyntaxViolation, Url};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `LinkStore` and a `Clock` to handle:
/// - Defaulting an unset redirect code to 302
/// - Validating the target URL and redirect code before anything is stored
/// - Stamping visits with the clock's time
///
/// Unknown and undecodable ids both surface as [`ShortenerError::NotFound`].
#[derive(Debug, Clone)]
pub struct ShortenerService<S, C = SystemClock> {
    store: Arc<S>,
    clock: C,
}

impl<S: LinkStore> ShortenerService<S> {
    /// Creates a new `ShortenerService` that stamps visits with the system time.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: LinkStore, C: Clock> ShortenerService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store: Arc::new(store),
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates that the target is an absolute URL exactly as written.
    ///
    /// The parser repairs some inputs (surrounding whitespace, a missing `//`
    /// after the scheme); those are rejected rather than stored unrepaired.
    fn validate_url(target: &str) -> Result<(), ShortenerError> {
        if target.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let violation = Cell::new(None);
        let record = |v: SyntaxViolation| {
            if violation.get().is_none() {
                violation.set(Some(v));
            }
        };
        Url::options()
            .syntax_violation_callback(Some(&record))
            .parse(target)
            .map_err(|e| ShortenerError::InvalidUrl(format!("{target}: {e}")))?;

        if let Some(violation) = violation.get() {
            return Err(ShortenerError::InvalidUrl(format!("{target}: {violation}")));
        }

        Ok(())
    }

    /// The visit time, truncated to whole microseconds so every backend
    /// returns the same timestamps.
    fn visit_time(&self) -> Timestamp {
        let now = self.clock.now();
        Timestamp::from_microsecond(now.as_microsecond()).unwrap_or(now)
    }

    fn validate(params: ShortenParams) -> Result<NewLink, ShortenerError> {
        let redirect = match params.redirect {
            0 => RedirectCode::default(),
            code => RedirectCode::try_from(code)?,
        };
        Self::validate_url(&params.target)?;

        Ok(NewLink {
            target: params.target,
            redirect,
        })
    }
}

#[async_trait]
impl<S: LinkStore, C: Clock> Shortener for ShortenerService<S, C> {
    async fn create(&self, params: ShortenParams) -> Result<Link, ShortenerError> {
        let new_link = Self::validate(params)?;
        let link = self.store.create(new_link).await?;

        info!(
            public_id = %link.public_id(),
            redirect = %link.redirect(),
            backend = self.store.backend(),
            "created short link"
        );
        Ok(link)
    }

    async fn read(&self, public_id: &str) -> Result<Link, ShortenerError> {
        self.store
            .read(public_id)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(public_id.to_string()))
    }

    async fn visit(&self, public_id: &str) -> Result<Link, ShortenerError> {
        let at = self.visit_time();
        let link = self
            .store
            .visit(public_id, at)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(public_id.to_string()))?;

        trace!(public_id, %at, visits = link.visits().len(), "visited link");
        Ok(link)
    }

    async fn visits_per(
        &self,
        public_id: &str,
        width: BucketWidth,
    ) -> Result<BTreeMap<String, usize>, ShortenerError> {
        let link = self.read(public_id).await?;
        let counts = link.visits_per(width);

        debug!(public_id, %width, buckets = counts.len(), "aggregated visits");
        Ok(counts)
    }
}
