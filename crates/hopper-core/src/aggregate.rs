use crate::error::UnsupportedBucketWidth;
use jiff::Timestamp;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Width of the time buckets visits are counted in.
///
/// Only these four widths exist; arbitrary durations are rejected when
/// converting with [`TryFrom<Duration>`] or [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BucketWidth {
    Second,
    Minute,
    #[default]
    Hour,
    Day,
}

impl BucketWidth {
    pub const fn as_duration(self) -> Duration {
        match self {
            BucketWidth::Second => Duration::from_secs(1),
            BucketWidth::Minute => Duration::from_secs(60),
            BucketWidth::Hour => Duration::from_secs(60 * 60),
            BucketWidth::Day => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Truncates `at` to the start of its bucket, rendered in UTC.
    pub fn bucket_key(self, at: Timestamp) -> String {
        at.strftime(self.format()).to_string()
    }

    fn format(self) -> &'static str {
        match self {
            BucketWidth::Second => "%Y-%m-%dT%H:%M:%S",
            BucketWidth::Minute => "%Y-%m-%dT%H:%M",
            BucketWidth::Hour => "%Y-%m-%dT%H",
            BucketWidth::Day => "%Y-%m-%d",
        }
    }

    fn label(self) -> &'static str {
        match self {
            BucketWidth::Second => "1s",
            BucketWidth::Minute => "1m",
            BucketWidth::Hour => "1h",
            BucketWidth::Day => "1d",
        }
    }
}

impl Display for BucketWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BucketWidth {
    type Err = UnsupportedBucketWidth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1s" => Ok(BucketWidth::Second),
            "1m" => Ok(BucketWidth::Minute),
            "1h" => Ok(BucketWidth::Hour),
            "1d" => Ok(BucketWidth::Day),
            other => Err(UnsupportedBucketWidth(other.to_string())),
        }
    }
}

impl TryFrom<Duration> for BucketWidth {
    type Error = UnsupportedBucketWidth;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        [
            BucketWidth::Second,
            BucketWidth::Minute,
            BucketWidth::Hour,
            BucketWidth::Day,
        ]
        .into_iter()
        .find(|width| width.as_duration() == duration)
        .ok_or_else(|| UnsupportedBucketWidth(format!("{duration:?}")))
    }
}

/// Counts `visits` per bucket of `width`.
pub fn visits_per(visits: &[Timestamp], width: BucketWidth) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for visit in visits {
        *counts.entry(width.bucket_key(*visit)).or_insert(0) += 1;
    }
    counts
}
