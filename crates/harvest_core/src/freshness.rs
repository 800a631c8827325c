use chrono::{DateTime, TimeDelta, Utc};

use crate::Record;

/// Whether a listing candidate needs its detail page fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never seen before.
    Missing,
    /// Stored and younger than the TTL: cache hit.
    Fresh,
    /// Stored but at least TTL old.
    Stale,
}

impl Freshness {
    pub fn needs_fetch(self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

pub fn assess_freshness(
    existing: Option<&Record>,
    now: DateTime<Utc>,
    ttl: TimeDelta,
) -> Freshness {
    match existing {
        None => Freshness::Missing,
        Some(record) if now - record.fetched_at < ttl => Freshness::Fresh,
        Some(_) => Freshness::Stale,
    }
}
