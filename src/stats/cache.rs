use chrono::{DateTime, TimeZone};

use crate::{
    stats::{StatsEngine, StatsReport},
    storage::Snapshot,
};

/// Memoizes the most recent report.
///
/// Reports are reused while the store version and the reference minute are
/// unchanged. Snapshots built with [`Snapshot::new`] all share version zero,
/// so a cache should only be fed snapshots taken from a single store.
#[derive(Debug, Default)]
pub struct StatsCache {
    engine: StatsEngine,
    entry: Option<(CacheKey, StatsReport)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    version: u64,
    minute: i64,
    offset_seconds: i32,
}

impl StatsCache {
    /// An empty cache around `engine`.
    #[must_use]
    pub const fn new(engine: StatsEngine) -> Self {
        Self {
            engine,
            entry: None,
        }
    }

    /// Return the cached report, recomputing it if stale.
    pub fn report<Tz: TimeZone>(
        &mut self,
        snapshot: &Snapshot<'_>,
        now: &DateTime<Tz>,
    ) -> &StatsReport {
        let key = CacheKey {
            version: snapshot.version(),
            minute: now.timestamp().div_euclid(60),
            offset_seconds: now.fixed_offset().offset().local_minus_utc(),
        };

        if self
            .entry
            .as_ref()
            .is_none_or(|(cached, _)| *cached != key)
        {
            self.entry = None;
        }

        let engine = self.engine;
        let (_, report) = self.entry.get_or_insert_with(|| {
            tracing::trace!(version = key.version, "Computing stats report");
            (key, engine.compute(snapshot, now))
        });
        report
    }

    /// Drop any cached report.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
