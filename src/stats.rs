//! Statistics over the consumption log.
//!
//! The [`StatsEngine`] turns a [`Snapshot`](crate::storage::Snapshot) and a
//! reference instant into a [`StatsReport`]: weekly, daily and monthly totals,
//! trend against the previous week, a seven day series, per-kind
//! distribution, and progress against the weekly goal.

mod cache;
mod engine;
mod report;

pub use cache::StatsCache;
pub use engine::StatsEngine;
pub use report::{DailyPoint, PeakDay, StatsReport};
