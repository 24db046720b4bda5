//! Personal alcohol consumption tracking
//!
//! Drinks are logged to a local event store. Statistics are derived on demand
//! and compared against a weekly goal.

pub mod domain;
pub use domain::{
    Config, ConsumptionEvent, DrinkKind, EventPatch, PromotionOffer, UserProfile,
};

/// Durable storage of the consumption log and the active profile.
pub mod storage;
pub use storage::{EventStore, FileStore, Snapshot};

pub mod stats;
pub use stats::{StatsEngine, StatsReport};

pub mod history;
pub use history::HistoryQuery;

pub mod assistant;
