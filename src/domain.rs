//! Domain models for consumption tracking.
//!
//! This module contains the core domain types including drink kinds,
//! consumption events, the user profile, promotions, and configuration.

/// Calendar windows and date projection.
pub mod calendar;

mod config;
pub use config::{Config, SavingsWindow};

mod drink;
pub use drink::{DrinkKind, ParseKindError};

/// Consumption events and partial updates.
pub mod event;
pub use event::{ConsumptionEvent, EventPatch};

/// The active user profile.
pub mod profile;
pub use profile::{DEFAULT_WEEKLY_GOAL, UserProfile};

/// Promotional offers and their ranking.
pub mod promotion;
pub use promotion::{PromotionOffer, PromotionTarget, rank_promotions, seed_promotions};
