use chrono::{DateTime, Utc};
use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The goal used when no profile is active.
pub const DEFAULT_WEEKLY_GOAL: f64 = 10.0;

/// The profile of the active session.
///
/// There is at most one profile per data directory. It is created at login
/// and removed at logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    id: Uuid,
    display_name: NonEmptyString,
    email: String,
    weekly_goal_units: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    registered_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new profile registered now.
    #[must_use]
    pub fn new(display_name: NonEmptyString, email: String, weekly_goal_units: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            email,
            weekly_goal_units: sanitize_goal(weekly_goal_units),
            registered_at: Utc::now(),
        }
    }

    /// The stable identifier of this profile.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Name shown in greetings.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Contact address. Not verified.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The weekly unit ceiling. Never negative.
    #[must_use]
    pub const fn weekly_goal_units(&self) -> f64 {
        self.weekly_goal_units
    }

    /// When the profile was created.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Replace the weekly goal.
    ///
    /// Negative and non-finite values are stored as zero.
    pub const fn set_weekly_goal(&mut self, units: f64) {
        self.weekly_goal_units = sanitize_goal(units);
    }
}

const fn sanitize_goal(units: f64) -> f64 {
    if units.is_finite() && units > 0.0 { units } else { 0.0 }
}
