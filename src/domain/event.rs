use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DrinkKind, calendar};

/// A single logged drink.
///
/// The calendar date (`date_key`) is stored alongside the instant for fast
/// grouping. It is always the projection of `occurred_at` onto the store's
/// time zone; the two are never changed independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEvent {
    id: Uuid,
    kind: DrinkKind,
    units: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    occurred_at: DateTime<Utc>,
    date_key: NaiveDate,
}

impl ConsumptionEvent {
    /// Construct a new event with a freshly generated id.
    ///
    /// The instant is truncated to millisecond precision so that it survives
    /// a round trip through storage unchanged. Negative or non-finite units
    /// are stored as zero.
    #[must_use]
    pub fn new<Tz: TimeZone>(
        kind: DrinkKind,
        units: f64,
        occurred_at: DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        Self::new_with_id(Uuid::new_v4(), kind, units, occurred_at, tz)
    }

    pub(crate) fn new_with_id<Tz: TimeZone>(
        id: Uuid,
        kind: DrinkKind,
        units: f64,
        occurred_at: DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        let occurred_at = occurred_at.trunc_subsecs(3);
        Self {
            id,
            kind,
            units: sanitize_units(units),
            occurred_at,
            date_key: calendar::date_key(occurred_at, tz),
        }
    }

    /// The unique, stable identifier of this event.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// What was drunk.
    #[must_use]
    pub const fn kind(&self) -> DrinkKind {
        self.kind
    }

    /// Standard alcohol units as logged.
    #[must_use]
    pub const fn units(&self) -> f64 {
        self.units
    }

    /// Units as they contribute to sums.
    ///
    /// Non-finite values are treated as zero so that a single bad record can't
    /// poison an aggregate.
    #[must_use]
    pub const fn counted_units(&self) -> f64 {
        if self.units.is_finite() { self.units } else { 0.0 }
    }

    /// When the drink was had.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// The local calendar date of [`Self::occurred_at`].
    #[must_use]
    pub const fn date_key(&self) -> NaiveDate {
        self.date_key
    }

    /// Whether the event counts towards alcohol aggregates.
    #[must_use]
    pub const fn is_alcoholic(&self) -> bool {
        self.kind.is_alcoholic()
    }

    /// Merge a partial update into this event.
    ///
    /// Units are sanitized as in [`Self::new`]. Returns `true` if any field
    /// changed.
    pub fn apply<Tz: TimeZone>(&mut self, patch: &EventPatch, tz: &Tz) -> bool {
        let before = self.clone();

        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(units) = patch.units {
            self.units = sanitize_units(units);
        }
        if let Some(occurred_at) = patch.occurred_at {
            self.occurred_at = occurred_at.trunc_subsecs(3);
            self.date_key = calendar::date_key(self.occurred_at, tz);
        }

        *self != before
    }

    /// Recompute the date key for the given time zone.
    ///
    /// Returns `true` if the stored key was stale.
    pub(crate) fn rederive_date_key<Tz: TimeZone>(&mut self, tz: &Tz) -> bool {
        let expected = calendar::date_key(self.occurred_at, tz);
        if expected == self.date_key {
            false
        } else {
            self.date_key = expected;
            true
        }
    }
}

/// JSON has no encoding for NaN or infinity.
const fn sanitize_units(units: f64) -> f64 {
    if units.is_finite() && units > 0.0 { units } else { 0.0 }
}

/// A partial update to a [`ConsumptionEvent`].
///
/// Fields left as `None` are kept as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    /// Replacement drink kind.
    pub kind: Option<DrinkKind>,
    /// Replacement units.
    pub units: Option<f64>,
    /// Replacement instant. The date key follows it.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl EventPatch {
    /// Whether the patch would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kind.is_none() && self.units.is_none() && self.occurred_at.is_none()
    }
}
