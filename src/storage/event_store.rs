//! The authoritative log of consumption events.
//!
//! The [`EventStore`] owns the events and the active profile for a session.
//! Every effective mutation is written straight through to a
//! [`KeyValueStore`]. Write failures are logged and the in-memory state is
//! kept; this is a personal log, not a system of record.

use std::{borrow::Cow, io};

use chrono::{DateTime, Local, TimeZone, Utc};
use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    domain::{ConsumptionEvent, DEFAULT_WEEKLY_GOAL, DrinkKind, EventPatch, UserProfile},
    storage::KeyValueStore,
};

/// Storage key of the consumption log.
pub const EVENTS_KEY: &str = "modera.events";

/// Storage key of the active profile.
pub const PROFILE_KEY: &str = "modera.profile";

/// Owns the consumption log and the active profile.
#[derive(Debug)]
pub struct EventStore<S, Tz: TimeZone = Local> {
    backend: S,
    tz: Tz,
    events: Vec<ConsumptionEvent>,
    profile: Option<UserProfile>,
    version: u64,
}

/// A read-only view of the store at a point in time.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    events: &'a [ConsumptionEvent],
    profile: Option<&'a UserProfile>,
    version: u64,
}

impl<'a> Snapshot<'a> {
    /// Build a snapshot over borrowed data.
    ///
    /// Useful for computing statistics over events that don't live in a
    /// store.
    #[must_use]
    pub const fn new(events: &'a [ConsumptionEvent], profile: Option<&'a UserProfile>) -> Self {
        Self {
            events,
            profile,
            version: 0,
        }
    }

    /// Events in insertion order.
    #[must_use]
    pub const fn events(&self) -> &'a [ConsumptionEvent] {
        self.events
    }

    /// The active profile, if logged in.
    #[must_use]
    pub const fn profile(&self) -> Option<&'a UserProfile> {
        self.profile
    }

    /// Monotonic counter of effective mutations to the store.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The profile's weekly goal, or the default when logged out.
    #[must_use]
    pub fn weekly_goal(&self) -> f64 {
        self.profile
            .map_or(DEFAULT_WEEKLY_GOAL, UserProfile::weekly_goal_units)
    }
}

/// Failure to read persisted state at start-up.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The storage medium could not be read.
    #[error("failed to read '{key}': {source}")]
    Io {
        /// The record being read.
        key: &'static str,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The record exists but is not valid.
    #[error("malformed record '{key}': {source}")]
    Malformed {
        /// The record being read.
        key: &'static str,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl<S: KeyValueStore> EventStore<S, Local> {
    /// Open a store using the system's local time zone.
    ///
    /// # Errors
    ///
    /// See [`EventStore::open_with_time_zone`].
    pub fn open(backend: S) -> Result<Self, LoadError> {
        Self::open_with_time_zone(backend, Local)
    }
}

impl<S: KeyValueStore, Tz: TimeZone> EventStore<S, Tz> {
    /// Load persisted state from `backend`.
    ///
    /// Missing records mean an empty log and no active profile. Events whose
    /// date key doesn't match their instant in `tz` are repaired.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be read or is malformed.
    pub fn open_with_time_zone(backend: S, tz: Tz) -> Result<Self, LoadError> {
        let mut events = match read_record::<EventLog>(&backend, EVENTS_KEY)? {
            Some(EventLog::V1 { events }) => events.into_owned(),
            None => Vec::new(),
        };
        let profile = read_record::<ProfileRecord>(&backend, PROFILE_KEY)?
            .map(|ProfileRecord::V1 { profile }| profile.into_owned());

        let mut repaired = 0usize;
        for event in &mut events {
            if event.rederive_date_key(&tz) {
                repaired += 1;
            }
        }

        tracing::debug!(
            events = events.len(),
            logged_in = profile.is_some(),
            "Loaded event store"
        );

        let mut store = Self {
            backend,
            tz,
            events,
            profile,
            version: 0,
        };

        if repaired > 0 {
            tracing::warn!("Recomputed {repaired} stale date keys");
            store.persist_events();
        }

        Ok(store)
    }

    /// Append a new event.
    ///
    /// The event is timestamped now unless `occurred_at` is given. Negative or
    /// non-finite units are stored as zero.
    #[instrument(level = "debug", skip(self))]
    pub fn add_event(
        &mut self,
        kind: DrinkKind,
        units: f64,
        occurred_at: Option<DateTime<Utc>>,
    ) -> ConsumptionEvent {
        let event = ConsumptionEvent::new(
            kind,
            units,
            occurred_at.unwrap_or_else(Utc::now),
            &self.tz,
        );
        self.events.push(event.clone());
        self.touch();
        self.persist_events();
        event
    }

    /// Remove the event with the given id.
    ///
    /// Unknown ids are silently ignored. Returns the removed event.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_event(&mut self, id: Uuid) -> Option<ConsumptionEvent> {
        let Some(index) = self.events.iter().position(|event| event.id() == id) else {
            tracing::debug!("No event with id {id}");
            return None;
        };
        let removed = self.events.remove(index);
        self.touch();
        self.persist_events();
        Some(removed)
    }

    /// Merge `patch` into the event with the given id.
    ///
    /// Unknown ids are silently ignored. Returns the updated event.
    #[instrument(level = "debug", skip(self))]
    pub fn edit_event(&mut self, id: Uuid, patch: &EventPatch) -> Option<ConsumptionEvent> {
        let Some(event) = self.events.iter_mut().find(|event| event.id() == id) else {
            tracing::debug!("No event with id {id}");
            return None;
        };
        let changed = event.apply(patch, &self.tz);
        let updated = event.clone();
        if changed {
            self.touch();
            self.persist_events();
        }
        Some(updated)
    }

    /// Replace the active profile's weekly goal.
    ///
    /// Returns `false`, changing nothing, when no one is logged in.
    #[instrument(level = "debug", skip(self))]
    pub fn set_weekly_goal(&mut self, units: f64) -> bool {
        let Some(profile) = self.profile.as_mut() else {
            tracing::debug!("Ignoring goal update without an active profile");
            return false;
        };
        profile.set_weekly_goal(units);
        self.touch();
        self.persist_profile();
        true
    }

    /// Start a session, replacing any active profile.
    #[instrument(level = "debug", skip(self))]
    pub fn login(
        &mut self,
        display_name: NonEmptyString,
        email: String,
        weekly_goal_units: f64,
    ) -> UserProfile {
        let profile = UserProfile::new(display_name, email, weekly_goal_units);
        self.profile = Some(profile.clone());
        self.touch();
        self.persist_profile();
        profile
    }

    /// End the session. The event log is kept.
    #[instrument(level = "debug", skip(self))]
    pub fn logout(&mut self) -> Option<UserProfile> {
        let profile = self.profile.take()?;
        self.touch();
        if let Err(e) = self.backend.remove(PROFILE_KEY) {
            tracing::warn!("Failed to remove profile record: {e}");
        }
        Some(profile)
    }

    /// A read-only view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            events: &self.events,
            profile: self.profile.as_ref(),
            version: self.version,
        }
    }

    /// Look up a single event.
    #[must_use]
    pub fn event(&self, id: Uuid) -> Option<&ConsumptionEvent> {
        self.events.iter().find(|event| event.id() == id)
    }

    /// The active profile, if any.
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// The time zone used to derive date keys.
    #[must_use]
    pub const fn time_zone(&self) -> &Tz {
        &self.tz
    }

    /// Tear down the store, returning the storage backend.
    #[must_use]
    pub fn into_backend(self) -> S {
        self.backend
    }

    const fn touch(&mut self) {
        self.version += 1;
    }

    fn persist_events(&mut self) {
        let serialized = serde_json::to_string(&EventLog::V1 {
            events: Cow::Borrowed(&self.events),
        });
        self.write_serialized(EVENTS_KEY, serialized);
    }

    fn persist_profile(&mut self) {
        let Some(profile) = &self.profile else {
            return;
        };
        let serialized = serde_json::to_string(&ProfileRecord::V1 {
            profile: Cow::Borrowed(profile),
        });
        self.write_serialized(PROFILE_KEY, serialized);
    }

    fn write_serialized(&mut self, key: &str, serialized: serde_json::Result<String>) {
        let result = serialized
            .map_err(io::Error::from)
            .and_then(|value| self.backend.set(key, &value));
        if let Err(e) = result {
            tracing::warn!("Failed to persist '{key}', keeping in-memory state: {e}");
        }
    }
}

fn read_record<T>(backend: &impl KeyValueStore, key: &'static str) -> Result<Option<T>, LoadError>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(raw) = backend
        .get(key)
        .map_err(|source| LoadError::Io { key, source })?
    else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| LoadError::Malformed { key, source })
}

/// The serialized versions of the event log.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum EventLog<'a> {
    #[serde(rename = "1")]
    V1 { events: Cow<'a, [ConsumptionEvent]> },
}

/// The serialized versions of the profile record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum ProfileRecord<'a> {
    #[serde(rename = "1")]
    V1 { profile: Cow<'a, UserProfile> },
}
