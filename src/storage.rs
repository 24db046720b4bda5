/// Key-value persistence backends.
pub mod backend;
/// The consumption log and active profile.
pub mod event_store;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use event_store::{EVENTS_KEY, EventStore, LoadError, PROFILE_KEY, Snapshot};
