//! Data models for parish website content.
//!
//! The event record is the central entity: it carries the public-facing
//! fields (title, date, location), the cover image reference, and the
//! ordered media gallery. Partial updates travel as `EventPatch`, new
//! events as `NewEvent`.

pub mod event;

pub use event::{is_data_url, EventPatch, EventRecord, MediaItem, MediaKind, NewEvent};
