//! Cache facade tying the record store to the legacy flat cache.
//!
//! This is the surface the sync layer talks to. Reads degrade silently:
//! a record store fault falls back to the legacy mirror, and an unreadable
//! mirror yields an empty collection. Writes to the record store are loud;
//! the mirror write that follows is best-effort and only logged, since the
//! mirror is a side copy and never the primary write target.

use std::path::Path;

use tracing::{debug, warn};

use crate::models::EventRecord;

use super::flat_cache::{strip_embedded_media, FileFlatCache, FlatCache, LEGACY_EVENTS_KEY};
use super::record_store::{FileRecordStore, RecordStore};
use super::StoreError;

pub struct EventCache<S, F> {
    store: S,
    legacy: F,
}

impl EventCache<FileRecordStore, FileFlatCache> {
    /// Open the file-backed cache under the given directory, creating the
    /// record store schema on first use.
    pub fn open(cache_dir: &Path) -> Result<Self, StoreError> {
        let cache = Self::new(
            FileRecordStore::new(cache_dir),
            FileFlatCache::new(cache_dir),
        );
        cache.store.initialize()?;
        Ok(cache)
    }
}

impl<S: RecordStore, F: FlatCache> EventCache<S, F> {
    pub fn new(store: S, legacy: F) -> Self {
        Self { store, legacy }
    }

    /// Every cached record, in no guaranteed order. Never fails: a record
    /// store fault falls back to the legacy mirror, and failing that the
    /// collection is empty.
    pub fn get_all(&self) -> Vec<EventRecord> {
        match self.store.get_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "record store read failed, serving legacy cache");
                self.legacy_events()
            }
        }
    }

    /// Replace the cached collection with exactly the given records, then
    /// mirror a media-stripped copy into the legacy cache. The store write
    /// failing is an error; the mirror failing is only logged.
    pub fn replace_all(&self, records: &[EventRecord]) -> Result<(), StoreError> {
        self.store.replace_all(records)?;
        self.mirror_to_legacy(records);
        Ok(())
    }

    /// Remove one record from the store and rewrite the legacy mirror from
    /// what remains.
    pub fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete_by_id(id)?;
        match self.store.get_all() {
            Ok(remaining) => self.mirror_to_legacy(&remaining),
            Err(e) => warn!(error = %e, "skipping legacy mirror rewrite after delete"),
        }
        Ok(())
    }

    /// Purge both local stores. The remote system is untouched; the next
    /// fetch repopulates from the server.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.replace_all(&[])?;
        self.legacy.remove(LEGACY_EVENTS_KEY)?;
        Ok(())
    }

    /// Raw legacy payload, if any. Used by the migration routine.
    pub(crate) fn legacy_raw(&self) -> Option<String> {
        self.legacy.get(LEGACY_EVENTS_KEY)
    }

    fn legacy_events(&self) -> Vec<EventRecord> {
        let Some(raw) = self.legacy.get(LEGACY_EVENTS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "legacy cache contents unreadable");
                Vec::new()
            }
        }
    }

    fn mirror_to_legacy(&self, records: &[EventRecord]) {
        let stripped = strip_embedded_media(records);
        match serde_json::to_string(&stripped) {
            Ok(json) => {
                if let Err(e) = self.legacy.set(LEGACY_EVENTS_KEY, &json) {
                    warn!(error = %e, "legacy cache mirror write failed");
                } else {
                    debug!(count = stripped.len(), "mirrored events to legacy cache");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize legacy mirror"),
        }
    }
}
