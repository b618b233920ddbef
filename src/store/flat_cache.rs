//! Legacy flat key-value cache.
//!
//! Before the keyed record store existed, the site kept its events as one
//! JSON array under a single string key. That store lives on as a
//! backward-compatible mirror and as the emergency read path when the
//! record store is unavailable. It never holds embedded-encoded media: the
//! cover image is dropped and inlined gallery items are filtered on every
//! mirror write, keeping the fallback copy lightweight.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{is_data_url, EventRecord};

use super::StoreError;

/// The one key the legacy cache has ever used for event data.
pub const LEGACY_EVENTS_KEY: &str = "church_events";

/// Capability interface for a simple string-keyed persistent store.
///
/// Reads are best-effort: a missing or unreadable key is `None`. Writes
/// report failure so the mirroring layer can log it.
pub trait FlatCache {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// File-backed flat cache: one file per key under a `kv/` subdirectory of
/// the cache directory.
pub struct FileFlatCache {
    dir: PathBuf,
}

impl FileFlatCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join("kv"),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl FlatCache for FileFlatCache {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                debug!(key, error = %e, "flat cache read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Produce the lightweight copy of the collection the legacy cache holds:
/// embedded-encoded cover images are dropped and embedded-encoded gallery
/// items are filtered out entirely.
pub(crate) fn strip_embedded_media(records: &[EventRecord]) -> Vec<EventRecord> {
    records
        .iter()
        .map(|record| {
            let mut stripped = record.clone();
            if stripped.image.as_deref().is_some_and(is_data_url) {
                stripped.image = None;
            }
            stripped.media.retain(|item| !is_data_url(&item.url));
            stripped
        })
        .collect()
}

/// In-memory flat cache for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryFlatCache {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl FlatCache for MemoryFlatCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
