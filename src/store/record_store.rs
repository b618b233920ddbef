//! The keyed record store backing the event cache.
//!
//! `FileRecordStore` keeps the whole collection in one JSON database file
//! under the cache directory, keyed by record id, with a schema version
//! written into the file. Writes replace the file atomically via a temp
//! file and rename so a crash mid-write never leaves a torn collection.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::EventRecord;

use super::StoreError;

/// Database file name; the suffix is the schema version.
const DB_FILE: &str = "events-v1.json";

const SCHEMA_VERSION: u32 = 1;

/// Capability interface for the local structured store: a single collection
/// of event records keyed by `id`.
///
/// `get_all` makes no ordering guarantee; ordering is the caller's concern.
/// Read faults surface as errors here and are absorbed by the cache facade;
/// write faults are always loud.
pub trait RecordStore {
    /// Open the store, creating the schema on first use. Idempotent;
    /// concurrent callers are serialized so schema creation runs at most
    /// once, and a failed attempt may be retried.
    fn initialize(&self) -> Result<(), StoreError>;

    fn get_all(&self) -> Result<Vec<EventRecord>, StoreError>;

    /// Atomically clear the collection and repopulate it with exactly the
    /// given records.
    fn replace_all(&self, records: &[EventRecord]) -> Result<(), StoreError>;

    fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    schema_version: u32,
    records: BTreeMap<String, EventRecord>,
}

impl Collection {
    fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records: BTreeMap::new(),
        }
    }
}

pub struct FileRecordStore {
    path: PathBuf,
    init: Mutex<bool>,
}

impl FileRecordStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(DB_FILE),
            init: Mutex::new(false),
        }
    }

    fn read_collection(&self) -> Result<Collection, StoreError> {
        let contents = fs::read_to_string(&self.path)?;
        let collection: Collection = serde_json::from_str(&contents)?;
        if collection.schema_version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: collection.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(collection)
    }

    fn write_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        // Overlapping writers must never share a temp file.
        static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

        let contents = serde_json::to_string(collection)?;
        let tmp = self.path.with_extension(format!(
            "json.tmp{}",
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn initialize(&self) -> Result<(), StoreError> {
        // Poisoning only means another initializer panicked; the flag is
        // still meaningful, so take the inner value either way.
        let mut initialized = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if *initialized {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        if self.path.exists() {
            // Surface an incompatible schema at open time, not mid-read.
            self.read_collection()?;
        } else {
            debug!(path = %self.path.display(), "creating event record store");
            self.write_collection(&Collection::empty())?;
        }
        *initialized = true;
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<EventRecord>, StoreError> {
        self.initialize()?;
        let collection = self.read_collection()?;
        Ok(collection.records.into_values().collect())
    }

    fn replace_all(&self, records: &[EventRecord]) -> Result<(), StoreError> {
        self.initialize()?;
        let mut collection = Collection::empty();
        for record in records {
            // Keyed by id: a duplicate id keeps the later record.
            collection
                .records
                .insert(record.id.clone(), record.clone());
        }
        self.write_collection(&collection)
    }

    fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.initialize()?;
        let mut collection = self.read_collection()?;
        if collection.records.remove(id).is_some() {
            self.write_collection(&collection)?;
        }
        Ok(())
    }
}

/// In-memory record store for tests, with switchable fault injection on the
/// read and write paths.
#[cfg(test)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, EventRecord>>,
    pub fail_reads: std::sync::atomic::AtomicBool,
    pub fail_writes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            fail_reads: std::sync::atomic::AtomicBool::new(false),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
impl MemoryRecordStore {
    fn injected_fault(flag: &std::sync::atomic::AtomicBool) -> Result<(), StoreError> {
        if flag.load(std::sync::atomic::Ordering::SeqCst) {
            Err(StoreError::Io(std::io::Error::other("injected fault")))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
impl RecordStore for MemoryRecordStore {
    fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<EventRecord>, StoreError> {
        Self::injected_fault(&self.fail_reads)?;
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().cloned().collect())
    }

    fn replace_all(&self, new: &[EventRecord]) -> Result<(), StoreError> {
        Self::injected_fault(&self.fail_writes)?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.clear();
        for record in new {
            records.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        Self::injected_fault(&self.fail_writes)?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::sample_event;

    fn sorted_ids(records: &[EventRecord]) -> Vec<String> {
        let mut ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_replace_all_then_get_all_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());

        let records = vec![
            sample_event("a", "2026-01-01"),
            sample_event("b", "2026-02-01"),
            sample_event("c", "2026-03-01"),
        ];
        store.replace_all(&records).expect("replace_all");

        let loaded = store.get_all().expect("get_all");
        assert_eq!(sorted_ids(&loaded), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_all_clears_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());

        store
            .replace_all(&[sample_event("old", "2026-01-01")])
            .expect("first replace");
        store
            .replace_all(&[sample_event("new", "2026-02-01")])
            .expect("second replace");

        let loaded = store.get_all().expect("get_all");
        assert_eq!(sorted_ids(&loaded), vec!["new"]);
    }

    #[test]
    fn test_contents_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = FileRecordStore::new(dir.path());
            store
                .replace_all(&[sample_event("a", "2026-01-01")])
                .expect("replace_all");
        }
        let reopened = FileRecordStore::new(dir.path());
        let loaded = reopened.get_all().expect("get_all after reopen");
        assert_eq!(sorted_ids(&loaded), vec!["a"]);
    }

    #[test]
    fn test_delete_by_id_removes_only_that_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());
        store
            .replace_all(&[sample_event("a", "2026-01-01"), sample_event("b", "2026-02-01")])
            .expect("replace_all");

        store.delete_by_id("a").expect("delete");
        assert_eq!(sorted_ids(&store.get_all().expect("get_all")), vec!["b"]);

        // Deleting an absent id is a no-op, not an error
        store.delete_by_id("missing").expect("delete missing");
        assert_eq!(sorted_ids(&store.get_all().expect("get_all")), vec!["b"]);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());
        store.initialize().expect("first initialize");
        store.initialize().expect("second initialize");
        assert!(store.get_all().expect("get_all").is_empty());
    }

    #[test]
    fn test_initialize_rejects_unknown_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DB_FILE);
        fs::write(&path, r#"{"schema_version": 99, "records": {}}"#).expect("write");

        let store = FileRecordStore::new(dir.path());
        match store.initialize() {
            Err(StoreError::SchemaVersion { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, SCHEMA_VERSION);
            }
            other => panic!("expected schema version error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_overlapping_writers_never_tear_the_collection() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(FileRecordStore::new(dir.path()));
        store
            .replace_all(&[sample_event("seed", "2026-01-01")])
            .expect("seed write");

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..25 {
                        let id = format!("w{}-{}", w, n);
                        store
                            .replace_all(&[sample_event(&id, "2026-01-01")])
                            .expect("replace");
                        store.delete_by_id(&id).expect("delete");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("join");
        }

        // Whichever write won, the database file must still parse
        store.get_all().expect("collection stays readable");
    }

    #[test]
    fn test_duplicate_ids_keep_last_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());

        let mut first = sample_event("a", "2026-01-01");
        first.title = "First".to_string();
        let mut second = sample_event("a", "2026-01-01");
        second.title = "Second".to_string();

        store.replace_all(&[first, second]).expect("replace_all");
        let loaded = store.get_all().expect("get_all");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Second");
    }
}
