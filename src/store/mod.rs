//! Local storage for event records.
//!
//! Two persistent stores live side by side:
//!
//! - the record store (`RecordStore`), a keyed collection that is the
//!   primary local cache of the remote events resource;
//! - the legacy flat cache (`FlatCache`), a single string key holding a
//!   media-stripped JSON array, kept as a backward-compatible mirror and
//!   emergency read path.
//!
//! `EventCache` wires the two together with the fallback and mirroring
//! rules, `migrate_legacy_cache` seeds the record store from the flat cache
//! once per process start, and `ChangeNotifier` fans out a payload-free
//! signal after successful local mutations.

pub mod events;
pub mod flat_cache;
pub mod migrate;
pub mod notify;
pub mod record_store;

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;

pub use events::EventCache;
pub use flat_cache::{FileFlatCache, FlatCache, LEGACY_EVENTS_KEY};
pub use migrate::migrate_legacy_cache;
pub use notify::ChangeNotifier;
pub use record_store::{FileRecordStore, RecordStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store contents: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },
}

/// Production cache wired to the file-backed stores.
pub type FileEventCache = EventCache<FileRecordStore, FileFlatCache>;

static SHARED: OnceLock<Arc<FileEventCache>> = OnceLock::new();
static SHARED_INIT: Mutex<()> = Mutex::new(());

/// Process-wide cache handle, initialized lazily on first call.
///
/// Concurrent first callers are serialized onto one initialization, so the
/// schema-creation step runs at most once and every caller gets the same
/// live handle. Initialization is retryable: a failed open leaves the slot
/// empty. The first successful caller's directory wins; later directories
/// are ignored.
pub fn shared_cache(cache_dir: &Path) -> Result<Arc<FileEventCache>, StoreError> {
    if let Some(cache) = SHARED.get() {
        return Ok(Arc::clone(cache));
    }
    let _guard = SHARED_INIT.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(cache) = SHARED.get() {
        return Ok(Arc::clone(cache));
    }
    let candidate = Arc::new(EventCache::open(cache_dir)?);
    Ok(Arc::clone(SHARED.get_or_init(|| candidate)))
}
