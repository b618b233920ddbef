//! One-shot migration of legacy flat-cache data into the record store.

use tracing::{debug, info, warn};

use crate::models::EventRecord;

use super::events::EventCache;
use super::flat_cache::FlatCache;
use super::record_store::RecordStore;

/// Seed the record store from the legacy flat cache, once per process
/// start. Non-destructive: the legacy key is left in place as the ongoing
/// backward-compatible mirror. Best-effort by design: every failure is
/// logged and swallowed so startup is never blocked.
pub fn migrate_legacy_cache<S: RecordStore, F: FlatCache>(cache: &EventCache<S, F>) {
    let Some(raw) = cache.legacy_raw() else {
        debug!("no legacy cache present, skipping migration");
        return;
    };

    let records: Vec<EventRecord> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "legacy cache unreadable, skipping migration");
            return;
        }
    };

    if records.is_empty() {
        debug!("legacy cache empty, nothing to migrate");
        return;
    }

    match cache.replace_all(&records) {
        Ok(()) => info!(count = records.len(), "migrated legacy cache into record store"),
        Err(e) => warn!(error = %e, "legacy cache migration failed"),
    }
}
