//! Reconciliation between the remote events API and the local cache.
//!
//! The remote API is authoritative whenever it is reachable; the local
//! cache is a stand-in that keeps the site readable and editable through
//! backend outages. Reads never fail past this layer. Mutations try the
//! remote first and then always land locally: mirroring the server result
//! when the call succeeded, or synthesizing an equivalent local mutation
//! when it did not, so the caller's view stays eventually consistent with
//! server intent. Locally synthesized data survives only until the next
//! successful fetch, which silently replaces it with the server's truth.

use chrono::Utc;
use tracing::{debug, warn};

use crate::api::EventsApi;
use crate::models::{EventPatch, EventRecord, NewEvent};
use crate::store::{ChangeNotifier, EventCache, FlatCache, RecordStore, StoreError};

pub struct EventSync<A, S, F> {
    api: A,
    cache: EventCache<S, F>,
    notifier: ChangeNotifier,
}

impl<A: EventsApi, S: RecordStore, F: FlatCache> EventSync<A, S, F> {
    pub fn new(api: A, cache: EventCache<S, F>) -> Self {
        Self {
            api,
            cache,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Signal fired after every successful local mutation.
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Fetch the full collection from the remote API and write it through
    /// to the local cache. On any remote failure, serve whatever the local
    /// cache holds instead; the caller cannot tell fresh from cached here.
    pub async fn fetch_and_sync(&self) -> Vec<EventRecord> {
        match self.api.list_events().await {
            Ok(remote) => {
                if let Err(e) = self.cache.replace_all(&remote) {
                    warn!(error = %e, "failed to write remote events through to cache");
                }
                remote
            }
            Err(e) => {
                warn!(error = %e, "remote fetch failed, serving cached events");
                self.cache.get_all()
            }
        }
    }

    /// Create an event. Prefers the remote API; on failure a record is
    /// synthesized locally (generated id, both timestamps set to now) so
    /// creation always succeeds from the caller's point of view, possibly
    /// without server durability. The cache write failing is the one loud
    /// error, since pretending a write happened would corrupt downstream
    /// state.
    pub async fn create(&self, draft: NewEvent) -> Result<EventRecord, StoreError> {
        let record = match self.api.create_event(&draft).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "remote create failed, synthesizing local record");
                draft.into_local_record(Utc::now())
            }
        };

        let mut snapshot = self.cache.get_all();
        snapshot.retain(|r| r.id != record.id);
        snapshot.push(record.clone());
        self.cache.replace_all(&snapshot)?;
        self.notifier.notify();
        Ok(record)
    }

    /// Update an event by id. On remote success the server record replaces
    /// the cached one; on remote failure the patch is merged into the
    /// cached copy with a refreshed `updated_at`. Returns `None` when the
    /// remote is down and no cached record carries the id.
    pub async fn update(
        &self,
        id: &str,
        patch: EventPatch,
    ) -> Result<Option<EventRecord>, StoreError> {
        match self.api.update_event(id, &patch).await {
            Ok(remote) => {
                let mut snapshot = self.cache.get_all();
                match snapshot.iter_mut().find(|r| r.id == id) {
                    Some(cached) => *cached = remote.clone(),
                    // Remote knew an event the cache did not; adopt it
                    None => snapshot.push(remote.clone()),
                }
                self.cache.replace_all(&snapshot)?;
                self.notifier.notify();
                Ok(Some(remote))
            }
            Err(e) => {
                warn!(id, error = %e, "remote update failed, merging into cached copy");
                let mut snapshot = self.cache.get_all();
                let Some(cached) = snapshot.iter_mut().find(|r| r.id == id) else {
                    debug!(id, "no cached record to merge update into");
                    return Ok(None);
                };
                cached.apply(&patch);
                let merged = cached.clone();
                self.cache.replace_all(&snapshot)?;
                self.notifier.notify();
                Ok(Some(merged))
            }
        }
    }

    /// Delete an event by id. The local removal happens regardless of the
    /// remote outcome: the design trades a possible silent local/remote
    /// divergence for UI responsiveness in the common case.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if let Err(e) = self.api.delete_event(id).await {
            warn!(id, error = %e, "remote delete failed, removing locally anyway");
        }
        self.cache.delete_by_id(id)?;
        self.notifier.notify();
        Ok(())
    }

    /// Purge both local stores without touching the remote system. Manual
    /// "force refresh from server": the next fetch repopulates everything.
    pub fn clear_local_cache(&self) -> Result<(), StoreError> {
        self.cache.clear()
    }
}
