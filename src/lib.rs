//! parishcache - offline-tolerant event storage for a parish website.
//!
//! The hosted backend is the source of truth for event content; this crate
//! keeps a durable local cache in front of it so the site stays readable
//! and editable while the backend is unreachable. The pieces:
//!
//! - [`store`]: the keyed record store, the legacy flat-cache mirror, the
//!   startup migration between them, and the change notifier
//! - [`api`]: the HTTP client for the remote events resource
//! - [`sync`]: the reconciliation layer tying remote and local together
//! - [`images`]: pure delivery-URL transforms for stored images
//! - [`config`]: file- and environment-driven configuration
//!
//! Typical wiring:
//!
//! ```no_run
//! use parishcache::{ApiClient, Config, EventCache, EventSync};
//! use parishcache::store::migrate_legacy_cache;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let cache = EventCache::open(&config.cache_dir()?)?;
//! migrate_legacy_cache(&cache);
//!
//! let mut api = ApiClient::new(config.api_base_url.as_deref().unwrap_or_default())?;
//! if let Some(token) = config.api_token.clone() {
//!     api.set_token(token);
//! }
//!
//! let sync = EventSync::new(api, cache);
//! let events = sync.fetch_and_sync().await;
//! # let _ = events;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod images;
pub mod models;
pub mod store;
pub mod sync;

pub use api::{ApiClient, ApiError, EventsApi};
pub use config::Config;
pub use images::{
    responsive_candidates, transform_url, variants, ImageFormat, ImageVariants,
    ResizeMode, ResponsiveCandidate, TransformOptions,
};
pub use models::{EventPatch, EventRecord, MediaItem, MediaKind, NewEvent};
pub use store::{ChangeNotifier, EventCache, FlatCache, RecordStore, StoreError};
pub use sync::EventSync;

/// Tracing setup for tests: honors `RUST_LOG`, defaults to warn.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
