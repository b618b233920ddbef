//! REST client for the hosted backend's events resource.
//!
//! JSON request/response bodies are shaped like the event record; bearer
//! token authentication; every non-2xx status becomes a typed `ApiError`.

pub mod client;
pub mod error;

pub use client::{ApiClient, EventsApi};
pub use error::ApiError;
