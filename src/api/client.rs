//! HTTP client for the hosted events API.
//!
//! The remote API is a plain JSON CRUD surface over an events resource,
//! bearer-token-authenticated. Any non-2xx response is mapped into a typed
//! `ApiError`; the sync layer treats every variant as "remote unavailable"
//! and falls back to the local cache.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::models::{EventPatch, EventRecord, NewEvent};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow serverless cold starts while failing fast enough
/// for the cache fallback to feel responsive.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capability seam over the remote events resource. The sync layer is
/// written against this trait so it can run against an in-memory fake.
#[async_trait]
pub trait EventsApi: Send + Sync {
    async fn list_events(&self) -> Result<Vec<EventRecord>, ApiError>;
    async fn create_event(&self, draft: &NewEvent) -> Result<EventRecord, ApiError>;
    async fn update_event(&self, id: &str, patch: &EventPatch) -> Result<EventRecord, ApiError>;
    async fn delete_event(&self, id: &str) -> Result<(), ApiError>;
}

/// API client for the hosted backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    fn event_url(&self, id: &str) -> String {
        format!("{}/events/{}", self.base_url, id)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Parse the events listing: a bare array, or an object wrapping the
    /// array under `events` or `data`. An object carrying neither key is an
    /// invalid response, not an empty collection - treating it as empty
    /// would flush the local cache on the next write-through.
    fn parse_events_payload(text: &str) -> Result<Vec<EventRecord>, ApiError> {
        if let Ok(events) = serde_json::from_str::<Vec<EventRecord>>(text) {
            return Ok(events);
        }

        #[derive(Deserialize)]
        struct EventsWrapper {
            events: Option<Vec<EventRecord>>,
            data: Option<Vec<EventRecord>>,
        }

        match serde_json::from_str::<EventsWrapper>(text) {
            Ok(wrapper) => wrapper.events.or(wrapper.data).ok_or_else(|| {
                ApiError::InvalidResponse(
                    "events payload has neither `events` nor `data`".to_string(),
                )
            }),
            Err(e) => Err(ApiError::InvalidResponse(format!(
                "unparseable events payload: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl EventsApi for ApiClient {
    async fn list_events(&self) -> Result<Vec<EventRecord>, ApiError> {
        let url = self.events_url();
        let response = self
            .authed(self.client.get(&url))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        debug!("Events response received");
        Self::parse_events_payload(&text)
    }

    async fn create_event(&self, draft: &NewEvent) -> Result<EventRecord, ApiError> {
        let url = self.events_url();
        let response = self
            .authed(self.client.post(&url))
            .json(draft)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        debug!("Event created remotely");
        Ok(response.json().await?)
    }

    async fn update_event(&self, id: &str, patch: &EventPatch) -> Result<EventRecord, ApiError> {
        let url = self.event_url(id);
        let response = self
            .authed(self.client.put(&url))
            .json(patch)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        debug!(id, "Event updated remotely");
        Ok(response.json().await?)
    }

    async fn delete_event(&self, id: &str) -> Result<(), ApiError> {
        let url = self.event_url(id);
        let response = self.authed(self.client.delete(&url)).send().await?;
        Self::check_response(response).await?;
        debug!(id, "Event deleted remotely");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_built_under_events_resource() {
        let client = ApiClient::new("https://api.example.com/v1/").expect("client");
        assert_eq!(client.events_url(), "https://api.example.com/v1/events");
        assert_eq!(
            client.event_url("abc-123"),
            "https://api.example.com/v1/events/abc-123"
        );
    }

    #[test]
    fn test_parse_events_payload_accepts_array_and_wrappers() {
        let record = r#"{"id": "a", "title": "Bake Sale", "date": "2026-05-01"}"#;

        let bare = format!("[{}]", record);
        assert_eq!(ApiClient::parse_events_payload(&bare).expect("array").len(), 1);

        let wrapped = format!(r#"{{"events": [{}]}}"#, record);
        assert_eq!(
            ApiClient::parse_events_payload(&wrapped).expect("events wrapper").len(),
            1
        );

        let data_wrapped = format!(r#"{{"data": [{}]}}"#, record);
        assert_eq!(
            ApiClient::parse_events_payload(&data_wrapped).expect("data wrapper").len(),
            1
        );

        // A wrapper carrying an explicitly empty list is a real empty collection
        assert!(ApiClient::parse_events_payload(r#"{"events": []}"#)
            .expect("empty events")
            .is_empty());
    }

    #[test]
    fn test_parse_events_payload_rejects_foreign_object() {
        for payload in [r#"{}"#, r#"{"error": "maintenance"}"#, r#""oops""#] {
            assert!(matches!(
                ApiClient::parse_events_payload(payload),
                Err(ApiError::InvalidResponse(_))
            ));
        }
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::new("https://api.example.com").expect("client");
        let authed = client.with_token("secret".to_string());
        assert_eq!(authed.events_url(), "https://api.example.com/events");
        assert_eq!(authed.token.as_deref(), Some("secret"));
    }
}
