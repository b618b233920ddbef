use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Returns true when the reference is an embedded-encoded image (a data URL)
/// rather than something fetched over the network.
pub fn is_data_url(reference: &str) -> bool {
    reference.starts_with("data:")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// A parish event as stored locally and exchanged with the remote API.
///
/// `id` is unique and immutable after creation: server-assigned on a
/// successful remote create, client-generated otherwise. `created_at` and
/// `updated_at` are RFC 3339 timestamps set by whichever layer performed the
/// write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ISO calendar date (YYYY-MM-DD) used for ordering and
    /// upcoming/past classification.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Cover reference: external URL or embedded-encoded data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub registration_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl EventRecord {
    /// Parse the ISO calendar date, if well formed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// Whether the event falls on or after the given day.
    /// Events with an unparseable date are treated as past.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.parsed_date().map(|d| d >= today).unwrap_or(false)
    }

    /// Chronological ordering; undated events sort last.
    pub fn cmp_by_date(&self, other: &Self) -> Ordering {
        match (self.parsed_date(), other.parsed_date()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.id.cmp(&other.id),
        }
    }

    /// Human-readable date for display, preferring the curated
    /// `display_date` when present.
    pub fn formatted_date(&self) -> String {
        if let Some(ref display) = self.display_date {
            if !display.is_empty() {
                return display.clone();
            }
        }
        match self.parsed_date() {
            Some(d) => d.format("%b %d, %Y").to_string(),
            None => self.date.clone(),
        }
    }

    /// Merge a partial update into this record, field by field, refreshing
    /// `updated_at`. Fields absent from the patch are left untouched.
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(ref date) = patch.date {
            self.date = date.clone();
        }
        if let Some(ref display_date) = patch.display_date {
            self.display_date = Some(display_date.clone());
        }
        if let Some(ref time) = patch.time {
            self.time = Some(time.clone());
        }
        if let Some(ref location) = patch.location {
            self.location = Some(location.clone());
        }
        if let Some(ref category) = patch.category {
            self.category = Some(category.clone());
        }
        if let Some(ref image) = patch.image {
            self.image = Some(image.clone());
        }
        if let Some(ref media) = patch.media {
            self.media = media.clone();
        }
        if let Some(registration_required) = patch.registration_required {
            self.registration_required = registration_required;
        }
        if let Some(ref registration_link) = patch.registration_link {
            self.registration_link = Some(registration_link.clone());
        }
        self.updated_at = Utc::now().to_rfc3339();
    }
}

/// Typed partial update for an event. One optional slot per mergeable
/// attribute; `id`, `created_at` and `updated_at` are never patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
}

/// Draft for a new event: everything the caller supplies, with `id` and the
/// timestamps assigned by the remote API or, on remote failure, locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub registration_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_link: Option<String>,
}

impl NewEvent {
    /// Synthesize a full record locally when the remote create failed.
    /// The generated id is a v4 UUID; both timestamps are set to now.
    pub fn into_local_record(self, now: DateTime<Utc>) -> EventRecord {
        let stamp = now.to_rfc3339();
        EventRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            description: self.description,
            date: self.date,
            display_date: self.display_date,
            time: self.time,
            location: self.location,
            category: self.category,
            image: self.image,
            media: self.media,
            registration_required: self.registration_required,
            registration_link: self.registration_link,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_event(id: &str, date: &str) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        title: format!("Event {}", id),
        description: String::new(),
        date: date.to_string(),
        display_date: None,
        time: None,
        location: None,
        category: None,
        image: None,
        media: Vec::new(),
        registration_required: false,
        registration_link: None,
        created_at: "2026-01-01T00:00:00+00:00".to_string(),
        updated_at: "2026-01-01T00:00:00+00:00".to_string(),
    }
}
