use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-event.jpg";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: NaiveDateTime,
    pub location: String,
    pub image_url: String,
    pub max_participants: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub organizer_id: i64,
}

impl Event {
    /// Case-insensitive substring match against title or description.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Whether `viewer` may see this event. Unpublished events are only
    /// visible to their organizer.
    pub fn is_visible_to(&self, viewer: Option<i64>) -> bool {
        self.is_published || viewer == Some(self.organizer_id)
    }
}

/// Fields for a new event row. Events are published on creation.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: NaiveDateTime,
    pub location: String,
    pub max_participants: i32,
}
