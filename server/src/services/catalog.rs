use serde::{Deserialize, Serialize};

use crate::models::{Event, Ticket, User};
use crate::store::Store;
use crate::utils::error::AppError;

/// Category value that means "no category filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl CatalogQuery {
    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub events: Vec<Event>,
    /// Every category in use, published or not, for the filter menu.
    pub categories: Vec<String>,
    pub selected_category: Option<String>,
    pub search: Option<String>,
}

/// Published events narrowed by category and free text, soonest first.
pub async fn browse(store: &dyn Store, query: &CatalogQuery) -> Result<Catalog, AppError> {
    let category = query.category_filter();
    let mut events = store.list_published_events(category).await?;

    if let Some(needle) = query.search_needle() {
        events.retain(|event| event.matches_search(&needle));
    }

    let categories = store.list_categories().await?;

    tracing::debug!(
        category = ?category,
        results = events.len(),
        "Catalog query"
    );

    Ok(Catalog {
        events,
        categories,
        selected_category: query.category.clone(),
        search: query.search.clone(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub event: Event,
    pub tickets: Vec<Ticket>,
    pub organizer_name: String,
    pub available_tickets: i64,
}

/// One event with its ticket types.
///
/// A hidden event and a missing one produce the same `NotFound`, so callers
/// cannot probe for unpublished events.
pub async fn event_detail(
    store: &dyn Store,
    viewer: Option<&User>,
    event_id: i64,
) -> Result<EventDetail, AppError> {
    let not_found = || AppError::NotFound("Event not found or unavailable".to_string());

    let event = store.get_event(event_id).await?.ok_or_else(not_found)?;
    if !event.is_visible_to(viewer.map(|user| user.id)) {
        return Err(not_found());
    }

    let tickets = store.list_tickets(event.id).await?;
    let organizer_name = store
        .get_user(event.organizer_id)
        .await?
        .map(|user| user.display_name())
        .unwrap_or_default();
    let available_tickets = super::api::available_tickets(&tickets);

    Ok(EventDetail {
        event,
        tickets,
        organizer_name,
        available_tickets,
    })
}
