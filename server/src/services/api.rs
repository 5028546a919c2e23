//! The public JSON projection of the catalog.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Ticket;
use crate::store::Store;
use crate::utils::error::AppError;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: Option<String>,
    pub location: String,
    pub image_url: String,
    pub organizer: String,
    pub available_tickets: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// First 100 characters followed by `...` when the text is longer.
pub fn truncate_description(description: &str) -> String {
    match description.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}

/// Unsold tickets summed over every ticket type.
pub fn available_tickets(tickets: &[Ticket]) -> i64 {
    tickets
        .iter()
        .map(|t| i64::from(t.quantity) - i64::from(t.sold_count))
        .sum()
}

/// Price of the first ticket type, or zero when there is none.
pub fn first_price(tickets: &[Ticket]) -> Decimal {
    tickets.first().map(|t| t.price).unwrap_or(Decimal::ZERO)
}

/// Every published event with its availability and headline price.
pub async fn published_summaries(store: &dyn Store) -> Result<Vec<EventSummary>, AppError> {
    let events = store.list_published_events(None).await?;
    let mut organizers: HashMap<i64, String> = HashMap::new();
    let mut summaries = Vec::with_capacity(events.len());

    for event in events {
        let tickets = store.list_tickets(event.id).await?;

        let organizer = match organizers.get(&event.organizer_id) {
            Some(name) => name.clone(),
            None => {
                let name = store
                    .get_user(event.organizer_id)
                    .await?
                    .map(|user| user.display_name())
                    .unwrap_or_default();
                organizers.insert(event.organizer_id, name.clone());
                name
            }
        };

        summaries.push(EventSummary {
            id: event.id,
            title: event.title,
            description: truncate_description(&event.description),
            category: event.category,
            date: Some(event.date.format("%Y-%m-%dT%H:%M:%S").to_string()),
            location: event.location,
            image_url: event.image_url,
            organizer,
            available_tickets: available_tickets(&tickets),
            price: first_price(&tickets),
        });
    }

    Ok(summaries)
}
