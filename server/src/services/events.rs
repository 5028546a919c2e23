use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::info;
use validator::Validate;

use crate::models::{Event, NewEvent, NewTicket, Ticket, User};
use crate::store::Store;
use crate::utils::error::AppError;

/// Categories offered by the creation form. Stored categories are free text.
pub const CATEGORY_CHOICES: [&str; 7] = [
    "Concert",
    "Workshop",
    "Sport",
    "Meetup",
    "Exhibition",
    "Festival",
    "Other",
];

pub const DEFAULT_CAPACITY: i32 = 100;
pub const DEFAULT_TICKET_NAME: &str = "Standard";

/// Organizer input for a new event and its single ticket type.
#[derive(Debug, Clone, Validate)]
pub struct EventDraft {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub category: String,
    pub date: NaiveDateTime,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub location: String,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_participants: i32,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub ticket_name: String,
    pub ticket_price: Decimal,
}

/// Largest ticket price a `NUMERIC(12,2)` column holds.
pub const MAX_TICKET_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

impl EventDraft {
    fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            location: self.location.trim().to_string(),
            ticket_name: self.ticket_name.trim().to_string(),
            ..self
        }
    }
}

fn check_price(price: Decimal) -> Result<(), AppError> {
    let reason = if price < Decimal::ZERO {
        "must not be negative"
    } else if price > MAX_TICKET_PRICE {
        "must not exceed 9999999999.99"
    } else if price.normalize().scale() > 2 {
        "must have at most 2 decimal places"
    } else {
        return Ok(());
    };
    Err(AppError::ValidationError(format!("ticket_price: {reason}")))
}

/// Creates a published event with exactly one ticket type sized to the
/// event's capacity. The caller becomes an organizer if they were not one.
pub async fn create_event(
    store: &dyn Store,
    caller: &User,
    draft: EventDraft,
) -> Result<(Event, Ticket), AppError> {
    let draft = draft.trimmed();
    draft.validate()?;
    check_price(draft.ticket_price)?;

    let new_event = NewEvent {
        title: draft.title,
        description: draft.description,
        category: draft.category,
        date: draft.date,
        location: draft.location,
        max_participants: draft.max_participants,
    };
    let new_ticket = NewTicket {
        name: draft.ticket_name,
        price: draft.ticket_price,
        quantity: draft.max_participants,
    };

    let (event, ticket) = store.create_event(caller.id, &new_event, &new_ticket).await?;

    if !caller.is_organizer {
        info!(user_id = caller.id, "User became an organizer");
    }
    info!(
        event_id = event.id,
        organizer_id = caller.id,
        category = %event.category,
        capacity = event.max_participants,
        "Event created"
    );

    Ok((event, ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_ticket_price_fits_numeric_12_2() {
        assert_eq!(MAX_TICKET_PRICE.to_string(), "9999999999.99");
    }

    #[test]
    fn test_check_price_bounds() {
        assert!(check_price(Decimal::ZERO).is_ok());
        assert!(check_price(Decimal::new(150000, 2)).is_ok());
        assert!(check_price(Decimal::new(15000000, 4)).is_ok());
        assert!(check_price(MAX_TICKET_PRICE).is_ok());

        assert!(check_price(Decimal::new(-1, 2)).is_err());
        assert!(check_price(MAX_TICKET_PRICE + Decimal::new(1, 2)).is_err());
        assert!(check_price(Decimal::MAX).is_err());
        assert!(check_price(Decimal::new(1001, 3)).is_err());
    }

    #[test]
    fn test_whitespace_only_fields_fail_validation() {
        let draft = EventDraft {
            title: "   ".to_string(),
            description: "Live music".to_string(),
            category: "  ".to_string(),
            date: NaiveDateTime::parse_from_str("2026-11-05 19:30", "%Y-%m-%d %H:%M").unwrap(),
            location: " Club ".to_string(),
            max_participants: 10,
            ticket_name: DEFAULT_TICKET_NAME.to_string(),
            ticket_price: Decimal::ZERO,
        };
        let trimmed = draft.trimmed();
        assert_eq!(trimmed.location, "Club");

        let errors = trimmed.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("category"));
        assert!(!fields.contains_key("location"));
    }
}
