use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::models::{Booking, Reservation, Ticket, User};
use crate::store::Store;
use crate::utils::error::{AppError, Rejection};

const RESERVE_ATTEMPTS: usize = 2;

/// Books `tickets_count` tickets of the event's first ticket type for
/// `caller`.
///
/// Checks run in order: count, event exists, event published, a ticket type
/// exists, tickets remain, enough tickets remain. The sold-count increment
/// and the booking insert then happen atomically in the store, so two
/// concurrent bookings cannot both take the last tickets; a booking that
/// loses that race is retried once against fresh counts. Resubmitting the
/// same request books again.
pub async fn book_event(
    store: &dyn Store,
    caller: &User,
    event_id: i64,
    tickets_count: i32,
) -> Result<Booking, AppError> {
    if tickets_count < 1 {
        return Err(AppError::ValidationError(
            "tickets_count: must be at least 1".to_string(),
        ));
    }

    let event = store
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {event_id} not found")))?;

    if !event.is_published {
        return Err(Rejection::EventUnavailable.into());
    }

    let mut ticket = first_ticket(store, event.id).await?;

    for _ in 0..RESERVE_ATTEMPTS {
        check_availability(&ticket, tickets_count)?;

        let reservation = Reservation {
            user_id: caller.id,
            event_id: event.id,
            ticket_id: ticket.id,
            tickets_count,
            total_amount: total_amount(ticket.price, tickets_count)?,
        };

        if let Some(booking) = store.reserve_tickets(&reservation).await? {
            info!(
                booking_id = booking.id,
                user_id = caller.id,
                event_id = event.id,
                ticket_id = ticket.id,
                tickets_count,
                total_amount = %booking.total_amount,
                "Booking confirmed"
            );
            return Ok(booking);
        }

        // Another booking took the tickets between our read and the update.
        ticket = first_ticket(store, event.id).await?;
        warn!(
            event_id = event.id,
            ticket_id = ticket.id,
            tickets_count,
            remaining = ticket.remaining(),
            "Booking lost race for tickets"
        );
    }

    check_availability(&ticket, tickets_count)?;
    Err(Rejection::NotEnoughTickets {
        remaining: ticket.remaining(),
    }
    .into())
}

/// `price * tickets_count`, refusing totals that do not fit a decimal.
fn total_amount(price: Decimal, tickets_count: i32) -> Result<Decimal, AppError> {
    price
        .checked_mul(Decimal::from(tickets_count))
        .ok_or_else(|| {
            AppError::ValidationError("tickets_count: total price is too large".to_string())
        })
}

/// The ticket type bookings draw from: the first one defined for the event.
async fn first_ticket(store: &dyn Store, event_id: i64) -> Result<Ticket, AppError> {
    store
        .list_tickets(event_id)
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::Rejected(Rejection::NoTickets))
}

fn check_availability(ticket: &Ticket, tickets_count: i32) -> Result<(), Rejection> {
    if ticket.is_sold_out() {
        return Err(Rejection::SoldOut);
    }
    let remaining = ticket.remaining();
    if tickets_count > remaining {
        return Err(Rejection::NotEnoughTickets { remaining });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(quantity: i32, sold_count: i32) -> Ticket {
        Ticket {
            id: 1,
            name: "Standard".to_string(),
            price: Decimal::new(1000, 0),
            quantity,
            sold_count,
            event_id: 1,
        }
    }

    #[test]
    fn test_check_availability() {
        assert_eq!(check_availability(&ticket(20, 5), 3), Ok(()));
        assert_eq!(check_availability(&ticket(20, 5), 15), Ok(()));
        assert_eq!(
            check_availability(&ticket(20, 20), 1),
            Err(Rejection::SoldOut)
        );
        assert_eq!(
            check_availability(&ticket(20, 18), 3),
            Err(Rejection::NotEnoughTickets { remaining: 2 })
        );
    }

    #[test]
    fn test_total_amount_refuses_overflow() {
        assert_eq!(
            total_amount(Decimal::new(150000, 2), 3).unwrap(),
            Decimal::new(450000, 2)
        );
        assert!(matches!(
            total_amount(Decimal::MAX, 2),
            Err(AppError::ValidationError(_))
        ));
    }
}
