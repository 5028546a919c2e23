//! Demo data so a fresh install has something to browse.

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use tracing::info;

use super::{Store, StoreResult};
use crate::auth::{AuthError, PasswordService};
use crate::models::{NewEvent, NewTicket, NewUser};

pub const DEMO_PASSWORD: &str = "password123";
pub const DEMO_ORGANIZER_EMAIL: &str = "organizer@example.com";
pub const DEMO_ATTENDEE_EMAIL: &str = "user@example.com";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] super::StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn days_from_now(days: i64) -> NaiveDateTime {
    let at = Local::now().naive_local() + Duration::days(days);
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Inserts two demo accounts, two events and three ticket types when no
/// user exists yet. Returns whether anything was inserted.
pub async fn seed_demo_data(store: &dyn Store) -> Result<bool, SeedError> {
    if store.count_users().await? > 0 {
        return Ok(false);
    }

    let password_hash = PasswordService::hash(DEMO_PASSWORD)?;

    let organizer = store
        .create_user(&NewUser {
            email: DEMO_ORGANIZER_EMAIL.to_string(),
            password_hash: password_hash.clone(),
            first_name: "Ivan".to_string(),
            last_name: "Organizer".to_string(),
            is_organizer: true,
        })
        .await?;

    store
        .create_user(&NewUser {
            email: DEMO_ATTENDEE_EMAIL.to_string(),
            password_hash,
            first_name: "Anna".to_string(),
            last_name: "Attendee".to_string(),
            is_organizer: false,
        })
        .await?;

    seed_events(store, organizer.id).await?;

    info!("Seeded demo accounts and events");
    Ok(true)
}

async fn seed_events(store: &dyn Store, organizer_id: i64) -> StoreResult<()> {
    let (jazz, _) = store
        .create_event(
            organizer_id,
            &NewEvent {
                title: "Jazz Night at City Club".to_string(),
                description: "An unforgettable evening of jazz with the best musicians in town."
                    .to_string(),
                category: "Concert".to_string(),
                date: days_from_now(10),
                location: "10 Tverskaya St, Moscow".to_string(),
                max_participants: 100,
            },
            &NewTicket {
                name: "Standard".to_string(),
                price: Decimal::new(150000, 2),
                quantity: 100,
            },
        )
        .await?;

    store
        .add_ticket(
            jazz.id,
            &NewTicket {
                name: "VIP".to_string(),
                price: Decimal::new(300000, 2),
                quantity: 20,
            },
        )
        .await?;

    store
        .create_event(
            organizer_id,
            &NewEvent {
                title: "Pottery Workshop".to_string(),
                description: "Learn to make ceramics with your own hands.".to_string(),
                category: "Workshop".to_string(),
                date: days_from_now(15),
                location: "25 Arbat St, Moscow".to_string(),
                max_participants: 20,
            },
            &NewTicket {
                name: "Participation".to_string(),
                price: Decimal::new(250000, 2),
                quantity: 20,
            },
        )
        .await?;

    Ok(())
}
