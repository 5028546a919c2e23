//! Persistent tables for users, events, tickets and bookings.
//!
//! Two backends implement [`Store`]: SQLite for the default local file
//! database and PostgreSQL for hosted deployments. The backend is picked from
//! the scheme of the connection string.

mod error;
pub mod postgres;
pub mod seed;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    Booking, BookingSummary, Event, NewEvent, NewTicket, NewUser, Reservation, Ticket, User,
};

pub use error::{StoreError, StoreResult};
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Storage operations used by the services.
#[async_trait]
pub trait Store: Send + Sync {
    /// Counts registered users.
    async fn count_users(&self) -> StoreResult<i64>;

    /// Creates a new user.
    async fn create_user(&self, user: &NewUser) -> StoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Creates an event together with its ticket type in one transaction,
    /// marking the organizer as such if they were not already.
    async fn create_event(
        &self,
        organizer_id: i64,
        event: &NewEvent,
        ticket: &NewTicket,
    ) -> StoreResult<(Event, Ticket)>;

    /// Adds another ticket type to an existing event.
    async fn add_ticket(&self, event_id: i64, ticket: &NewTicket) -> StoreResult<Ticket>;

    /// Gets an event by ID regardless of its publication state.
    async fn get_event(&self, id: i64) -> StoreResult<Option<Event>>;

    /// Lists published events ordered by date, optionally narrowed to one
    /// category.
    async fn list_published_events(&self, category: Option<&str>) -> StoreResult<Vec<Event>>;

    /// Distinct categories across all events.
    async fn list_categories(&self) -> StoreResult<Vec<String>>;

    /// Ticket types of an event, oldest first.
    async fn list_tickets(&self, event_id: i64) -> StoreResult<Vec<Ticket>>;

    /// Increments the ticket's sold count and inserts a confirmed booking as
    /// one unit. Returns `None` without writing anything when fewer than
    /// `tickets_count` tickets remain.
    async fn reserve_tickets(&self, reservation: &Reservation) -> StoreResult<Option<Booking>>;

    /// Bookings of a user, newest first.
    async fn list_user_bookings(&self, user_id: i64) -> StoreResult<Vec<BookingSummary>>;
}

/// Rewrites a `postgres://` prefix to `postgresql://`.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => url.to_string(),
    }
}

/// Opens the store named by `database_url` and brings its schema up to date.
pub async fn connect(database_url: &str) -> StoreResult<Arc<dyn Store>> {
    let url = normalize_database_url(database_url);

    if url.starts_with("sqlite:") {
        let store = SqliteStore::connect(&url).await?;
        store.migrate().await?;
        tracing::info!("Connected to SQLite store");
        Ok(Arc::new(store))
    } else if url.starts_with("postgresql://") {
        let store = PgStore::connect(&url).await?;
        store.migrate().await?;
        tracing::info!("Connected to PostgreSQL store");
        Ok(Arc::new(store))
    } else {
        Err(StoreError::UnsupportedUrl(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_postgres_scheme() {
        assert_eq!(
            normalize_database_url("postgres://user:pw@db:5432/gatherly"),
            "postgresql://user:pw@db:5432/gatherly"
        );
    }

    #[test]
    fn test_normalize_leaves_other_urls_alone() {
        assert_eq!(
            normalize_database_url("postgresql://db/gatherly"),
            "postgresql://db/gatherly"
        );
        assert_eq!(
            normalize_database_url("sqlite://gatherly.db"),
            "sqlite://gatherly.db"
        );
        // Only the scheme is rewritten
        assert_eq!(
            normalize_database_url("sqlite://postgres://x"),
            "sqlite://postgres://x"
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let result = connect("mysql://localhost/gatherly").await;
        assert!(matches!(result, Err(StoreError::UnsupportedUrl(_))));
    }
}
