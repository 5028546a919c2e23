//! SQLite-backed record store.
//!
//! Used for the default file database and for tests (`sqlite::memory:`).
//! Money columns are stored as decimal text since SQLite has no exact
//! numeric type.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Booking, BookingSummary, Event, NewEvent, NewTicket, NewUser, Reservation, Ticket, User,
    DEFAULT_IMAGE_URL, STATUS_CONFIRMED,
};

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, avatar, is_verified, is_organizer, created_at";
const EVENT_COLUMNS: &str = "id, title, description, category, date, location, image_url, \
     max_participants, is_published, created_at, organizer_id";
const TICKET_COLUMNS: &str = "id, name, price, quantity, sold_count, event_id";
const BOOKING_COLUMNS: &str =
    "id, status, tickets_count, total_amount, created_at, user_id, event_id, ticket_id";

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url`.
    ///
    /// In-memory databases are private to each connection, so they get a
    /// single-connection pool.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let max_connections = if url.contains(":memory:") || url.contains("mode=memory") {
            1
        } else {
            MAX_CONNECTIONS
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations/sqlite").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decimal_column(row: &SqliteRow, column: &'static str) -> StoreResult<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|_| StoreError::corrupt(column, raw))
}

fn ticket_from_row(row: &SqliteRow) -> StoreResult<Ticket> {
    Ok(Ticket {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: decimal_column(row, "price")?,
        quantity: row.try_get("quantity")?,
        sold_count: row.try_get("sold_count")?,
        event_id: row.try_get("event_id")?,
    })
}

fn booking_from_row(row: &SqliteRow) -> StoreResult<Booking> {
    Ok(Booking {
        id: row.try_get("id")?,
        status: row.try_get("status")?,
        tickets_count: row.try_get("tickets_count")?,
        total_amount: decimal_column(row, "total_amount")?,
        created_at: row.try_get("created_at")?,
        user_id: row.try_get("user_id")?,
        event_id: row.try_get("event_id")?,
        ticket_id: row.try_get("ticket_id")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn count_users(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, is_verified, \
             is_organizer, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(true)
            .bind(user.is_organizer)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_event(
        &self,
        organizer_id: i64,
        event: &NewEvent,
        ticket: &NewTicket,
    ) -> StoreResult<(Event, Ticket)> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET is_organizer = ? WHERE id = ? AND is_organizer = ?")
            .bind(true)
            .bind(organizer_id)
            .bind(false)
            .execute(&mut *tx)
            .await?;

        let event_sql = format!(
            "INSERT INTO events (title, description, category, date, location, image_url, \
             max_participants, is_published, created_at, organizer_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {EVENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Event>(&event_sql)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.category)
            .bind(event.date)
            .bind(&event.location)
            .bind(DEFAULT_IMAGE_URL)
            .bind(event.max_participants)
            .bind(true)
            .bind(Utc::now())
            .bind(organizer_id)
            .fetch_one(&mut *tx)
            .await?;

        let ticket_sql = format!(
            "INSERT INTO tickets (name, price, quantity, sold_count, event_id) \
             VALUES (?, ?, ?, 0, ?) RETURNING {TICKET_COLUMNS}"
        );
        let row = sqlx::query(&ticket_sql)
            .bind(&ticket.name)
            .bind(ticket.price.to_string())
            .bind(ticket.quantity)
            .bind(created.id)
            .fetch_one(&mut *tx)
            .await?;
        let created_ticket = ticket_from_row(&row)?;

        tx.commit().await?;
        Ok((created, created_ticket))
    }

    async fn add_ticket(&self, event_id: i64, ticket: &NewTicket) -> StoreResult<Ticket> {
        let sql = format!(
            "INSERT INTO tickets (name, price, quantity, sold_count, event_id) \
             VALUES (?, ?, ?, 0, ?) RETURNING {TICKET_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&ticket.name)
            .bind(ticket.price.to_string())
            .bind(ticket.quantity)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;
        ticket_from_row(&row)
    }

    async fn get_event(&self, id: i64) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn list_published_events(&self, category: Option<&str>) -> StoreResult<Vec<Event>> {
        let events = match category {
            Some(category) => {
                let sql = format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE is_published = ? AND category = ? \
                     ORDER BY date ASC, id ASC"
                );
                sqlx::query_as::<_, Event>(&sql)
                    .bind(true)
                    .bind(category)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE is_published = ? \
                     ORDER BY date ASC, id ASC"
                );
                sqlx::query_as::<_, Event>(&sql)
                    .bind(true)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(events)
    }

    async fn list_categories(&self) -> StoreResult<Vec<String>> {
        let categories =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM events ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn list_tickets(&self, event_id: i64) -> StoreResult<Vec<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn reserve_tickets(&self, reservation: &Reservation) -> StoreResult<Option<Booking>> {
        if reservation.tickets_count <= 0 {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        // Check and increment in one statement so concurrent bookings cannot
        // both pass the availability check.
        let updated = sqlx::query(
            "UPDATE tickets SET sold_count = sold_count + ? \
             WHERE id = ? AND event_id = ? AND sold_count + ? <= quantity",
        )
        .bind(reservation.tickets_count)
        .bind(reservation.ticket_id)
        .bind(reservation.event_id)
        .bind(reservation.tickets_count)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO bookings (status, tickets_count, total_amount, created_at, user_id, \
             event_id, ticket_id) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(STATUS_CONFIRMED)
            .bind(reservation.tickets_count)
            .bind(reservation.total_amount.to_string())
            .bind(Utc::now())
            .bind(reservation.user_id)
            .bind(reservation.event_id)
            .bind(reservation.ticket_id)
            .fetch_one(&mut *tx)
            .await?;
        let booking = booking_from_row(&row)?;

        tx.commit().await?;
        Ok(Some(booking))
    }

    async fn list_user_bookings(&self, user_id: i64) -> StoreResult<Vec<BookingSummary>> {
        let rows = sqlx::query(
            "SELECT b.id, b.status, b.tickets_count, b.total_amount, b.created_at, b.user_id, \
             b.event_id, b.ticket_id, e.title AS event_title, e.date AS event_date, \
             t.name AS ticket_name \
             FROM bookings b \
             JOIN events e ON e.id = b.event_id \
             JOIN tickets t ON t.id = b.ticket_id \
             WHERE b.user_id = ? \
             ORDER BY b.created_at DESC, b.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> StoreResult<BookingSummary> {
                Ok(BookingSummary {
                    booking: booking_from_row(row)?,
                    event_title: row.try_get("event_title")?,
                    event_date: row.try_get("event_date")?,
                    ticket_name: row.try_get("ticket_name")?,
                })
            })
            .collect()
    }
}
