//! PostgreSQL-backed record store.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::{Store, StoreResult};
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

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations/postgres")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn summary_from_row(row: &PgRow) -> StoreResult<BookingSummary> {
    Ok(BookingSummary {
        booking: Booking {
            id: row.try_get("id")?,
            status: row.try_get("status")?,
            tickets_count: row.try_get("tickets_count")?,
            total_amount: row.try_get("total_amount")?,
            created_at: row.try_get("created_at")?,
            user_id: row.try_get("user_id")?,
            event_id: row.try_get("event_id")?,
            ticket_id: row.try_get("ticket_id")?,
        },
        event_title: row.try_get("event_title")?,
        event_date: row.try_get("event_date")?,
        ticket_name: row.try_get("ticket_name")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn count_users(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, is_verified, \
             is_organizer) VALUES ($1, $2, $3, $4, TRUE, $5) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.is_organizer)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
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

        sqlx::query("UPDATE users SET is_organizer = TRUE WHERE id = $1 AND NOT is_organizer")
            .bind(organizer_id)
            .execute(&mut *tx)
            .await?;

        let event_sql = format!(
            "INSERT INTO events (title, description, category, date, location, image_url, \
             max_participants, is_published, organizer_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8) RETURNING {EVENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Event>(&event_sql)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.category)
            .bind(event.date)
            .bind(&event.location)
            .bind(DEFAULT_IMAGE_URL)
            .bind(event.max_participants)
            .bind(organizer_id)
            .fetch_one(&mut *tx)
            .await?;

        let ticket_sql = format!(
            "INSERT INTO tickets (name, price, quantity, sold_count, event_id) \
             VALUES ($1, $2, $3, 0, $4) RETURNING {TICKET_COLUMNS}"
        );
        let created_ticket = sqlx::query_as::<_, Ticket>(&ticket_sql)
            .bind(&ticket.name)
            .bind(ticket.price)
            .bind(ticket.quantity)
            .bind(created.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((created, created_ticket))
    }

    async fn add_ticket(&self, event_id: i64, ticket: &NewTicket) -> StoreResult<Ticket> {
        let sql = format!(
            "INSERT INTO tickets (name, price, quantity, sold_count, event_id) \
             VALUES ($1, $2, $3, 0, $4) RETURNING {TICKET_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Ticket>(&sql)
            .bind(&ticket.name)
            .bind(ticket.price)
            .bind(ticket.quantity)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_event(&self, id: i64) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn list_published_events(&self, category: Option<&str>) -> StoreResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE is_published AND ($1::TEXT IS NULL OR category = $1) \
             ORDER BY date ASC, id ASC"
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
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
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = $1 ORDER BY id");
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    async fn reserve_tickets(&self, reservation: &Reservation) -> StoreResult<Option<Booking>> {
        if reservation.tickets_count <= 0 {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        // The row lock taken by UPDATE serializes concurrent bookings of the
        // same ticket type; the WHERE clause re-checks availability under it.
        let updated = sqlx::query(
            "UPDATE tickets SET sold_count = sold_count + $1 \
             WHERE id = $2 AND event_id = $3 AND sold_count + $1 <= quantity",
        )
        .bind(reservation.tickets_count)
        .bind(reservation.ticket_id)
        .bind(reservation.event_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO bookings (status, tickets_count, total_amount, user_id, event_id, \
             ticket_id) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(STATUS_CONFIRMED)
            .bind(reservation.tickets_count)
            .bind(reservation.total_amount)
            .bind(reservation.user_id)
            .bind(reservation.event_id)
            .bind(reservation.ticket_id)
            .fetch_one(&mut *tx)
            .await?;

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
             WHERE b.user_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }
}
