use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_CONFIRMED: &str = "confirmed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub status: String,
    pub tickets_count: i32,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub event_id: i64,
    pub ticket_id: i64,
}

/// A request to take `tickets_count` units of one ticket type. The store
/// applies it atomically or not at all.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub user_id: i64,
    pub event_id: i64,
    pub ticket_id: i64,
    pub tickets_count: i32,
    pub total_amount: Decimal,
}

/// A booking joined with the title and date of its event, for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub event_title: String,
    pub event_date: NaiveDateTime,
    pub ticket_name: String,
}
