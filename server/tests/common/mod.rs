#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use gatherly_server::models::{NewUser, User};
use gatherly_server::services::events::EventDraft;
use gatherly_server::store::{SqliteStore, Store};

pub async fn memory_store() -> Arc<SqliteStore> {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    Arc::new(store)
}

pub async fn user(store: &dyn Store, email: &str) -> User {
    store
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            is_organizer: false,
        })
        .await
        .unwrap()
}

pub fn date(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap()
}

pub fn draft(title: &str, category: &str, capacity: i32) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        description: format!("All about {title}"),
        category: category.to_string(),
        date: date("2026-12-01 19:00"),
        location: "Main hall".to_string(),
        max_participants: capacity,
        ticket_name: "Standard".to_string(),
        ticket_price: Decimal::new(150000, 2),
    }
}

pub async fn set_sold_count(store: &SqliteStore, ticket_id: i64, sold_count: i32) {
    sqlx::query("UPDATE tickets SET sold_count = ? WHERE id = ?")
        .bind(sold_count)
        .bind(ticket_id)
        .execute(store.pool())
        .await
        .unwrap();
}

pub async fn unpublish(store: &SqliteStore, event_id: i64) {
    sqlx::query("UPDATE events SET is_published = ? WHERE id = ?")
        .bind(false)
        .bind(event_id)
        .execute(store.pool())
        .await
        .unwrap();
}

pub async fn booking_count(store: &SqliteStore) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
        .fetch_one(store.pool())
        .await
        .unwrap()
}
