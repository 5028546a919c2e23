mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use gatherly_server::models::{
    Booking, BookingSummary, Event, NewEvent, NewTicket, NewUser, Reservation, Ticket, User,
};
use gatherly_server::services::api::published_summaries;
use gatherly_server::services::booking::book_event;
use gatherly_server::services::catalog::{browse, event_detail, CatalogQuery};
use gatherly_server::services::events::create_event;
use gatherly_server::services::events::MAX_TICKET_PRICE;
use gatherly_server::store::{SqliteStore, Store, StoreResult};
use gatherly_server::utils::error::{AppError, Rejection};

use common::{booking_count, draft, memory_store, set_sold_count, unpublish, user};

fn query(category: Option<&str>, search: Option<&str>) -> CatalogQuery {
    CatalogQuery {
        category: category.map(str::to_string),
        search: search.map(str::to_string),
    }
}

async fn titles(store: &SqliteStore, query: &CatalogQuery) -> Vec<String> {
    browse(store, query)
        .await
        .unwrap()
        .events
        .into_iter()
        .map(|event| event.title)
        .collect()
}

#[tokio::test]
async fn test_catalog_hides_unpublished_events() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let (shown, _) = create_event(store.as_ref(), &organizer, draft("Shown", "Concert", 10))
        .await
        .unwrap();
    let (hidden, _) = create_event(store.as_ref(), &organizer, draft("Hidden", "Concert", 10))
        .await
        .unwrap();
    unpublish(&store, hidden.id).await;

    assert_eq!(titles(&store, &CatalogQuery::default()).await, vec!["Shown"]);

    let api = published_summaries(store.as_ref()).await.unwrap();
    assert_eq!(api.len(), 1);
    assert_eq!(api[0].id, shown.id);

    // The organizer still sees their own draft; nobody else does.
    let stranger = user(store.as_ref(), "stranger@example.com").await;
    assert!(event_detail(store.as_ref(), Some(&organizer), hidden.id)
        .await
        .is_ok());
    for viewer in [Some(&stranger), None] {
        let err = event_detail(store.as_ref(), viewer, hidden.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

#[tokio::test]
async fn test_catalog_category_filter() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    for (title, category) in [("Jazz", "Concert"), ("Clay", "Workshop"), ("Rock", "Concert")] {
        create_event(store.as_ref(), &organizer, draft(title, category, 10))
            .await
            .unwrap();
    }

    let concerts = titles(&store, &query(Some("Concert"), None)).await;
    assert_eq!(concerts.len(), 2);
    assert!(concerts.iter().all(|t| t == "Jazz" || t == "Rock"));

    assert_eq!(titles(&store, &query(Some("all"), None)).await.len(), 3);
    assert_eq!(titles(&store, &query(Some(""), None)).await.len(), 3);
    assert!(titles(&store, &query(Some("Sport"), None)).await.is_empty());

    let catalog = browse(store.as_ref(), &CatalogQuery::default()).await.unwrap();
    assert_eq!(catalog.categories.len(), 2);
}

#[tokio::test]
async fn test_catalog_search_is_case_insensitive() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    create_event(store.as_ref(), &organizer, draft("Jazz Night", "Concert", 10))
        .await
        .unwrap();
    let mut pottery = draft("Pottery Workshop", "Workshop", 10);
    pottery.description = "Bring your own JAZZ records".to_string();
    create_event(store.as_ref(), &organizer, pottery).await.unwrap();
    create_event(store.as_ref(), &organizer, draft("Marathon", "Sport", 10))
        .await
        .unwrap();

    let everything = titles(&store, &CatalogQuery::default()).await;
    let jazz = titles(&store, &query(None, Some("jAzZ"))).await;
    assert_eq!(jazz.len(), 2);
    assert!(jazz.iter().all(|title| everything.contains(title)));

    assert_eq!(titles(&store, &query(None, Some("  "))).await.len(), 3);
    assert_eq!(
        titles(&store, &query(Some("Workshop"), Some("jazz"))).await,
        vec!["Pottery Workshop"]
    );
}

#[tokio::test]
async fn test_sold_out_booking_changes_nothing() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, ticket) = create_event(store.as_ref(), &organizer, draft("Full", "Concert", 20))
        .await
        .unwrap();
    set_sold_count(&store, ticket.id, 20).await;

    let err = book_event(store.as_ref(), &buyer, event.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(Rejection::SoldOut)));

    let tickets = store.list_tickets(event.id).await.unwrap();
    assert_eq!(tickets[0].sold_count, 20);
    assert_eq!(booking_count(&store).await, 0);
}

#[tokio::test]
async fn test_booking_takes_tickets_and_totals_price() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, ticket) = create_event(store.as_ref(), &organizer, draft("Gig", "Concert", 20))
        .await
        .unwrap();
    set_sold_count(&store, ticket.id, 5).await;

    let booking = book_event(store.as_ref(), &buyer, event.id, 3).await.unwrap();
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.tickets_count, 3);
    assert_eq!(booking.user_id, buyer.id);
    assert_eq!(booking.ticket_id, ticket.id);
    assert_eq!(booking.total_amount, ticket.price * Decimal::from(3));

    let tickets = store.list_tickets(event.id).await.unwrap();
    assert_eq!(tickets[0].sold_count, 8);

    let bookings = store.list_user_bookings(buyer.id).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].event_title, "Gig");
}

#[tokio::test]
async fn test_booking_more_than_remaining_is_rejected() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, ticket) = create_event(store.as_ref(), &organizer, draft("Gig", "Concert", 20))
        .await
        .unwrap();
    set_sold_count(&store, ticket.id, 18).await;

    let err = book_event(store.as_ref(), &buyer, event.id, 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Rejected(Rejection::NotEnoughTickets { remaining: 2 })
    ));
    assert_eq!(err.public_message(), "Only 2 ticket(s) left");
    assert_eq!(store.list_tickets(event.id).await.unwrap()[0].sold_count, 18);
}

#[tokio::test]
async fn test_booking_rejects_bad_requests() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let (event, _) = create_event(store.as_ref(), &organizer, draft("Gig", "Concert", 20))
        .await
        .unwrap();

    let err = book_event(store.as_ref(), &organizer, event.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = book_event(store.as_ref(), &organizer, 9999, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    unpublish(&store, event.id).await;
    let err = book_event(store.as_ref(), &organizer, event.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Rejected(Rejection::EventUnavailable)));
    assert_eq!(booking_count(&store).await, 0);
}

#[tokio::test]
async fn test_repeated_booking_books_again() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, _) = create_event(store.as_ref(), &organizer, draft("Gig", "Concert", 20))
        .await
        .unwrap();

    book_event(store.as_ref(), &buyer, event.id, 2).await.unwrap();
    book_event(store.as_ref(), &buyer, event.id, 2).await.unwrap();

    assert_eq!(booking_count(&store).await, 2);
    assert_eq!(store.list_tickets(event.id).await.unwrap()[0].sold_count, 4);
}

#[tokio::test]
async fn test_booking_uses_first_ticket_type() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, standard) =
        create_event(store.as_ref(), &organizer, draft("Gig", "Concert", 20))
            .await
            .unwrap();
    store
        .add_ticket(
            event.id,
            &NewTicket {
                name: "VIP".to_string(),
                price: Decimal::new(300000, 2),
                quantity: 5,
            },
        )
        .await
        .unwrap();

    let booking = book_event(store.as_ref(), &buyer, event.id, 1).await.unwrap();
    assert_eq!(booking.ticket_id, standard.id);
    assert_eq!(booking.total_amount, standard.price);
}

#[tokio::test]
async fn test_create_event_makes_one_ticket_and_an_organizer() {
    let store = memory_store().await;
    let caller = user(store.as_ref(), "new@example.com").await;
    assert!(!caller.is_organizer);

    let (event, ticket) = create_event(store.as_ref(), &caller, draft("Talk", "Meetup", 50))
        .await
        .unwrap();
    assert!(event.is_published);
    assert_eq!(event.organizer_id, caller.id);

    let tickets = store.list_tickets(event.id).await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].id, ticket.id);
    assert_eq!(tickets[0].quantity, 50);
    assert_eq!(tickets[0].sold_count, 0);

    let caller = store.get_user(caller.id).await.unwrap().unwrap();
    assert!(caller.is_organizer);
}

#[tokio::test]
async fn test_create_event_rejects_invalid_drafts() {
    let store = memory_store().await;
    let caller = user(store.as_ref(), "new@example.com").await;

    let mut no_title = draft("", "Meetup", 50);
    no_title.title = String::new();
    assert!(matches!(
        create_event(store.as_ref(), &caller, no_title).await,
        Err(AppError::ValidationError(_))
    ));

    assert!(matches!(
        create_event(store.as_ref(), &caller, draft("Talk", "Meetup", 0)).await,
        Err(AppError::ValidationError(_))
    ));

    let mut negative = draft("Talk", "Meetup", 10);
    negative.ticket_price = Decimal::new(-1, 0);
    assert!(matches!(
        create_event(store.as_ref(), &caller, negative).await,
        Err(AppError::ValidationError(_))
    ));

    assert!(store.list_published_events(None).await.unwrap().is_empty());
    let caller = store.get_user(caller.id).await.unwrap().unwrap();
    assert!(!caller.is_organizer);
}

#[tokio::test]
async fn test_api_sums_remaining_tickets_across_types() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let (event, first) = create_event(store.as_ref(), &organizer, draft("Gig", "Concert", 10))
        .await
        .unwrap();
    let second = store
        .add_ticket(
            event.id,
            &NewTicket {
                name: "VIP".to_string(),
                price: Decimal::new(300000, 2),
                quantity: 10,
            },
        )
        .await
        .unwrap();
    set_sold_count(&store, first.id, 3).await;
    set_sold_count(&store, second.id, 4).await;

    let summaries = published_summaries(store.as_ref()).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].available_tickets, 13);
    assert_eq!(summaries[0].price, first.price);
    assert_eq!(summaries[0].organizer, "Test User");
}

#[tokio::test]
async fn test_created_event_round_trips_to_catalog_and_api() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let (event, _) = create_event(store.as_ref(), &organizer, draft("Launch", "Meetup", 30))
        .await
        .unwrap();

    let catalog = browse(store.as_ref(), &CatalogQuery::default()).await.unwrap();
    let listed = catalog.events.iter().find(|e| e.id == event.id).unwrap();
    assert_eq!(listed.title, "Launch");
    assert_eq!(listed.category, "Meetup");
    assert_eq!(listed.date, common::date("2026-12-01 19:00"));

    let summaries = published_summaries(store.as_ref()).await.unwrap();
    let summary = summaries.iter().find(|s| s.id == event.id).unwrap();
    assert_eq!(summary.title, "Launch");
    assert_eq!(summary.category, "Meetup");
    assert_eq!(summary.date.as_deref(), Some("2026-12-01T19:00:00"));
    assert_eq!(summary.available_tickets, 30);
}

#[tokio::test]
async fn test_concurrent_bookings_never_oversell() {
    let path = std::env::temp_dir().join(format!("gatherly-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let store = SqliteStore::connect(&url).await.unwrap();
    store.migrate().await.unwrap();
    let store = Arc::new(store);

    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, _) = create_event(store.as_ref(), &organizer, draft("Rush", "Concert", 20))
        .await
        .unwrap();

    let attempts: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            let buyer = buyer.clone();
            tokio::spawn(async move { book_event(store.as_ref(), &buyer, event.id, 3).await })
        })
        .collect();

    let mut confirmed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(err) => assert!(matches!(err, AppError::Rejected(_)), "{err:?}"),
        }
    }

    assert_eq!(confirmed, 6);
    let tickets = store.list_tickets(event.id).await.unwrap();
    assert_eq!(tickets[0].sold_count, 18);
    assert_eq!(booking_count(&store).await, 6);

    store.pool().close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

/// Loses the first reservation as if a concurrent booking had won it.
struct ContendedStore {
    inner: Arc<SqliteStore>,
    contended: AtomicBool,
}

#[async_trait]
impl Store for ContendedStore {
    async fn count_users(&self) -> StoreResult<i64> {
        self.inner.count_users().await
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.get_user_by_email(email).await
    }

    async fn create_event(
        &self,
        organizer_id: i64,
        event: &NewEvent,
        ticket: &NewTicket,
    ) -> StoreResult<(Event, Ticket)> {
        self.inner.create_event(organizer_id, event, ticket).await
    }

    async fn add_ticket(&self, event_id: i64, ticket: &NewTicket) -> StoreResult<Ticket> {
        self.inner.add_ticket(event_id, ticket).await
    }

    async fn get_event(&self, id: i64) -> StoreResult<Option<Event>> {
        self.inner.get_event(id).await
    }

    async fn list_published_events(&self, category: Option<&str>) -> StoreResult<Vec<Event>> {
        self.inner.list_published_events(category).await
    }

    async fn list_categories(&self) -> StoreResult<Vec<String>> {
        self.inner.list_categories().await
    }

    async fn list_tickets(&self, event_id: i64) -> StoreResult<Vec<Ticket>> {
        self.inner.list_tickets(event_id).await
    }

    async fn reserve_tickets(&self, reservation: &Reservation) -> StoreResult<Option<Booking>> {
        if self.contended.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.reserve_tickets(reservation).await
    }

    async fn list_user_bookings(&self, user_id: i64) -> StoreResult<Vec<BookingSummary>> {
        self.inner.list_user_bookings(user_id).await
    }
}

#[tokio::test]
async fn test_booking_retries_after_losing_reservation() {
    let inner = memory_store().await;
    let organizer = user(inner.as_ref(), "org@example.com").await;
    let buyer = user(inner.as_ref(), "buyer@example.com").await;
    let (event, _) = create_event(inner.as_ref(), &organizer, draft("Gig", "Concert", 20))
        .await
        .unwrap();
    let store = ContendedStore {
        inner: inner.clone(),
        contended: AtomicBool::new(true),
    };

    let booking = book_event(&store, &buyer, event.id, 3).await.unwrap();
    assert_eq!(booking.tickets_count, 3);
    assert_eq!(inner.list_tickets(event.id).await.unwrap()[0].sold_count, 3);
}

#[tokio::test]
async fn test_ticket_price_is_bounded() {
    let store = memory_store().await;
    let caller = user(store.as_ref(), "new@example.com").await;

    for price in [Decimal::MAX, MAX_TICKET_PRICE + Decimal::new(1, 2), Decimal::new(1001, 3)] {
        let mut huge = draft("Gala", "Concert", 10);
        huge.ticket_price = price;
        assert!(matches!(
            create_event(store.as_ref(), &caller, huge).await,
            Err(AppError::ValidationError(_))
        ));
    }

    let mut priciest = draft("Gala", "Concert", 10);
    priciest.ticket_price = MAX_TICKET_PRICE;
    let (event, _) = create_event(store.as_ref(), &caller, priciest).await.unwrap();
    let booking = book_event(store.as_ref(), &caller, event.id, 10).await.unwrap();
    assert_eq!(booking.total_amount, MAX_TICKET_PRICE * Decimal::from(10));
}

#[tokio::test]
async fn test_booking_total_overflow_is_rejected() {
    let store = memory_store().await;
    let organizer = user(store.as_ref(), "org@example.com").await;
    let buyer = user(store.as_ref(), "buyer@example.com").await;
    let (event, first) = create_event(store.as_ref(), &organizer, draft("Gala", "Concert", 10))
        .await
        .unwrap();
    // A row written outside event creation, so nothing capped its price.
    sqlx::query("UPDATE tickets SET price = ? WHERE id = ?")
        .bind(Decimal::MAX.to_string())
        .bind(first.id)
        .execute(store.pool())
        .await
        .unwrap();

    let err = book_event(store.as_ref(), &buyer, event.id, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(store.list_tickets(event.id).await.unwrap()[0].sold_count, 0);
    assert_eq!(booking_count(&store).await, 0);
}

#[tokio::test]
async fn test_whitespace_only_fields_are_rejected() {
    let store = memory_store().await;
    let caller = user(store.as_ref(), "new@example.com").await;

    let mut blank_title = draft("Talk", "Meetup", 10);
    blank_title.title = "   ".to_string();
    let mut blank_category = draft("Talk", "Meetup", 10);
    blank_category.category = "  ".to_string();
    let mut blank_location = draft("Talk", "Meetup", 10);
    blank_location.location = " ".to_string();

    for blank in [blank_title, blank_category, blank_location] {
        assert!(matches!(
            create_event(store.as_ref(), &caller, blank).await,
            Err(AppError::ValidationError(_))
        ));
    }
    assert!(store.list_published_events(None).await.unwrap().is_empty());

    let mut padded = draft("Talk", "Meetup", 10);
    padded.title = "  Talk  ".to_string();
    let (event, _) = create_event(store.as_ref(), &caller, padded).await.unwrap();
    assert_eq!(event.title, "Talk");
}
