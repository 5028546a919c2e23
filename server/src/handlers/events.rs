use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Local, Timelike};
use serde::Serialize;

use super::forms::{BookingForm, EventForm};
use super::redirect_with_error;
use crate::auth::{CurrentUser, MaybeUser};
use crate::services::booking;
use crate::services::catalog::{self, CatalogQuery, EventDetail};
use crate::services::events::{self, CATEGORY_CHOICES, DEFAULT_CAPACITY, DEFAULT_TICKET_NAME};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::flash::{redirect_with_flash, Flash};
use crate::utils::response::page;

const CATALOG_PATH: &str = "/events";

#[derive(Serialize)]
struct EventPage {
    #[serde(flatten)]
    detail: EventDetail,
    can_book: bool,
    default_tickets_count: i32,
}

#[derive(Serialize)]
struct EventFormDefaults {
    date: String,
    max_participants: i32,
    ticket_name: &'static str,
    ticket_price: &'static str,
}

#[derive(Serialize)]
struct CreateEventPage {
    categories: &'static [&'static str],
    defaults: EventFormDefaults,
    is_organizer: bool,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let catalog = catalog::browse(state.store.as_ref(), &query).await?;
    Ok(page(jar, catalog, "Events"))
}

pub async fn event_detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(event_id): Path<i64>,
    jar: CookieJar,
) -> Response {
    match catalog::event_detail(state.store.as_ref(), viewer.as_ref(), event_id).await {
        Ok(detail) => {
            let can_book = viewer.is_some() && detail.event.is_published;
            let body = EventPage {
                detail,
                can_book,
                default_tickets_count: 1,
            };
            page(jar, body, "Event")
        }
        Err(e) => redirect_with_error(jar, CATALOG_PATH, e),
    }
}

pub async fn book_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<i64>,
    jar: CookieJar,
    form: Result<Form<BookingForm>, FormRejection>,
) -> Response {
    let detail_path = format!("/events/{event_id}");

    let Ok(Form(form)) = form else {
        return redirect_with_flash(
            jar,
            &detail_path,
            Flash::error("Please enter how many tickets to book"),
        );
    };

    match booking::book_event(state.store.as_ref(), &user, event_id, form.tickets_count).await {
        Ok(booking) => redirect_with_flash(
            jar,
            "/dashboard",
            Flash::success(format!(
                "Booking confirmed! Total: {}",
                booking.total_amount
            )),
        ),
        Err(e @ AppError::NotFound(_)) => redirect_with_error(jar, CATALOG_PATH, e),
        Err(e) => redirect_with_error(jar, &detail_path, e),
    }
}

pub async fn create_event_form(CurrentUser(user): CurrentUser, jar: CookieJar) -> Response {
    let now = Local::now().naive_local();
    let now = now.with_second(0).unwrap_or(now);

    let body = CreateEventPage {
        categories: &CATEGORY_CHOICES,
        defaults: EventFormDefaults {
            date: now.format("%Y-%m-%d %H:%M").to_string(),
            max_participants: DEFAULT_CAPACITY,
            ticket_name: DEFAULT_TICKET_NAME,
            ticket_price: "0.00",
        },
        is_organizer: user.is_organizer,
    };
    page(jar, body, "Create event")
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    form: Result<Form<EventForm>, FormRejection>,
) -> Response {
    const FORM_PATH: &str = "/events/create";

    let draft = match form {
        Ok(Form(form)) => form.into_draft(),
        Err(rejection) => Err(AppError::ValidationError(rejection.body_text())),
    };
    let draft = match draft {
        Ok(draft) => draft,
        Err(e) => return redirect_with_error(jar, FORM_PATH, e),
    };

    match events::create_event(state.store.as_ref(), &user, draft).await {
        Ok((event, _)) => {
            let message = if user.is_organizer {
                "Event created successfully!".to_string()
            } else {
                "You are now an organizer! Event created successfully!".to_string()
            };
            redirect_with_flash(jar, &format!("/events/{}", event.id), Flash::success(message))
        }
        Err(e) => redirect_with_error(jar, FORM_PATH, e),
    }
}
