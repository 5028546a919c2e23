use axum::extract::State;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::models::{BookingSummary, User};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::page;

#[derive(Serialize)]
struct DashboardPage {
    user: User,
    bookings: Vec<BookingSummary>,
}

#[derive(Serialize)]
struct ProfilePage {
    user: User,
    display_name: String,
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let bookings = state.store.list_user_bookings(user.id).await?;
    Ok(page(jar, DashboardPage { user, bookings }, "Dashboard"))
}

pub async fn profile(CurrentUser(user): CurrentUser, jar: CookieJar) -> Response {
    let display_name = user.display_name();
    page(jar, ProfilePage { user, display_name }, "Profile")
}
