pub mod account;
pub mod api;
pub mod auth;
pub mod events;
pub mod forms;

use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::config::SERVICE_NAME;
use crate::utils::error::AppError;
use crate::utils::flash::{redirect_with_flash, Flash};

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Json<impl Serialize> {
    Json(HealthPayload {
        status: "ok",
        service: SERVICE_NAME,
    })
}

pub async fn index() -> Redirect {
    Redirect::to("/events")
}

/// Sends the user back to `location` with the error as a flash message.
/// Internal failures are not the user's to fix and render as errors instead.
pub(crate) fn redirect_with_error(jar: CookieJar, location: &str, err: AppError) -> Response {
    if err.is_internal() {
        return err.into_response();
    }
    err.log();
    redirect_with_flash(jar, location, Flash::error(err.public_message()))
}

/// Only local paths are accepted as post-login destinations. Browsers read
/// `/\host` like `//host`, so backslashes and control characters are refused.
pub(crate) fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|path| {
        path.starts_with('/')
            && !path.starts_with("//")
            && !path.chars().any(|c| c == '\\' || c.is_control())
    })
}
