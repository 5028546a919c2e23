//! Extractors that resolve the caller from the session cookie or a bearer
//! token.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::flash::{redirect_with_flash, Flash};

pub const SESSION_COOKIE: &str = "gatherly_session";

/// The logged-in caller. Guarded routes take this; anonymous requests are
/// redirected to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The caller if logged in.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn extract_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = extract_token(parts) else {
        return Ok(None);
    };

    let claims = match state.jwt.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session token");
            return Ok(None);
        }
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(_) => return Ok(None),
    };

    Ok(state.store.get_user(user_id).await?)
}

fn login_redirect(parts: &Parts) -> Response {
    let next = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("/login?next={}", urlencoding::encode(next));

    redirect_with_flash(
        CookieJar::from_headers(&parts.headers),
        &location,
        Flash::info("Please log in to access this page."),
    )
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err(login_redirect(parts)),
            Err(e) => Err(e.into_response()),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await
            .map(MaybeUser)
            .map_err(IntoResponse::into_response)
    }
}
