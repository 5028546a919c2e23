use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::forms::{LoginForm, RegistrationForm};
use super::{redirect_with_error, safe_next};
use crate::auth::{MaybeUser, SESSION_COOKIE};
use crate::services::accounts::{self, Registration};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::flash::{redirect_with_flash, Flash};
use crate::utils::response::page;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Serialize)]
struct LoginPage {
    next: Option<String>,
    already_logged_in: bool,
}

#[derive(Serialize)]
struct RegisterPage {
    already_logged_in: bool,
    min_password_length: usize,
}

fn login_path(next: Option<&str>) -> String {
    match safe_next(next) {
        Some(next) => format!("/login?next={}", urlencoding::encode(next)),
        None => "/login".to_string(),
    }
}

pub async fn login_form(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
) -> Response {
    let body = LoginPage {
        next: safe_next(query.next.as_deref()).map(str::to_string),
        already_logged_in: user.is_some(),
    };
    page(jar, body, "Login")
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let err = AppError::ValidationError(rejection.body_text());
            return redirect_with_error(jar, "/login", err);
        }
    };
    let retry_path = login_path(form.next.as_deref());

    if let Err(errors) = form.validate() {
        return redirect_with_error(jar, &retry_path, errors.into());
    }

    let user = match accounts::authenticate(state.store.as_ref(), &form.email, &form.password).await
    {
        Ok(user) => user,
        Err(e) => return redirect_with_error(jar, &retry_path, e),
    };

    let token = match state.jwt.generate_token(user.id, &user.email) {
        Ok(token) => token,
        Err(e) => return redirect_with_error(jar, &retry_path, e.into()),
    };

    let session = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production)
        .max_age(time::Duration::seconds(state.jwt.expiration_seconds()));

    let destination = safe_next(form.next.as_deref()).unwrap_or("/events");
    redirect_with_flash(
        jar.add(session),
        destination,
        Flash::success(format!("Welcome back, {}!", user.first_name)),
    )
}

pub async fn register_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    let body = RegisterPage {
        already_logged_in: user.is_some(),
        min_password_length: 8,
    };
    page(jar, body, "Register")
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<RegistrationForm>, FormRejection>,
) -> Response {
    const FORM_PATH: &str = "/register";

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let err = AppError::ValidationError(rejection.body_text());
            return redirect_with_error(jar, FORM_PATH, err);
        }
    };

    if let Err(errors) = form.validate() {
        return redirect_with_error(jar, FORM_PATH, errors.into());
    }

    let registration = Registration {
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
        password: form.password,
    };

    match accounts::register(state.store.as_ref(), registration).await {
        Ok(_) => redirect_with_flash(
            jar,
            "/login",
            Flash::success("Registration successful! Please log in."),
        ),
        Err(e) => redirect_with_error(jar, FORM_PATH, e),
    }
}

pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    redirect_with_flash(jar, "/events", Flash::info("You have been logged out."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_path_keeps_safe_next() {
        assert_eq!(login_path(Some("/dashboard")), "/login?next=%2Fdashboard");
        assert_eq!(login_path(Some("http://evil.test")), "/login");
        assert_eq!(login_path(None), "/login");
    }
}
