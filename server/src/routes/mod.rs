use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers};
use crate::handlers::{account, api, auth, events, health_check, index};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.cors_allowed_origins);
    let include_hsts = state.config.is_production;

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/events", get(events::list_events))
        .route(
            "/events/create",
            get(events::create_event_form).post(events::create_event),
        )
        .route("/events/:id", get(events::event_detail))
        .route("/events/:id/book", post(events::book_event))
        .route("/api/events", get(api::list_events))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(account::dashboard))
        .route("/profile", get(account::profile))
        .with_state(state);

    with_security_headers(router, include_hsts)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
