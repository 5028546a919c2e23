//! Gatherly: a small event-booking web application.
//!
//! Users register, browse published events and book tickets; any user can
//! organize an event with a single ticket type. Pages are served as JSON
//! page models and the catalog is also exposed as a read-only JSON API.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_routes;
pub use state::AppState;
