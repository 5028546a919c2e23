//! Operations behind the HTTP surface. Every operation that acts on behalf
//! of a user takes that user explicitly.

pub mod accounts;
pub mod api;
pub mod booking;
pub mod catalog;
pub mod events;
