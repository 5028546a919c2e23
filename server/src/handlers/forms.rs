//! Form bodies posted by the pages.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::services::events::{EventDraft, DEFAULT_TICKET_NAME};
use crate::utils::error::AppError;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 2, max = 50, message = "must be 2-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50, message = "must be 2-50 characters"))]
    pub last_name: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

fn default_ticket_name() -> String {
    DEFAULT_TICKET_NAME.to_string()
}

#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub location: String,
    pub max_participants: i32,
    #[serde(default = "default_ticket_name")]
    pub ticket_name: String,
    #[serde(default)]
    pub ticket_price: Decimal,
}

impl EventForm {
    pub fn into_draft(self) -> Result<EventDraft, AppError> {
        Ok(EventDraft {
            date: parse_event_date(&self.date)?,
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            max_participants: self.max_participants,
            ticket_name: self.ticket_name,
            ticket_price: self.ticket_price,
        })
    }
}

/// Accepts `YYYY-MM-DD HH:MM` and the browser's `datetime-local` format.
pub fn parse_event_date(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            AppError::ValidationError("date: expected YYYY-MM-DD HH:MM".to_string())
        })
}

#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub tickets_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_date_formats() {
        let expected = NaiveDateTime::parse_from_str("2026-11-05 19:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(parse_event_date("2026-11-05 19:30").unwrap(), expected);
        assert_eq!(parse_event_date("2026-11-05T19:30").unwrap(), expected);
        assert_eq!(parse_event_date(" 2026-11-05T19:30:00 ").unwrap(), expected);
        assert!(parse_event_date("05/11/2026").is_err());
    }

    #[test]
    fn test_registration_form_validation() {
        let form = RegistrationForm {
            email: "anna@example.com".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Smith".to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
        };
        assert!(form.validate().is_ok());

        let mismatch = RegistrationForm {
            confirm_password: "password124".to_string(),
            ..form
        };
        let errors = mismatch.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[tokio::test]
    async fn test_event_form_defaults() {
        use axum::extract::{Form, FromRequest};

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(
                "title=Jazz&description=Live&category=Concert&date=2026-11-05+19%3A30\
                 &location=Club&max_participants=50",
            ))
            .unwrap();
        let Form(form) = Form::<EventForm>::from_request(request, &()).await.unwrap();

        assert_eq!(form.ticket_name, "Standard");
        assert_eq!(form.ticket_price, Decimal::ZERO);
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.max_participants, 50);
    }
}
