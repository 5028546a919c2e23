use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::Value;

use crate::utils::flash::{take_flash, Flash};

/// Envelope for page models. `flash` carries the message left by the
/// previous redirect, if any.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

/// Renders a page model, consuming any pending flash message.
pub fn page<T>(jar: CookieJar, data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    let (jar, flash) = take_flash(jar);
    let body = ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
        flash,
    };
    (jar, (StatusCode::OK, Json(body))).into_response()
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
            details,
        },
    };

    (status, Json(body)).into_response()
}
