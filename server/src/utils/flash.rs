//! One-shot messages carried across a redirect in a cookie.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

pub const FLASH_COOKIE: &str = "gatherly_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

impl FlashLevel {
    fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
            FlashLevel::Info => "info",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(FlashLevel::Success),
            "error" => Some(FlashLevel::Error),
            "info" => Some(FlashLevel::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        urlencoding::encode(&format!("{}:{}", self.level.as_str(), self.message)).into_owned()
    }

    fn decode(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let (level, message) = decoded.split_once(':')?;
        Some(Self {
            level: FlashLevel::parse(level)?,
            message: message.to_string(),
        })
    }
}

pub fn set_flash(jar: CookieJar, flash: &Flash) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, flash.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Reads the pending flash message and clears it.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| Flash::decode(cookie.value()));

    match flash {
        Some(flash) => (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), Some(flash)),
        None => (jar, None),
    }
}

/// `303 See Other` to `location`, showing `flash` on the next page.
pub fn redirect_with_flash(jar: CookieJar, location: &str, flash: Flash) -> Response {
    (set_flash(jar, &flash), Redirect::to(location)).into_response()
}
