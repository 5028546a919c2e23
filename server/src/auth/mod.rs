//! Caller identity: password hashing, session tokens and the extractors that
//! hand an authenticated [`User`](crate::models::User) to handlers.

pub mod extract;
pub mod jwt;
pub mod password;

use thiserror::Error;

pub use extract::{CurrentUser, MaybeUser, SESSION_COOKIE};
pub use jwt::{Claims, JwtConfig, JwtManager};
pub use password::PasswordService;

pub const DEFAULT_JWT_ISSUER: &str = "gatherly";
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token encoding error: {0}")]
    TokenEncoding(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
