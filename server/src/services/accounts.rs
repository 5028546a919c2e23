use tracing::info;

use crate::auth::PasswordService;
use crate::models::{NewUser, User};
use crate::store::Store;
use crate::utils::error::AppError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a verified, non-organizer account.
pub async fn register(store: &dyn Store, registration: Registration) -> Result<User, AppError> {
    let email = normalize_email(&registration.email);

    if store.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::ValidationError(
            "email: is already registered".to_string(),
        ));
    }

    let new_user = NewUser {
        email,
        password_hash: PasswordService::hash(&registration.password)?,
        first_name: registration.first_name.trim().to_string(),
        last_name: registration.last_name.trim().to_string(),
        is_organizer: false,
    };

    let user = store.create_user(&new_user).await.map_err(|e| {
        // Lost a race with a concurrent registration of the same address
        if e.is_unique_violation() {
            AppError::ValidationError("email: is already registered".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    info!(user_id = user.id, "User registered");
    Ok(user)
}

/// Checks credentials. Unknown email and wrong password fail the same way.
pub async fn authenticate(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
    let user = store
        .get_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !PasswordService::verify(password, &user.password_hash)? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    info!(user_id = user.id, "User logged in");
    Ok(user)
}
