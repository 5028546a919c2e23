//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::{AuthError, AuthResult};

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Returns false for a wrong password; errors only on a malformed hash.
    pub fn verify(password: &str, hash: &str) -> AuthResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(PasswordService::verify("password123", &hash).unwrap());
        assert!(!PasswordService::verify("password124", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(PasswordService::verify("password123", "not-a-hash").is_err());
    }
}
