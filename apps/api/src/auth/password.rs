//! Argon2 credential hashing. Shared by signup, login and the password reset
//! flow so a credential written by one always verifies through the others.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, instrument};

use crate::errors::AppError;

/// Hashes a plain-text password with a fresh random salt.
#[instrument(name = "password::hash", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Hashing(e.to_string()))
}

/// Returns `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(name = "password::verify", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Hashing(format!("Invalid stored password hash: {e}")))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => {
            debug!("Password mismatch");
            Ok(false)
        }
        Err(e) => Err(AppError::Hashing(e.to_string())),
    }
}

/// Runs `hash_password` on the blocking pool.
pub async fn spawn_hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Hashing(e.to_string()))?
}

/// Runs `verify_password` on the blocking pool.
pub async fn spawn_verify_password(
    stored_hash: String,
    candidate: String,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&stored_hash, &candidate))
        .await
        .map_err(|e| AppError::Hashing(e.to_string()))?
}
