use argon2::{
    Argon2,
    password_hash::{PasswordHasher, PasswordVerifier, phc::PasswordHash},
};

use crate::error::{AppError, AppResult};

fn internal(context: &str, error: impl std::fmt::Display) -> AppError {
    AppError::Internal {
        source: anyhow::anyhow!("{context}: {error}"),
    }
}

/// Hash a password using Argon2id with a random salt
///
/// # Arguments
/// * `password` - The plain text password to hash
///
/// # Returns
/// * `AppResult<String>` - The PHC-formatted hash
pub fn hash_password(password: &str) -> AppResult<String> {
    let hash = Argon2::default()
        .hash_password(password.as_bytes())
        .map_err(|e| internal("hash password", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash
///
/// # Returns
/// * `AppResult<bool>` - Whether the password matches. A hash that cannot be
///   parsed is an error, not a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| internal("parse password hash", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
