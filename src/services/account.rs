//! Email + password account service.
//!
//! DESIGN
//! ======
//! The identity collaborator's credential half: accounts are keyed by a
//! normalized email and store a salted sha256 password hash in the form
//! `salt$hash`. Signup derives a display name from the email local part.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::session::bytes_to_hex;

const MIN_PASSWORD_LEN: usize = 8;
const SALT_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

fn name_from_email(email: &str) -> String {
    let local = email
        .split('@')
        .next()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("user");
    local.to_owned()
}

#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; SALT_LEN] = rand::rng().random();
    bytes_to_hex(&bytes)
}

#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// Create an account, returning the new user's id.
///
/// # Errors
///
/// Returns `InvalidEmail`/`WeakPassword` on rejected input, `EmailTaken` if
/// the email is already registered, or a database error.
pub async fn create_account(pool: &PgPool, email: &str, password: &str) -> Result<Uuid, AccountError> {
    let normalized = normalize_email(email).ok_or(AccountError::InvalidEmail)?;
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AccountError::WeakPassword);
    }

    let salt = generate_salt();
    let hash = hash_password(&salt, password);
    let name = name_from_email(&normalized);

    let row = sqlx::query(
        r"INSERT INTO users (email, name, password_salt, password_hash)
          VALUES ($1, $2, $3, $4)
          ON CONFLICT (email) DO NOTHING
          RETURNING id",
    )
    .bind(&normalized)
    .bind(name)
    .bind(salt)
    .bind(hash)
    .fetch_optional(pool)
    .await?;

    row.map(|r| r.get("id")).ok_or(AccountError::EmailTaken)
}

/// Verify credentials, returning the user's id on success.
///
/// # Errors
///
/// Returns `InvalidCredentials` on unknown email or password mismatch — the
/// two cases are deliberately indistinguishable to the caller.
pub async fn verify_credentials(pool: &PgPool, email: &str, password: &str) -> Result<Uuid, AccountError> {
    let normalized = normalize_email(email).ok_or(AccountError::InvalidCredentials)?;

    let row = sqlx::query("SELECT id, password_salt, password_hash FROM users WHERE email = $1")
        .bind(&normalized)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Err(AccountError::InvalidCredentials);
    };

    let salt: String = row.get("password_salt");
    let expected: String = row.get("password_hash");
    if hash_password(&salt, password) != expected {
        return Err(AccountError::InvalidCredentials);
    }
    Ok(row.get("id"))
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
