//! Argon2id password hashing. Work runs on the blocking pool.

use crate::error::IdentityError;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

const SALT_LEN: usize = 16;

pub(crate) async fn hash(password: String) -> Result<String, IdentityError> {
    run_blocking(move || hash_blocking(&password)).await?
}

/// Returns `false` for a wrong password or an unparsable stored hash.
pub(crate) async fn verify(password: String, stored: String) -> Result<bool, IdentityError> {
    run_blocking(move || {
        PasswordHash::new(&stored)
            .is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
}

/// Spends the same effort as a real verification so unknown emails are not observable by timing.
pub(crate) async fn burn(password: String) -> Result<(), IdentityError> {
    hash(password).await.map(drop)
}

fn hash_blocking(password: &str) -> Result<String, IdentityError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::fill(&mut salt).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Generating password salt".into()),
    })?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Encoding password salt".into()),
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Internal {
            message: e.to_string().into(),
            context: Some("Hashing password".into()),
        })
}

async fn run_blocking<T, F>(work: F) -> Result<T, IdentityError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Password worker".into()),
    })
}
