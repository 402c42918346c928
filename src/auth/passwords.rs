use anyhow::{Context, Result};

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 10;

/// Hashes on the blocking pool so request workers are not stalled.
pub async fn hash_password(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, BCRYPT_COST))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

/// Returns `false` for a mismatch or for a stored value that is not a bcrypt
/// hash (e.g. the disabled `sistema` account).
pub async fn verify_password(plain: String, hashed: String) -> Result<bool> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed))
        .await
        .context("Password verification task failed")?;

    match outcome {
        Ok(valid) => Ok(valid),
        Err(bcrypt::BcryptError::InvalidHash(_) | bcrypt::BcryptError::InvalidPrefix(_)) => {
            Ok(false)
        }
        Err(err) => Err(err).context("Failed to verify password"),
    }
}
