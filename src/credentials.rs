// ABOUTME: Salted one-way password hashing and verification
// ABOUTME: Uses bcrypt with a fresh random salt per hash

use crate::error::DataError;

/// Hash a plaintext password for storage
///
/// Each call draws a new salt, so hashing the same password twice gives
/// different strings that both verify.
pub fn hash_password(password: &str) -> Result<String, DataError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Check a plaintext password against a stored hash
///
/// # Errors
///
/// Returns [`DataError::Credential`] if the stored value is not a bcrypt
/// hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, DataError> {
    Ok(bcrypt::verify(password, stored_hash)?)
}
