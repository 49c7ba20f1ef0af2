use pwhash::bcrypt;

use crate::error::ApiError;

/// Hashes a password with a freshly generated salt. Output differs between
/// calls for the same input.
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    bcrypt::hash(plain).map_err(|_| ApiError::Hash)
}
