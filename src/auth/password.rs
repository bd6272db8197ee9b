//! Password hashing. bcrypt is treated as an opaque one-way function.

/// Hash a plaintext password for storage.
pub fn hash(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
}

/// Verify plaintext against a stored hash. A malformed hash never verifies.
pub fn verify(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
