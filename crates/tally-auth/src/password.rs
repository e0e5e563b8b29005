//! Password hashing using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::AuthError;

/// Credential hasher with a configurable work factor.
///
/// The work factor (the Argon2 time cost) is read once from configuration
/// at construction; memory and parallelism stay at the library defaults.
/// Verification is constant-time within the argon2 primitive.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with the given time cost (iterations)
    pub fn new(time_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            time_cost.max(1),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AuthError::Infrastructure(format!("invalid hash parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a raw password; failure here is fatal and propagated
    pub fn hash(&self, raw: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| AuthError::Infrastructure(format!("password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a raw password against a stored hash.
    ///
    /// Returns `false` on mismatch; errs only when the stored hash itself
    /// is malformed.
    pub fn verify(&self, raw: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Infrastructure(format!("malformed password hash: {}", e)))?;
        Ok(self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(1).unwrap();
        let password = "my-secure-password-123!";
        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash).unwrap());
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_different_hashes() {
        let hasher = PasswordHasher::new(1).unwrap();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();

        // Different salts, same verification outcome
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same-password", &hash1).unwrap());
        assert!(hasher.verify("same-password", &hash2).unwrap());
    }

    #[test]
    fn test_hash_format() {
        let hasher = PasswordHasher::new(1).unwrap();
        let hash = hasher.hash("test").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_hash_is_an_error_not_a_mismatch() {
        let hasher = PasswordHasher::new(1).unwrap();
        let result = hasher.verify("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Infrastructure(_))));
    }
}
