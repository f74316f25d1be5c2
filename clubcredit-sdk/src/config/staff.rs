//! Staff dashboard configuration.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Staff configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct StaffConfig {
    /// The argon2 hashed staff secret.
    pub secret_hash: String,
}

impl StaffConfig {
    /// Create a new StaffConfig with the given hashed secret.
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Verify a plaintext secret against the stored hash.
    ///
    /// Returns `true` if the secret matches, `false` otherwise.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
