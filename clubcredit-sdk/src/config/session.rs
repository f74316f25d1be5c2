//! Player session configuration.

/// Secret used to sign and verify player session headers.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    secret: Box<[u8]>,
}

impl SessionConfig {
    pub fn new(secret: impl Into<Box<[u8]>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Get the secret key bytes for HMAC signing.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}
