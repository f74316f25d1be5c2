//! Configuration types for Club Credit.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod server;
mod session;
mod staff;

pub use server::{RealtimeConfig, ServerConfig};
pub use session::SessionConfig;
pub use staff::StaffConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address, etc.).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Staff authentication.
    pub staff: Arc<RwLock<StaffConfig>>,
    /// Player session signing.
    pub session: Arc<RwLock<SessionConfig>>,
}

impl SharedConfig {
    /// Create a new SharedConfig from individual configuration parts.
    pub fn new(server: ServerConfig, staff: StaffConfig, session: SessionConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            staff: Arc::new(RwLock::new(staff)),
            session: Arc::new(RwLock::new(session)),
        }
    }

    /// Get a read lock on the staff configuration.
    pub async fn staff(&self) -> tokio::sync::RwLockReadGuard<'_, StaffConfig> {
        self.staff.read().await
    }

    /// Get a read lock on the session configuration.
    pub async fn session(&self) -> tokio::sync::RwLockReadGuard<'_, SessionConfig> {
        self.session.read().await
    }

    /// Replace the sections that may change on reload.
    ///
    /// The listen address is only read at startup.
    pub async fn update_reloadable(&self, staff: StaffConfig, session: SessionConfig) {
        // Update in sequence to avoid potential deadlocks
        *self.staff.write().await = staff;
        *self.session.write().await = session;
    }
}
