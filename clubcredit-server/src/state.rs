//! Application state shared across all request handlers.

use crate::config::file::TableConfig;
use crate::config::runtime::{RealtimeConfig, SharedConfig};
use clubcredit_core::CreditDesk;
use clubcredit_core::directory::StaticDirectory;
use clubcredit_core::events::EventBus;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (staff and session sections reload on SIGHUP).
    pub config: SharedConfig,
    /// Realtime tuning, fixed at startup.
    pub realtime: RealtimeConfig,
    /// Player records, replaced on SIGHUP.
    pub directory: StaticDirectory,
    /// The credit services and the event bus they publish to.
    pub desk: CreditDesk,
}

impl AppState {
    pub fn new(config: SharedConfig, realtime: RealtimeConfig, directory: StaticDirectory) -> Self {
        let bus = EventBus::new(realtime.channel_capacity);
        let desk = CreditDesk::new(Arc::new(directory.clone()), bus);
        Self {
            config,
            realtime,
            directory,
            desk,
        }
    }

    /// Open the configured tables on the floor.
    pub async fn seed_tables(&self, tables: &[TableConfig]) -> anyhow::Result<()> {
        for table in tables {
            self.desk
                .floor
                .add_table(
                    table.club_id.clone(),
                    table.name.clone(),
                    table.game_type.clone(),
                    table.seats,
                )
                .await?;
        }
        tracing::info!(tables = tables.len(), "Floor seeded from configuration");
        Ok(())
    }
}
