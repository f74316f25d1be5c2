//! Configuration module for clubcredit-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles staff secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::{ClubConfig, FileConfig, PlayerConfig, TableConfig};
use crate::config::runtime::{
    RealtimeConfig, ServerConfig, SessionConfig, SharedConfig, StaffConfig,
};
use clubcredit_core::directory::PlayerProfile;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub staff: StaffConfig,
    pub session: SessionConfig,
    pub realtime: RealtimeConfig,
    pub clubs: Vec<ClubConfig>,
    pub players: Vec<PlayerProfile>,
    pub tables: Vec<TableConfig>,
}

impl LoadedConfig {
    /// Split off the sections that live behind `Arc<RwLock<T>>`.
    pub fn shared(&self) -> SharedConfig {
        SharedConfig::new(
            self.server.clone(),
            self.staff.clone(),
            self.session.clone(),
        )
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the staff secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        validate(&file_config)?;

        let secret_hash = if file_config.is_staff_secret_hashed() {
            file_config.staff.secret.clone()
        } else {
            let hash = hash_secret(&file_config.staff.secret)?;
            file_config.staff.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Staff secret hashed and config file updated");
            hash
        };

        // The override is applied after the rewrite so it never lands in
        // the file.
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.session.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "session secret must not be empty".into(),
        ));
    }
    if config.realtime.channel_capacity == 0 || config.realtime.max_subscriptions == 0 {
        return Err(ConfigError::ValidationError(
            "realtime channel_capacity and max_subscriptions must be positive".into(),
        ));
    }

    let mut clubs = HashSet::new();
    for club in &config.clubs {
        if !clubs.insert(&club.id) {
            return Err(ConfigError::ValidationError(format!(
                "club {} is configured twice",
                club.id
            )));
        }
    }

    let mut players = HashSet::new();
    for player in &config.players {
        if !players.insert(&player.id) {
            return Err(ConfigError::ValidationError(format!(
                "player {} is configured twice",
                player.id
            )));
        }
        if !clubs.contains(&player.club_id) {
            return Err(ConfigError::ValidationError(format!(
                "player {} references unknown club {}",
                player.id, player.club_id
            )));
        }
    }

    for table in &config.tables {
        if table.seats == 0 {
            return Err(ConfigError::ValidationError(format!(
                "table {} has no seats",
                table.name
            )));
        }
        if !clubs.contains(&table.club_id) {
            return Err(ConfigError::ValidationError(format!(
                "table {} references unknown club {}",
                table.name, table.club_id
            )));
        }
    }
    Ok(())
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        staff: StaffConfig::new(secret_hash),
        session: SessionConfig::new(file_config.session.secret.into_bytes()),
        realtime: RealtimeConfig {
            channel_capacity: file_config.realtime.channel_capacity,
            max_subscriptions: file_config.realtime.max_subscriptions,
        },
        clubs: file_config.clubs,
        players: file_config.players.into_iter().map(convert_player).collect(),
        tables: file_config.tables,
    }
}

fn convert_player(p: PlayerConfig) -> PlayerProfile {
    PlayerProfile {
        player_id: p.id,
        club_id: p.club_id,
        display_name: p.display_name,
        kyc_status: p.kyc_status,
        account_status: p.account_status,
    }
}
