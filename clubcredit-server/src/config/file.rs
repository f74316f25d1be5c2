//! TOML file configuration structures.
//!
//! These structs directly map to the `clubcredit.toml` file format.

use clubcredit_sdk::objects::{AccountStatus, ClubId, KycStatus, PlayerId};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub staff: StaffConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub clubs: Vec<ClubConfig>,
    #[serde(default)]
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Staff dashboard authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffConfig {
    /// The staff secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Player session signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC key shared with the player-facing frontend.
    pub secret: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions: usize,
}

fn default_channel_capacity() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    16
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            max_subscriptions: default_max_subscriptions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubConfig {
    pub id: ClubId,
    pub name: String,
}

/// One player record of the directory seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub id: PlayerId,
    pub club_id: ClubId,
    pub display_name: String,
    #[serde(default = "default_kyc_status")]
    pub kyc_status: KycStatus,
    #[serde(default = "default_account_status")]
    pub account_status: AccountStatus,
}

fn default_kyc_status() -> KycStatus {
    KycStatus::Pending
}

fn default_account_status() -> AccountStatus {
    AccountStatus::Active
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub club_id: ClubId,
    pub name: String,
    pub game_type: String,
    pub seats: u32,
}

impl FileConfig {
    /// Check if the staff secret is already hashed (argon2 format).
    pub fn is_staff_secret_hashed(&self) -> bool {
        self.staff.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[staff]
secret = "test-secret"

[session]
secret = "session-secret"

[[clubs]]
id = "riverside"
name = "Riverside Card Room"

[[players]]
id = "p-1"
club_id = "riverside"
display_name = "Ada"
kyc_status = "approved"

[[tables]]
club_id = "riverside"
name = "Table 1"
game_type = "holdem"
seats = 9
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.clubs[0].id, ClubId::new("riverside"));
        assert_eq!(config.players[0].kyc_status, KycStatus::Approved);
        assert_eq!(config.players[0].account_status, AccountStatus::Active);
        assert_eq!(config.tables[0].seats, 9);
        assert_eq!(config.realtime.channel_capacity, 256);
        assert!(!config.is_staff_secret_hashed());
    }

    #[test]
    fn test_hashed_secret_detection() {
        let config = FileConfig {
            server: ServerConfig {
                listen: default_listen_addr(),
            },
            staff: StaffConfig {
                secret: "$argon2id$v=19$m=19456,t=2,p=1$abc123".to_string(),
            },
            session: SessionConfig {
                secret: "session-secret".to_string(),
            },
            realtime: RealtimeConfig::default(),
            clubs: vec![],
            players: vec![],
            tables: vec![],
        };
        assert!(config.is_staff_secret_hashed());
    }
}
