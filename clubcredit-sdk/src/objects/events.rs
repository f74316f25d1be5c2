//! The realtime event contract.
//!
//! Events are invalidation signals: they name the entity that changed and
//! its new status or position, and consumers re-fetch the authoritative
//! state instead of applying the payload. Every event carries a per-topic
//! sequence number so duplicates can be dropped.

use serde::{Deserialize, Serialize};

use super::credit::RequestStatus;
use super::floor::{TableStatus, WaitlistEntryStatus};
use super::ids::{ClubId, DisbursementId, PlayerId, RequestId, TableId, WaitlistEntryId};

/// A routing key for event delivery.
///
/// Serialized in its textual form, `club:{id}` or `player:{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    Club(ClubId),
    Player(PlayerId),
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Club(id) => write!(f, "club:{id}"),
            Topic::Player(id) => write!(f, "player:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid topic `{0}`, expected `club:{{id}}` or `player:{{id}}`")]
pub struct ParseTopicError(pub String);

impl std::str::FromStr for Topic {
    type Err = ParseTopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((kind, id)) = s.split_once(':') else {
            return Err(ParseTopicError(s.to_string()));
        };
        if id.is_empty() {
            return Err(ParseTopicError(s.to_string()));
        }
        match kind {
            "club" => Ok(Topic::Club(ClubId::new(id))),
            "player" => Ok(Topic::Player(PlayerId::new(id))),
            _ => Err(ParseTopicError(s.to_string())),
        }
    }
}

impl serde::Serialize for Topic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Topic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The kinds of change notifications the service publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "credit:status-changed")]
    CreditStatusChanged,
    #[serde(rename = "table:status-changed")]
    TableStatusChanged,
    #[serde(rename = "tables:updated")]
    TablesUpdated,
    #[serde(rename = "table:available")]
    TableAvailable,
    #[serde(rename = "waitlist:position-updated")]
    WaitlistPositionUpdated,
    #[serde(rename = "waitlist:status-changed")]
    WaitlistStatusChanged,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::CreditStatusChanged => "credit:status-changed",
            EventType::TableStatusChanged => "table:status-changed",
            EventType::TablesUpdated => "tables:updated",
            EventType::TableAvailable => "table:available",
            EventType::WaitlistPositionUpdated => "waitlist:position-updated",
            EventType::WaitlistStatusChanged => "waitlist:status-changed",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerChange {
    LimitSet,
    Credited,
    Debited,
    Removed,
}

/// Minimal description of the entity an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    CreditRequest {
        request_id: RequestId,
        player_id: PlayerId,
        status: RequestStatus,
    },
    FeatureRequest {
        request_id: RequestId,
        player_id: PlayerId,
        status: RequestStatus,
    },
    Disbursement {
        disbursement_id: DisbursementId,
        player_id: PlayerId,
        status: RequestStatus,
    },
    Ledger {
        player_id: PlayerId,
        change: LedgerChange,
    },
    Table {
        table_id: TableId,
        club_id: ClubId,
        status: TableStatus,
    },
    Tables {
        club_id: ClubId,
    },
    Waitlist {
        entry_id: WaitlistEntryId,
        player_id: PlayerId,
        status: WaitlistEntryStatus,
        position: Option<u32>,
        total_in_queue: u32,
    },
}

impl EventPayload {
    /// The player the change concerns, if any.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            EventPayload::CreditRequest { player_id, .. }
            | EventPayload::FeatureRequest { player_id, .. }
            | EventPayload::Disbursement { player_id, .. }
            | EventPayload::Ledger { player_id, .. }
            | EventPayload::Waitlist { player_id, .. } => Some(player_id),
            EventPayload::Table { .. } | EventPayload::Tables { .. } => None,
        }
    }
}

/// One published notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub topic: Topic,
    /// Strictly increasing within `topic`, starting at 1.
    pub seq: u64,
    pub event: EventType,
    pub payload: EventPayload,
}
