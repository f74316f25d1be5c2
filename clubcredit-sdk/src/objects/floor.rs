//! Table and waitlist types.
//!
//! The floor is a collaborator of the credit service: dashboards read the
//! table list and the player's queue position, and the realtime channel
//! signals when either changes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{ClubId, PlayerId, TableId, WaitlistEntryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Open,
    Full,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistEntryStatus {
    Waiting,
    Seated,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub id: TableId,
    pub club_id: ClubId,
    pub name: String,
    pub game_type: String,
    pub seats: u32,
    pub occupied: u32,
    pub status: TableStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntryResponse {
    pub id: WaitlistEntryId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub table_type: Option<String>,
    pub party_size: u32,
    pub status: WaitlistEntryStatus,
    pub joined_at: i64,
}

/// `getWaitlistStatus` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistStatusResponse {
    pub on_waitlist: bool,
    /// 1-based queue position, `None` when not waiting.
    pub position: Option<u32>,
    pub total_in_queue: u32,
    pub entry: Option<WaitlistEntryResponse>,
}

/// Body of `POST /player/waitlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitlist {
    #[serde(default)]
    pub table_type: Option<String>,
    pub party_size: u32,
}

/// `joinWaitlist` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistJoined {
    pub position: u32,
    pub total_in_queue: u32,
    pub entry: WaitlistEntryResponse,
}

/// Body of `PUT /staff/tables/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTableStatus {
    pub status: TableStatus,
}

/// Body of `POST /staff/tables/{id}/seat-next`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatNext {
    #[serde(default)]
    pub buy_in: Option<Decimal>,
}

/// Result of seating the head of the waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatedResponse {
    pub table: TableResponse,
    pub entry: WaitlistEntryResponse,
}

/// Query string of `GET /staff/tables`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club_id: Option<ClubId>,
}
