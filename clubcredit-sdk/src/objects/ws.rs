//! WebSocket message types for the `/realtime` channel.
//!
//! # Protocol
//!
//! 1. After connecting, the client sends one or more subscribe frames.
//!    Subscriptions are additive and live exactly as long as the
//!    connection; a reconnecting client must send them again.
//! 2. The server acknowledges each with [`WsServerMessage::Subscribed`].
//! 3. Every event published on a subscribed topic is forwarded as
//!    [`WsServerMessage::Event`], in publish order within the topic.
//! 4. If the server had to drop events for a slow connection it sends
//!    [`WsServerMessage::Resync`] and the client re-fetches everything
//!    under that topic.

use serde::{Deserialize, Serialize};

use super::events::{Event, Topic};
use super::ids::{ClubId, PlayerId};

/// Client-to-server WebSocket message.
///
/// ```json
/// {"type":"subscribe:club","clubId":"riverside","playerId":"p-1"}
/// {"type":"subscribe:player","playerId":"p-1","clubId":"riverside"}
/// {"type":"unsubscribe","topic":"club:riverside"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsClientMessage {
    #[serde(rename = "subscribe:club", rename_all = "camelCase")]
    SubscribeClub {
        club_id: ClubId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<PlayerId>,
    },
    #[serde(rename = "subscribe:player", rename_all = "camelCase")]
    SubscribePlayer {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        club_id: Option<ClubId>,
    },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { topic: Topic },
    #[serde(rename = "ping")]
    Ping,
}

impl WsClientMessage {
    /// Build the subscribe frame for `topic`.
    pub fn subscribe(topic: &Topic) -> Self {
        match topic {
            Topic::Club(club_id) => WsClientMessage::SubscribeClub {
                club_id: club_id.clone(),
                player_id: None,
            },
            Topic::Player(player_id) => WsClientMessage::SubscribePlayer {
                player_id: player_id.clone(),
                club_id: None,
            },
        }
    }
}

/// Server-to-client WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    Subscribed { topic: Topic },
    Unsubscribed { topic: Topic },
    /// A published event, fields flattened next to `type`.
    Event(Event),
    /// Events on `topic` were dropped; re-fetch instead of waiting.
    Resync { topic: Topic },
    Error { code: u16, reason: String },
    Pong,
}

/// Well-known WebSocket close and error codes used by `/realtime`.
pub struct WsCloseCode;

impl WsCloseCode {
    pub const NORMAL: u16 = 1000;

    pub const INTERNAL_ERROR: u16 = 1011;

    /// The client sent a frame that is not a [`WsClientMessage`].
    pub const INVALID_MESSAGE: u16 = 4000;

    /// The connection exceeded its subscription limit.
    pub const TOO_MANY_SUBSCRIPTIONS: u16 = 4029;
}
