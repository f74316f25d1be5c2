//! `GET /realtime`: the WebSocket event channel.
//!
//! A connection starts with no subscriptions. Each subscribe frame adds
//! one or two topics (a club and, optionally, a player) to a set owned by
//! the connection; the set is dropped with the socket, so a reconnecting
//! client has to subscribe again.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use clubcredit_core::events::{Delivery, Subscriptions};
use clubcredit_sdk::objects::{Topic, WsClientMessage, WsCloseCode, WsServerMessage};

use crate::state::AppState;

pub async fn realtime_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let subscriptions = state
        .desk
        .bus
        .subscriptions(state.realtime.max_subscriptions);
    ws.on_upgrade(move |socket| handle_realtime_ws(socket, subscriptions))
}

/// Drives one connection until the client goes away.
async fn handle_realtime_ws(mut socket: WebSocket, mut subscriptions: Subscriptions) {
    tracing::debug!("WS: realtime connection opened");

    loop {
        tokio::select! {
            delivery = subscriptions.next() => {
                let msg = match delivery {
                    Delivery::Event(event) => WsServerMessage::Event(event),
                    Delivery::Lagged { topic, .. } => WsServerMessage::Resync { topic },
                };
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            msg = socket.recv() => {
                let replies = match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WsClientMessage>(text.as_str()) {
                            Ok(msg) => apply_client_message(&mut subscriptions, msg),
                            Err(e) => {
                                tracing::debug!(error = %e, "WS: invalid client frame");
                                vec![WsServerMessage::Error {
                                    code: WsCloseCode::INVALID_MESSAGE,
                                    reason: format!("invalid message: {e}"),
                                }]
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WS: receive failed");
                        break;
                    }
                };
                for reply in &replies {
                    if send_json(&mut socket, reply).await.is_err() {
                        tracing::debug!(topics = subscriptions.len(), "WS: realtime connection closed");
                        return;
                    }
                }
            }
        }
    }

    tracing::debug!(topics = subscriptions.len(), "WS: realtime connection closed");
}

/// Apply one client frame to the connection's subscription set and
/// return the frames to send back.
fn apply_client_message(
    subscriptions: &mut Subscriptions,
    msg: WsClientMessage,
) -> Vec<WsServerMessage> {
    let topics = match msg {
        WsClientMessage::Ping => return vec![WsServerMessage::Pong],
        WsClientMessage::Unsubscribe { topic } => {
            subscriptions.remove(&topic);
            return vec![WsServerMessage::Unsubscribed { topic }];
        }
        WsClientMessage::SubscribeClub { club_id, player_id } => {
            let mut topics = vec![Topic::Club(club_id)];
            topics.extend(player_id.map(Topic::Player));
            topics
        }
        WsClientMessage::SubscribePlayer { player_id, club_id } => {
            let mut topics = vec![Topic::Player(player_id)];
            topics.extend(club_id.map(Topic::Club));
            topics
        }
    };

    topics
        .into_iter()
        .map(|topic| match subscriptions.add(topic.clone()) {
            Ok(_) => WsServerMessage::Subscribed { topic },
            Err(e) => {
                tracing::warn!(%topic, limit = e.limit, "WS: subscription limit reached");
                WsServerMessage::Error {
                    code: WsCloseCode::TOO_MANY_SUBSCRIPTIONS,
                    reason: format!("cannot subscribe to {topic}: {e}"),
                }
            }
        })
        .collect()
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
