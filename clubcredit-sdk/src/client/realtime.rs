//! Reconnecting client for the `/realtime` WebSocket channel.
//!
//! The server forgets a connection's subscriptions when it drops, so after
//! every (re)connect this client re-sends each topic subscription and waits
//! for the server to acknowledge all of them. Only then does it report
//! `Connected` and ask the consumer to resync, because events published
//! while disconnected are gone. An attempt whose acknowledgements do not
//! arrive within [`ReconnectPolicy::ack_timeout`] counts as a dropped
//! connection. A dropped connection is retried
//! with exponential backoff; only when the retry budget runs out does the
//! consumer see [`ConnectionStatus::Unavailable`].

use std::collections::HashSet;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::objects::{Event, Topic, WsClientMessage, WsServerMessage};
use crate::sync::{ConnectionStatus, RealtimeUpdate};

/// Maximum backoff exponent (2^6 = 64 base delays).
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Errors that end one connection attempt. Always retried.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("connection lost: {0}")]
    ConnectionLost(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("server closed the connection")]
    Closed,
    #[error("subscriptions were not acknowledged in time")]
    SubscribeTimeout,
    #[error("server refused a subscription ({code}): {reason}")]
    Refused { code: u16, reason: String },
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How aggressively to reconnect.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    /// Consecutive failed attempts before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// How long to wait for every subscription to be acknowledged.
    pub ack_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_attempts: Some(10),
            ack_timeout: Duration::from_secs(10),
        }
    }
}

/// Calculate the delay before reconnect attempt `attempt` (1-based).
///
/// Uses exponential backoff: `base * 2^(attempt - 1)`, capped at
/// `base * 2^6`.
pub fn calculate_retry_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    base.saturating_mul(2u32.pow(exponent))
}

enum PumpExit {
    Shutdown,
}

/// A realtime connection that survives drops.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    url: Url,
    topics: Vec<Topic>,
    policy: ReconnectPolicy,
}

impl RealtimeClient {
    /// Create a client for `{base_url}/realtime`, switching the scheme to
    /// `ws`/`wss`.
    pub fn new(base_url: &Url, topics: Vec<Topic>) -> Result<Self, url::ParseError> {
        let mut url = base_url.join("/realtime")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // Only fails for cannot-be-a-base URLs, which `join` already rejected.
        let _ = url.set_scheme(scheme);
        Ok(Self {
            url,
            topics,
            policy: ReconnectPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Spawn the connection task. Updates arrive on the returned receiver
    /// until `shutdown_rx` flips to `true` or the retry budget runs out.
    pub fn spawn(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> (mpsc::Receiver<RealtimeUpdate>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(256);
        let handle = tokio::spawn(self.run(tx, shutdown_rx));
        (rx, handle)
    }

    async fn run(self, tx: mpsc::Sender<RealtimeUpdate>, mut shutdown_rx: watch::Receiver<bool>) {
        info!(url = %self.url, topics = self.topics.len(), "Realtime client started");
        let mut failures: u32 = 0;

        loop {
            let status = if failures == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting { attempt: failures }
            };
            if tx.send(RealtimeUpdate::Status(status)).await.is_err() {
                return;
            }

            match self.connect_and_pump(&tx, &mut shutdown_rx, &mut failures).await {
                Ok(PumpExit::Shutdown) => {
                    info!("Realtime client shutting down");
                    return;
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Realtime connection dropped");
                }
            }

            failures += 1;
            if self
                .policy
                .max_attempts
                .is_some_and(|max| failures > max)
            {
                warn!(attempts = failures, "Realtime retry budget exhausted");
                let _ = tx
                    .send(RealtimeUpdate::Status(ConnectionStatus::Unavailable))
                    .await;
                return;
            }

            let delay = self.jittered(calculate_retry_delay(self.policy.base_delay, failures));
            debug!(attempt = failures, delay_ms = delay.as_millis() as u64, "Reconnecting");
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let spread = (delay.as_millis() as u64 / 4).max(1);
        delay + Duration::from_millis(rand::rng().random_range(0..spread))
    }

    /// One connection lifetime: connect, resubscribe, forward frames.
    async fn connect_and_pump(
        &self,
        tx: &mpsc::Sender<RealtimeUpdate>,
        shutdown_rx: &mut watch::Receiver<bool>,
        failures: &mut u32,
    ) -> Result<PumpExit, RealtimeError> {
        let (socket, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        for topic in &self.topics {
            let frame = serde_json::to_string(&WsClientMessage::subscribe(topic))?;
            sink.send(Message::Text(frame)).await?;
        }
        let early = self.await_acks(&mut stream).await?;
        *failures = 0;
        info!(url = %self.url, "Realtime connected, subscriptions restored");

        if tx
            .send(RealtimeUpdate::Status(ConnectionStatus::Connected))
            .await
            .is_err()
            || tx.send(RealtimeUpdate::Resync { topic: None }).await.is_err()
        {
            return Ok(PumpExit::Shutdown);
        }
        for event in early {
            if tx.send(RealtimeUpdate::Event(event)).await.is_err() {
                return Ok(PumpExit::Shutdown);
            }
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ok(PumpExit::Shutdown);
                    }
                }

                frame = stream.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => return Err(RealtimeError::Closed),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(e.into()),
                    };
                    let update = match serde_json::from_str::<WsServerMessage>(&text) {
                        Ok(WsServerMessage::Event(event)) => RealtimeUpdate::Event(event),
                        Ok(WsServerMessage::Resync { topic }) => RealtimeUpdate::Resync { topic: Some(topic) },
                        Ok(WsServerMessage::Error { code, reason }) => {
                            warn!(code, reason = %reason, "Realtime server error");
                            continue;
                        }
                        Ok(other) => {
                            debug!(message = ?other, "Realtime control frame");
                            continue;
                        }
                        Err(e) => {
                            warn!(error = %e, "Ignoring malformed realtime frame");
                            continue;
                        }
                    };
                    if tx.send(update).await.is_err() {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ok(PumpExit::Shutdown);
                    }
                }
            }
        }
    }

    /// Wait until the server has acknowledged every topic. Events that
    /// arrive in between are handed back so they can follow the resync.
    async fn await_acks<S>(&self, stream: &mut S) -> Result<Vec<Event>, RealtimeError>
    where
        S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        let mut waiting: HashSet<&Topic> = self.topics.iter().collect();
        let mut early = Vec::new();
        let deadline = tokio::time::Instant::now() + self.policy.ack_timeout;

        while !waiting.is_empty() {
            let frame = tokio::time::timeout_at(deadline, stream.next())
                .await
                .map_err(|_| RealtimeError::SubscribeTimeout)?;
            let text = match frame {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) | None => return Err(RealtimeError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            };
            match serde_json::from_str::<WsServerMessage>(&text) {
                Ok(WsServerMessage::Subscribed { topic }) => {
                    waiting.remove(&topic);
                }
                Ok(WsServerMessage::Event(event)) => early.push(event),
                Ok(WsServerMessage::Error { code, reason }) => {
                    return Err(RealtimeError::Refused { code, reason });
                }
                Ok(other) => debug!(message = ?other, "Realtime control frame during subscribe"),
                Err(e) => warn!(error = %e, "Ignoring malformed realtime frame"),
            }
        }
        Ok(early)
    }
}
