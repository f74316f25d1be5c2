//! Connection-scoped subscription sets.
//!
//! A [`Subscriptions`] lives exactly as long as the connection that owns
//! it. Dropping it drops every underlying receiver, so the bus keeps no
//! trace of a disconnected client and a reconnecting client must
//! subscribe again.

use clubcredit_sdk::objects::{Event, Topic};
use thiserror::Error;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{StreamExt, StreamMap};

use super::bus::EventBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Event(Event),
    /// The subscriber fell behind and `skipped` events on `topic` were
    /// dropped. The consumer must re-fetch that topic's resources.
    Lagged { topic: Topic, skipped: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("subscription limit of {limit} topics reached")]
pub struct SubscriptionLimitReached {
    pub limit: usize,
}

pub struct Subscriptions {
    bus: EventBus,
    streams: StreamMap<Topic, BroadcastStream<Event>>,
    limit: usize,
}

impl Subscriptions {
    pub(super) fn new(bus: EventBus, limit: usize) -> Self {
        Self {
            bus,
            streams: StreamMap::new(),
            limit,
        }
    }

    /// Subscribe to `topic`. Returns `false` if it was already subscribed.
    pub fn add(&mut self, topic: Topic) -> Result<bool, SubscriptionLimitReached> {
        if self.streams.contains_key(&topic) {
            return Ok(false);
        }
        if self.streams.len() >= self.limit {
            return Err(SubscriptionLimitReached { limit: self.limit });
        }
        let receiver = self.bus.subscribe(&topic);
        self.streams.insert(topic, BroadcastStream::new(receiver));
        Ok(true)
    }

    /// Unsubscribe from `topic`. Returns `false` if it was not subscribed.
    pub fn remove(&mut self, topic: &Topic) -> bool {
        let removed = self.streams.remove(topic).is_some();
        if removed {
            self.bus.release(topic);
        }
        removed
    }

    pub fn contains(&self, topic: &Topic) -> bool {
        self.streams.contains_key(topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.streams.keys()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Wait for the next delivery on any subscribed topic.
    ///
    /// Pends forever while the set is empty. Cancel safe.
    pub async fn next(&mut self) -> Delivery {
        loop {
            if self.streams.is_empty() {
                std::future::pending::<()>().await;
            }
            match self.streams.next().await {
                Some((_, Ok(event))) => return Delivery::Event(event),
                Some((topic, Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    tracing::warn!(%topic, skipped, "Subscriber lagged behind topic");
                    return Delivery::Lagged { topic, skipped };
                }
                None => continue,
            }
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        // Receivers must be gone before the bus can release their channels.
        let streams = std::mem::replace(&mut self.streams, StreamMap::new());
        let topics: Vec<Topic> = streams.keys().cloned().collect();
        drop(streams);
        for topic in &topics {
            self.bus.release(topic);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clubcredit_sdk::objects::{ClubId, EventPayload, EventType, PlayerId};

    use super::*;

    fn club() -> Topic {
        Topic::Club(ClubId::new("riverside"))
    }

    fn publish_tables(bus: &EventBus) -> Event {
        bus.publish(
            club(),
            EventType::TablesUpdated,
            EventPayload::Tables {
                club_id: ClubId::new("riverside"),
            },
        )
    }

    #[tokio::test]
    async fn test_delivers_events_from_subscribed_topics() {
        let bus = EventBus::default();
        let mut subs = bus.subscriptions(4);
        assert_eq!(subs.add(club()), Ok(true));
        assert_eq!(subs.add(club()), Ok(false));

        let published = publish_tables(&bus);
        assert_eq!(subs.next().await, Delivery::Event(published));
    }

    #[tokio::test]
    async fn test_enforces_limit() {
        let bus = EventBus::default();
        let mut subs = bus.subscriptions(1);
        subs.add(club()).unwrap();
        assert_eq!(
            subs.add(Topic::Player(PlayerId::new("p-1"))),
            Err(SubscriptionLimitReached { limit: 1 })
        );
    }

    #[tokio::test]
    async fn test_dropping_the_set_releases_receivers() {
        let bus = EventBus::default();
        let mut subs = bus.subscriptions(4);
        subs.add(club()).unwrap();
        assert_eq!(bus.subscriber_count(&club()), 1);

        drop(subs);
        assert_eq!(bus.subscriber_count(&club()), 0);
    }

    #[tokio::test]
    async fn test_fresh_connection_without_subscribe_receives_nothing() {
        let bus = EventBus::default();
        let mut first = bus.subscriptions(4);
        first.add(club()).unwrap();
        drop(first);

        let mut reconnected = bus.subscriptions(4);
        publish_tables(&bus);
        let waited = tokio::time::timeout(Duration::from_millis(50), reconnected.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::default();
        let mut subs = bus.subscriptions(4);
        subs.add(club()).unwrap();
        assert!(subs.remove(&club()));
        assert!(!subs.remove(&club()));

        publish_tables(&bus);
        let waited = tokio::time::timeout(Duration::from_millis(50), subs.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_told_it_lagged() {
        let bus = EventBus::new(2);
        let mut subs = bus.subscriptions(4);
        subs.add(club()).unwrap();

        for _ in 0..5 {
            publish_tables(&bus);
        }

        assert_eq!(
            subs.next().await,
            Delivery::Lagged {
                topic: club(),
                skipped: 3
            }
        );
        match subs.next().await {
            Delivery::Event(event) => assert_eq!(event.seq, 4),
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_abandoned_topics_leave_no_channels() {
        let bus = EventBus::default();
        let mut subs = bus.subscriptions(4);
        for i in 0..1_000 {
            let topic = Topic::Club(ClubId::new(format!("junk-{i}")));
            subs.add(topic.clone()).unwrap();
            assert!(subs.remove(&topic));
        }
        assert_eq!(bus.open_channels(), 0);

        subs.add(club()).unwrap();
        let mut other = bus.subscriptions(4);
        other.add(club()).unwrap();
        drop(subs);
        // Still held by the other connection.
        assert_eq!(bus.open_channels(), 1);
        drop(other);
        assert_eq!(bus.open_channels(), 0);
    }
}
