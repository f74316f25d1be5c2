//! The per-topic broadcast bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clubcredit_sdk::objects::{ClubId, Event, EventPayload, EventType, PlayerId, Topic};
use tokio::sync::broadcast;

use super::subscriptions::Subscriptions;

/// Default per-topic buffer.
///
/// A subscriber that falls further behind than this is told it lagged
/// and must resync.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

struct EventBusInner {
    capacity: usize,
    topics: Mutex<TopicTable>,
}

/// Channels exist only while a receiver holds them. Sequence numbers are
/// kept for every topic that has been published to, so a topic's `seq`
/// keeps rising across subscriber churn.
#[derive(Default)]
struct TopicTable {
    channels: HashMap<Topic, broadcast::Sender<Event>>,
    last_seq: HashMap<Topic, u64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                capacity: capacity.max(1),
                topics: Mutex::new(TopicTable::default()),
            }),
        }
    }

    fn table(&self) -> MutexGuard<'_, TopicTable> {
        self.inner
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Assign the next sequence number of `topic` and broadcast.
    ///
    /// Sequencing and sending happen under the same lock, so subscribers
    /// see a topic's events in strictly increasing `seq` order.
    pub fn publish(&self, topic: Topic, event: EventType, payload: EventPayload) -> Event {
        let mut table = self.table();
        let last = table.last_seq.entry(topic.clone()).or_insert(0);
        *last += 1;
        let seq = *last;
        let event = Event {
            topic,
            seq,
            event,
            payload,
        };
        // No channel or no receivers is not an error: nobody is watching.
        let delivered = table
            .channels
            .get(&event.topic)
            .map_or(0, |sender| sender.send(event.clone()).unwrap_or(0));
        tracing::debug!(
            topic = %event.topic,
            seq = event.seq,
            event = %event.event,
            delivered,
            "Event published"
        );
        event
    }

    /// Publish the same change to the player's own topic and to the club
    /// topic watched by staff dashboards.
    pub fn publish_player_change(
        &self,
        player_id: &PlayerId,
        club_id: &ClubId,
        event: EventType,
        payload: EventPayload,
    ) {
        self.publish(Topic::Player(player_id.clone()), event, payload.clone());
        self.publish(Topic::Club(club_id.clone()), event, payload);
    }

    pub fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<Event> {
        let capacity = self.inner.capacity;
        self.table()
            .channels
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    /// Drop the channel of `topic` once its last receiver is gone.
    pub(super) fn release(&self, topic: &Topic) {
        let mut table = self.table();
        if table
            .channels
            .get(topic)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            table.channels.remove(topic);
        }
    }

    /// A connection-scoped subscription set holding at most `limit` topics.
    pub fn subscriptions(&self, limit: usize) -> Subscriptions {
        Subscriptions::new(self.clone(), limit)
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.table()
            .channels
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of topics that currently have a live channel.
    pub fn open_channels(&self) -> usize {
        self.table().channels.len()
    }

    /// Sequence number of the most recent event on `topic`, 0 if none.
    pub fn last_seq(&self, topic: &Topic) -> u64 {
        self.table().last_seq.get(topic).copied().unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
