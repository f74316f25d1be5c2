//! Topic-routed event fan-out.
//!
//! Services publish change notifications to `club:{id}` and
//! `player:{id}` topics. Each topic has its own broadcast channel and its
//! own sequence counter, so delivery within a topic follows publish order
//! and consumers can drop duplicates by `seq`.
//!
//! Events carry identifiers and the new status only. Consumers re-fetch
//! the authoritative state rather than applying payloads.

pub mod bus;
pub mod subscriptions;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use subscriptions::{Delivery, SubscriptionLimitReached, Subscriptions};
