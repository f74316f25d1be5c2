//! Shared types and clients for Club Credit.
//!
//! - [`objects`]: ids, request/response bodies and the realtime contract.
//! - [`signature`]: player session signing.
//! - [`config`]: validated runtime configuration.
//! - [`sync`]: the per-dashboard [`sync::ClientSyncAdapter`].
//! - `client` (feature `client`): HTTP clients and the reconnecting
//!   realtime client.

#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod objects;
pub mod signature;
pub mod sync;
