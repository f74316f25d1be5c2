//! Runtime configuration re-exports.
//!
//! The actual config types are defined in `clubcredit-sdk::config`.

pub use clubcredit_sdk::config::{
    RealtimeConfig, ServerConfig, SessionConfig, SharedConfig, StaffConfig,
};
