//! Identifier types shared by every API surface.
//!
//! Player and club ids are owned by the external player records and are
//! treated as opaque strings. Everything minted by the credit service is a
//! UUID.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a player, as issued by the player records system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(CompactString);

/// Identifier of a club (one gaming floor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClubId(CompactString);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn new(value: impl Into<CompactString>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(PlayerId);
string_id!(ClubId);

/// Identifier of a credit-limit or credit-feature request.
pub type RequestId = Uuid;

/// Identifier of a disbursement.
pub type DisbursementId = Uuid;

/// Identifier of a waitlist entry.
pub type WaitlistEntryId = Uuid;

/// Identifier of a table on the floor.
pub type TableId = Uuid;
