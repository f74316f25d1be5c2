#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod desk;
pub mod directory;
pub mod disbursement;
pub mod error;
pub mod events;
pub mod floor;
pub mod ledger;
pub mod requests;

pub use desk::CreditDesk;
pub use error::CreditError;
