//! The credit service error taxonomy.
//!
//! Every ledger, registry and disbursement operation returns these
//! synchronously, and a failed operation leaves all state unchanged.

use clubcredit_sdk::objects::{DisbursementId, PlayerId, RequestId};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    /// Bad input, e.g. a non-positive limit or amount.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The request is no longer pending.
    #[error("request {0} has already been decided")]
    AlreadyDecided(RequestId),

    /// The disbursement is no longer pending.
    #[error("disbursement {0} has already been processed")]
    AlreadyProcessed(DisbursementId),

    /// The disbursement exceeds the player's available credit.
    #[error("insufficient credit: requested {requested}, available {available}")]
    InsufficientCredit {
        requested: Decimal,
        available: Decimal,
    },

    /// A manual credit would push the balance above the limit.
    #[error("credit limit exceeded: balance {balance} + {delta} > limit {limit}")]
    CreditLimitExceeded {
        limit: Decimal,
        balance: Decimal,
        delta: Decimal,
    },

    /// Credit-feature approval attempted for a player whose KYC is not
    /// approved or whose account is not active.
    #[error("player {player_id} is ineligible for credit: {reason}")]
    Ineligible { player_id: PlayerId, reason: String },

    /// The player has no active ledger entry.
    #[error("player {0} is not credit-eligible")]
    NotEligible(PlayerId),
}

impl CreditError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        CreditError::Validation(message.into())
    }

    pub(crate) fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        CreditError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
