//! Credit API request and response types.
//!
//! Shared by the player dashboard (submitting requests, reading balances)
//! and the staff dashboards (deciding requests, managing the ledger and
//! disbursing credit).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{ClubId, DisbursementId, PlayerId, RequestId};

/// Lifecycle status shared by credit-limit requests, credit-feature
/// requests and disbursements.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A staff decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

impl From<DecisionOutcome> for RequestStatus {
    fn from(value: DecisionOutcome) -> Self {
        match value {
            DecisionOutcome::Approved => RequestStatus::Approved,
            DecisionOutcome::Rejected => RequestStatus::Rejected,
        }
    }
}

/// KYC verification state of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

/// Account state of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

/// Direction of a manual ledger adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustDirection {
    Credit,
    Debit,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /player/credit-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCredit {
    pub amount: Decimal,
    /// Limit the player asks for. Defaults to `amount` when omitted.
    #[serde(default)]
    pub requested_limit: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /staff/credit-requests/{id}/decision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideCreditRequest {
    pub outcome: DecisionOutcome,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /staff/credit-feature-requests/{id}/decision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideFeatureRequest {
    pub outcome: DecisionOutcome,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of `PUT /staff/ledger/{player_id}/limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCreditLimit {
    pub limit: Decimal,
}

/// Body of `POST /staff/ledger/{player_id}/adjust`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustBalance {
    pub amount: Decimal,
    pub direction: AdjustDirection,
}

/// Body of `POST /staff/disbursements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDisbursement {
    pub player_id: PlayerId,
    pub amount: Decimal,
    #[serde(default)]
    pub source_request_id: Option<RequestId>,
}

/// Body of `POST /staff/disbursements/{id}/reject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectDisbursement {
    pub reason: String,
}

/// Query string for listing credit requests and disbursements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club_id: Option<ClubId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A credit-limit request as seen by dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLimitRequestResponse {
    pub id: RequestId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub amount: Decimal,
    pub requested_limit: Decimal,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub requested_at: i64,
    pub decided_at: Option<i64>,
    pub decided_by: Option<String>,
    pub decision_notes: Option<String>,
}

/// A first-time credit-feature request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditFeatureRequestResponse {
    pub id: RequestId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub kyc_status: KycStatus,
    pub account_status: AccountStatus,
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub requested_at: i64,
    pub decided_at: Option<i64>,
    pub decided_by: Option<String>,
}

/// A player's ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResponse {
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
    pub available_credit: Decimal,
    pub eligible: bool,
    pub updated_at: i64,
}

/// A disbursement joined with the ledger snapshot taken when it was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementResponse {
    pub id: DisbursementId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub source_request_id: Option<RequestId>,
    pub approved_limit: Decimal,
    pub current_balance_snapshot: Decimal,
    pub requested_amount: Decimal,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub created_at: i64,
    pub decided_at: Option<i64>,
    pub decided_by: Option<String>,
}

/// `getPlayerBalance` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBalance {
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub available_balance: Decimal,
    pub table_balance: Decimal,
    pub total_balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub available_credit: Option<Decimal>,
    pub credit_feature_enabled: bool,
}
