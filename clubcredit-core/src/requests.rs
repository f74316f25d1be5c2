//! Credit-limit and credit-feature requests.
//!
//! Players submit, staff decide. A decision is final: once a request
//! leaves `Pending` it never changes again. Approving a limit request
//! only authorizes a later disbursement and never touches the ledger.

use std::collections::HashMap;
use std::sync::Arc;

use clubcredit_sdk::objects::{
    AccountStatus, ClubId, DecisionOutcome, EventPayload, EventType, KycStatus, ListQuery,
    PlayerId, RequestId, RequestStatus,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::directory::{PlayerDirectory, PlayerProfile};
use crate::error::CreditError;
use crate::events::EventBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditLimitRequest {
    pub id: RequestId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub amount: Decimal,
    pub requested_limit: Decimal,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub requested_at: OffsetDateTime,
    pub decided_at: Option<OffsetDateTime>,
    pub decided_by: Option<String>,
    pub decision_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditFeatureRequest {
    pub id: RequestId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub kyc_status: KycStatus,
    pub account_status: AccountStatus,
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub requested_at: OffsetDateTime,
    pub decided_at: Option<OffsetDateTime>,
    pub decided_by: Option<String>,
}

fn query_matches(query: &ListQuery, club: &ClubId, player: &PlayerId, status: RequestStatus) -> bool {
    query.club_id.as_ref().is_none_or(|c| c == club)
        && query.player_id.as_ref().is_none_or(|p| p == player)
        && query.status.is_none_or(|s| s == status)
}

pub struct RequestRegistry {
    limit_requests: RwLock<HashMap<RequestId, CreditLimitRequest>>,
    feature_requests: RwLock<HashMap<RequestId, CreditFeatureRequest>>,
    directory: Arc<dyn PlayerDirectory>,
    bus: EventBus,
}

impl RequestRegistry {
    pub fn new(directory: Arc<dyn PlayerDirectory>, bus: EventBus) -> Self {
        Self {
            limit_requests: RwLock::new(HashMap::new()),
            feature_requests: RwLock::new(HashMap::new()),
            directory,
            bus,
        }
    }

    async fn profile(&self, player_id: &PlayerId) -> Result<PlayerProfile, CreditError> {
        self.directory
            .profile(player_id)
            .await
            .ok_or_else(|| CreditError::not_found("player", player_id))
    }

    // -- credit-limit requests ---------------------------------------------

    /// Record a player's request for credit.
    ///
    /// `requested_limit` defaults to `amount`.
    pub async fn submit(
        &self,
        player_id: &PlayerId,
        amount: Decimal,
        requested_limit: Option<Decimal>,
        reason: Option<String>,
    ) -> Result<CreditLimitRequest, CreditError> {
        if amount <= Decimal::ZERO {
            return Err(CreditError::validation("requested amount must be positive"));
        }
        let requested_limit = requested_limit.unwrap_or(amount);
        if requested_limit <= Decimal::ZERO {
            return Err(CreditError::validation("requested limit must be positive"));
        }
        let profile = self.profile(player_id).await?;

        let request = CreditLimitRequest {
            id: Uuid::now_v7(),
            player_id: player_id.clone(),
            club_id: profile.club_id,
            amount,
            requested_limit,
            status: RequestStatus::Pending,
            reason: reason.filter(|r| !r.trim().is_empty()),
            requested_at: OffsetDateTime::now_utc(),
            decided_at: None,
            decided_by: None,
            decision_notes: None,
        };
        self.limit_requests
            .write()
            .await
            .insert(request.id, request.clone());

        tracing::info!(request_id = %request.id, %player_id, %amount, "Credit request submitted");
        self.notify_limit(&request);
        Ok(request)
    }

    pub async fn decide(
        &self,
        request_id: RequestId,
        outcome: DecisionOutcome,
        decided_by: &str,
        notes: Option<String>,
    ) -> Result<CreditLimitRequest, CreditError> {
        let mut requests = self.limit_requests.write().await;
        let request = requests
            .get_mut(&request_id)
            .ok_or_else(|| CreditError::not_found("credit request", request_id))?;
        if request.status.is_terminal() {
            tracing::warn!(%request_id, status = ?request.status, "Credit request already decided");
            return Err(CreditError::AlreadyDecided(request_id));
        }
        request.status = outcome.into();
        request.decided_at = Some(OffsetDateTime::now_utc());
        request.decided_by = Some(decided_by.to_string());
        request.decision_notes = notes;
        let decided = request.clone();
        drop(requests);

        tracing::info!(%request_id, status = ?decided.status, decided_by, "Credit request decided");
        self.notify_limit(&decided);
        Ok(decided)
    }

    pub async fn get(&self, request_id: RequestId) -> Option<CreditLimitRequest> {
        self.limit_requests.read().await.get(&request_id).cloned()
    }

    /// Matching limit requests, newest first.
    pub async fn list(&self, query: &ListQuery) -> Vec<CreditLimitRequest> {
        let mut out: Vec<_> = self
            .limit_requests
            .read()
            .await
            .values()
            .filter(|r| query_matches(query, &r.club_id, &r.player_id, r.status))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        out
    }

    fn notify_limit(&self, request: &CreditLimitRequest) {
        self.bus.publish_player_change(
            &request.player_id,
            &request.club_id,
            EventType::CreditStatusChanged,
            EventPayload::CreditRequest {
                request_id: request.id,
                player_id: request.player_id.clone(),
                status: request.status,
            },
        );
    }

    // -- credit-feature requests -------------------------------------------

    /// Ask for first-time credit access.
    ///
    /// Snapshots the player's KYC and account state at submission time.
    pub async fn submit_feature(
        &self,
        player_id: &PlayerId,
    ) -> Result<CreditFeatureRequest, CreditError> {
        let profile = self.profile(player_id).await?;

        let mut requests = self.feature_requests.write().await;
        for existing in requests.values().filter(|r| r.player_id == *player_id) {
            match existing.status {
                RequestStatus::Pending => {
                    return Err(CreditError::validation(
                        "a credit feature request is already pending",
                    ));
                }
                RequestStatus::Approved => {
                    return Err(CreditError::validation("credit feature is already enabled"));
                }
                RequestStatus::Rejected => {}
            }
        }
        let request = CreditFeatureRequest {
            id: Uuid::now_v7(),
            player_id: player_id.clone(),
            club_id: profile.club_id,
            kyc_status: profile.kyc_status,
            account_status: profile.account_status,
            status: RequestStatus::Pending,
            rejection_reason: None,
            requested_at: OffsetDateTime::now_utc(),
            decided_at: None,
            decided_by: None,
        };
        requests.insert(request.id, request.clone());
        drop(requests);

        tracing::info!(request_id = %request.id, %player_id, "Credit feature requested");
        self.notify_feature(&request);
        Ok(request)
    }

    /// Decide a feature request.
    ///
    /// Approval re-reads the player's profile and fails with `Ineligible`
    /// unless KYC is approved and the account is active. The request then
    /// stays pending.
    pub async fn decide_feature(
        &self,
        request_id: RequestId,
        outcome: DecisionOutcome,
        decided_by: &str,
        rejection_reason: Option<String>,
    ) -> Result<CreditFeatureRequest, CreditError> {
        let player_id = self
            .feature_requests
            .read()
            .await
            .get(&request_id)
            .map(|r| r.player_id.clone())
            .ok_or_else(|| CreditError::not_found("credit feature request", request_id))?;
        let profile = match outcome {
            DecisionOutcome::Approved => Some(self.profile(&player_id).await?),
            DecisionOutcome::Rejected => None,
        };

        let mut requests = self.feature_requests.write().await;
        let request = requests
            .get_mut(&request_id)
            .ok_or_else(|| CreditError::not_found("credit feature request", request_id))?;
        if request.status.is_terminal() {
            return Err(CreditError::AlreadyDecided(request_id));
        }
        if let Some(profile) = &profile {
            if let Some(reason) = profile.ineligibility() {
                tracing::warn!(%request_id, %player_id, reason, "Credit feature approval refused");
                return Err(CreditError::Ineligible { player_id, reason });
            }
            request.kyc_status = profile.kyc_status;
            request.account_status = profile.account_status;
        }
        request.status = outcome.into();
        request.rejection_reason = match outcome {
            DecisionOutcome::Rejected => rejection_reason,
            DecisionOutcome::Approved => None,
        };
        request.decided_at = Some(OffsetDateTime::now_utc());
        request.decided_by = Some(decided_by.to_string());
        let decided = request.clone();
        drop(requests);

        tracing::info!(%request_id, status = ?decided.status, decided_by, "Credit feature request decided");
        self.notify_feature(&decided);
        Ok(decided)
    }

    pub async fn get_feature(&self, request_id: RequestId) -> Option<CreditFeatureRequest> {
        self.feature_requests.read().await.get(&request_id).cloned()
    }

    pub async fn list_feature(&self, query: &ListQuery) -> Vec<CreditFeatureRequest> {
        let mut out: Vec<_> = self
            .feature_requests
            .read()
            .await
            .values()
            .filter(|r| query_matches(query, &r.club_id, &r.player_id, r.status))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        out
    }

    /// Whether the player holds an approved feature request.
    pub async fn is_feature_enabled(&self, player_id: &PlayerId) -> bool {
        self.feature_requests
            .read()
            .await
            .values()
            .any(|r| r.player_id == *player_id && r.status == RequestStatus::Approved)
    }

    fn notify_feature(&self, request: &CreditFeatureRequest) {
        self.bus.publish_player_change(
            &request.player_id,
            &request.club_id,
            EventType::CreditStatusChanged,
            EventPayload::FeatureRequest {
                request_id: request.id,
                player_id: request.player_id.clone(),
                status: request.status,
            },
        );
    }
}
