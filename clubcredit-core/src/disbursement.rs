//! Disbursement processing.
//!
//! A disbursement moves approved credit into a player's balance. It is
//! opened with a snapshot of the ledger for the cashier's benefit, but
//! approval always re-checks the live entry while holding the
//! disbursement lock and then the player's ledger lock. The lock order
//! never varies, so concurrent approvals serialize per player instead of
//! deadlocking, and two approvals that each fit alone but not together
//! cannot both succeed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use clubcredit_sdk::objects::{
    AdjustDirection, ClubId, DisbursementId, EventPayload, EventType, ListQuery, PlayerId,
    RequestId, RequestStatus,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::CreditError;
use crate::events::EventBus;
use crate::ledger::Ledger;
use crate::requests::RequestRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disbursement {
    pub id: DisbursementId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub source_request_id: Option<RequestId>,
    /// Ledger limit when the disbursement was opened.
    pub approved_limit: Decimal,
    /// Ledger balance when the disbursement was opened.
    pub current_balance_snapshot: Decimal,
    pub requested_amount: Decimal,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub created_at: OffsetDateTime,
    pub decided_at: Option<OffsetDateTime>,
    pub decided_by: Option<String>,
}

type Slot = Arc<Mutex<Disbursement>>;

pub struct DisbursementProcessor {
    ledger: Arc<Ledger>,
    registry: Arc<RequestRegistry>,
    disbursements: RwLock<HashMap<DisbursementId, Slot>>,
    /// Limit requests that already back a disbursement.
    claimed_requests: Mutex<HashSet<RequestId>>,
    bus: EventBus,
}

impl DisbursementProcessor {
    pub fn new(ledger: Arc<Ledger>, registry: Arc<RequestRegistry>, bus: EventBus) -> Self {
        Self {
            ledger,
            registry,
            disbursements: RwLock::new(HashMap::new()),
            claimed_requests: Mutex::new(HashSet::new()),
            bus,
        }
    }

    async fn slot(&self, id: DisbursementId) -> Result<Slot, CreditError> {
        self.disbursements
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CreditError::not_found("disbursement", id))
    }

    /// Open a pending disbursement for a credit-eligible player.
    pub async fn open(
        &self,
        player_id: &PlayerId,
        amount: Decimal,
        source_request_id: Option<RequestId>,
    ) -> Result<Disbursement, CreditError> {
        if amount <= Decimal::ZERO {
            return Err(CreditError::validation("disbursement amount must be positive"));
        }

        let mut claimed = self.claimed_requests.lock().await;
        if let Some(request_id) = source_request_id {
            let request = self
                .registry
                .get(request_id)
                .await
                .ok_or_else(|| CreditError::not_found("credit request", request_id))?;
            if request.player_id != *player_id {
                return Err(CreditError::validation(format!(
                    "credit request {request_id} belongs to another player"
                )));
            }
            if request.status != RequestStatus::Approved {
                return Err(CreditError::validation(format!(
                    "credit request {request_id} is not approved"
                )));
            }
            if claimed.contains(&request_id) {
                return Err(CreditError::validation(format!(
                    "credit request {request_id} already backs a disbursement"
                )));
            }
        }

        let entry = self
            .ledger
            .entry(player_id)
            .await
            .filter(|entry| entry.eligible)
            .ok_or_else(|| CreditError::NotEligible(player_id.clone()))?;

        let disbursement = Disbursement {
            id: Uuid::now_v7(),
            player_id: player_id.clone(),
            club_id: entry.club_id,
            source_request_id,
            approved_limit: entry.credit_limit,
            current_balance_snapshot: entry.current_balance,
            requested_amount: amount,
            status: RequestStatus::Pending,
            reason: None,
            created_at: OffsetDateTime::now_utc(),
            decided_at: None,
            decided_by: None,
        };
        self.disbursements
            .write()
            .await
            .insert(disbursement.id, Arc::new(Mutex::new(disbursement.clone())));
        if let Some(request_id) = source_request_id {
            claimed.insert(request_id);
        }
        drop(claimed);

        tracing::info!(
            disbursement_id = %disbursement.id,
            %player_id,
            %amount,
            "Disbursement opened"
        );
        self.notify(&disbursement);
        Ok(disbursement)
    }

    /// Re-check the live ledger and, if the amount fits, credit it and
    /// mark the disbursement approved as one step.
    pub async fn approve_and_disburse(
        &self,
        id: DisbursementId,
        decided_by: &str,
    ) -> Result<Disbursement, CreditError> {
        let slot = self.slot(id).await?;
        let mut disbursement = slot.lock().await;
        if disbursement.status.is_terminal() {
            tracing::warn!(disbursement_id = %id, status = ?disbursement.status, "Disbursement already processed");
            return Err(CreditError::AlreadyProcessed(id));
        }

        let mut ledger = self.ledger.lock(&disbursement.player_id).await?;
        let available = ledger.available_credit();
        if disbursement.requested_amount > available {
            tracing::warn!(
                disbursement_id = %id,
                player_id = %disbursement.player_id,
                requested = %disbursement.requested_amount,
                %available,
                "Disbursement exceeds available credit"
            );
            return Err(CreditError::InsufficientCredit {
                requested: disbursement.requested_amount,
                available,
            });
        }
        ledger.adjust(disbursement.requested_amount, AdjustDirection::Credit)?;
        disbursement.status = RequestStatus::Approved;
        disbursement.decided_at = Some(OffsetDateTime::now_utc());
        disbursement.decided_by = Some(decided_by.to_string());
        let balance = ledger.entry().current_balance;
        let approved = disbursement.clone();
        drop(ledger);
        drop(disbursement);

        tracing::info!(
            disbursement_id = %id,
            player_id = %approved.player_id,
            amount = %approved.requested_amount,
            %balance,
            decided_by,
            "Credit disbursed"
        );
        self.notify(&approved);
        Ok(approved)
    }

    pub async fn reject(
        &self,
        id: DisbursementId,
        decided_by: &str,
        reason: &str,
    ) -> Result<Disbursement, CreditError> {
        if reason.trim().is_empty() {
            return Err(CreditError::validation("a rejection reason is required"));
        }
        let slot = self.slot(id).await?;
        let mut disbursement = slot.lock().await;
        if disbursement.status.is_terminal() {
            return Err(CreditError::AlreadyProcessed(id));
        }
        disbursement.status = RequestStatus::Rejected;
        disbursement.reason = Some(reason.to_string());
        disbursement.decided_at = Some(OffsetDateTime::now_utc());
        disbursement.decided_by = Some(decided_by.to_string());
        let rejected = disbursement.clone();
        drop(disbursement);

        tracing::info!(disbursement_id = %id, decided_by, reason, "Disbursement rejected");
        self.notify(&rejected);
        Ok(rejected)
    }

    pub async fn get(&self, id: DisbursementId) -> Option<Disbursement> {
        let slot = self.slot(id).await.ok()?;
        let disbursement = slot.lock().await;
        Some(disbursement.clone())
    }

    /// Matching disbursements, newest first.
    pub async fn list(&self, query: &ListQuery) -> Vec<Disbursement> {
        let slots: Vec<Slot> = self.disbursements.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            let d = slot.lock().await;
            if query.club_id.as_ref().is_none_or(|c| *c == d.club_id)
                && query.player_id.as_ref().is_none_or(|p| *p == d.player_id)
                && query.status.is_none_or(|s| s == d.status)
            {
                out.push(d.clone());
            }
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    fn notify(&self, disbursement: &Disbursement) {
        self.bus.publish_player_change(
            &disbursement.player_id,
            &disbursement.club_id,
            EventType::CreditStatusChanged,
            EventPayload::Disbursement {
                disbursement_id: disbursement.id,
                player_id: disbursement.player_id.clone(),
                status: disbursement.status,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use clubcredit_sdk::objects::DecisionOutcome;

    use super::*;
    use crate::directory::StaticDirectory;
    use crate::directory::tests::profile;
    use crate::ledger::tests::d;

    struct Fixture {
        ledger: Arc<Ledger>,
        registry: Arc<RequestRegistry>,
        processor: Arc<DisbursementProcessor>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(StaticDirectory::new([
            profile("p-1", "riverside"),
            profile("p-2", "riverside"),
        ]));
        let bus = EventBus::default();
        let ledger = Arc::new(Ledger::new(directory.clone(), bus.clone()));
        let registry = Arc::new(RequestRegistry::new(directory, bus.clone()));
        let processor = Arc::new(DisbursementProcessor::new(
            ledger.clone(),
            registry.clone(),
            bus,
        ));
        Fixture {
            ledger,
            registry,
            processor,
        }
    }

    fn p(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    async fn with_balance(f: &Fixture, limit: i64, balance: i64) {
        f.ledger.set_limit(&p("p-1"), d(limit)).await.unwrap();
        if balance > 0 {
            f.ledger
                .adjust(&p("p-1"), d(balance), AdjustDirection::Credit)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_snapshots_the_ledger() {
        let f = fixture();
        with_balance(&f, 100_000, 80_000).await;

        let opened = f.processor.open(&p("p-1"), d(10_000), None).await.unwrap();
        assert_eq!(opened.status, RequestStatus::Pending);
        assert_eq!(opened.approved_limit, d(100_000));
        assert_eq!(opened.current_balance_snapshot, d(80_000));
    }

    #[tokio::test]
    async fn test_open_requires_an_eligible_entry() {
        let f = fixture();
        assert_eq!(
            f.processor.open(&p("p-1"), d(10), None).await.unwrap_err(),
            CreditError::NotEligible(p("p-1"))
        );

        with_balance(&f, 100, 0).await;
        f.ledger.remove(&p("p-1")).await.unwrap();
        assert_eq!(
            f.processor.open(&p("p-1"), d(10), None).await.unwrap_err(),
            CreditError::NotEligible(p("p-1"))
        );
    }

    #[tokio::test]
    async fn test_open_rejects_non_positive_amount() {
        let f = fixture();
        with_balance(&f, 100, 0).await;
        assert!(matches!(
            f.processor.open(&p("p-1"), d(0), None).await,
            Err(CreditError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_never_overdraws_the_limit() {
        let f = fixture();
        with_balance(&f, 100_000, 80_000).await;

        let too_big = f.processor.open(&p("p-1"), d(25_000), None).await.unwrap();
        assert_eq!(
            f.processor
                .approve_and_disburse(too_big.id, "cashier")
                .await
                .unwrap_err(),
            CreditError::InsufficientCredit {
                requested: d(25_000),
                available: d(20_000)
            }
        );
        assert_eq!(
            f.processor.get(too_big.id).await.unwrap().status,
            RequestStatus::Pending
        );
        assert_eq!(
            f.ledger.entry(&p("p-1")).await.unwrap().current_balance,
            d(80_000)
        );

        let fits = f.processor.open(&p("p-1"), d(20_000), None).await.unwrap();
        let approved = f
            .processor
            .approve_and_disburse(fits.id, "cashier")
            .await
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(
            f.ledger.entry(&p("p-1")).await.unwrap().current_balance,
            d(100_000)
        );
    }

    #[tokio::test]
    async fn test_approval_credits_exactly_once() {
        let f = fixture();
        with_balance(&f, 1_000, 0).await;
        let opened = f.processor.open(&p("p-1"), d(300), None).await.unwrap();

        f.processor
            .approve_and_disburse(opened.id, "cashier")
            .await
            .unwrap();
        assert_eq!(
            f.processor
                .approve_and_disburse(opened.id, "cashier")
                .await
                .unwrap_err(),
            CreditError::AlreadyProcessed(opened.id)
        );
        assert_eq!(
            f.ledger.entry(&p("p-1")).await.unwrap().current_balance,
            d(300)
        );
    }

    #[tokio::test]
    async fn test_approval_uses_live_ledger_not_snapshot() {
        let f = fixture();
        with_balance(&f, 1_000, 0).await;
        let opened = f.processor.open(&p("p-1"), d(600), None).await.unwrap();

        f.ledger
            .adjust(&p("p-1"), d(500), AdjustDirection::Credit)
            .await
            .unwrap();

        assert!(matches!(
            f.processor.approve_and_disburse(opened.id, "cashier").await,
            Err(CreditError::InsufficientCredit { .. })
        ));
    }

    #[tokio::test]
    async fn test_approval_after_removal_is_not_eligible() {
        let f = fixture();
        with_balance(&f, 1_000, 0).await;
        let opened = f.processor.open(&p("p-1"), d(100), None).await.unwrap();
        f.ledger.remove(&p("p-1")).await.unwrap();

        assert_eq!(
            f.processor
                .approve_and_disburse(opened.id, "cashier")
                .await
                .unwrap_err(),
            CreditError::NotEligible(p("p-1"))
        );
    }

    #[tokio::test]
    async fn test_reject_leaves_ledger_untouched_and_is_terminal() {
        let f = fixture();
        with_balance(&f, 1_000, 200).await;
        let opened = f.processor.open(&p("p-1"), d(100), None).await.unwrap();

        let rejected = f
            .processor
            .reject(opened.id, "cashier", "no id presented")
            .await
            .unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.reason.as_deref(), Some("no id presented"));
        assert_eq!(
            f.ledger.entry(&p("p-1")).await.unwrap().current_balance,
            d(200)
        );

        assert_eq!(
            f.processor
                .approve_and_disburse(opened.id, "cashier")
                .await
                .unwrap_err(),
            CreditError::AlreadyProcessed(opened.id)
        );
        assert_eq!(
            f.processor
                .reject(opened.id, "cashier", "again")
                .await
                .unwrap_err(),
            CreditError::AlreadyProcessed(opened.id)
        );
    }

    #[tokio::test]
    async fn test_source_request_must_be_approved_and_unclaimed() {
        let f = fixture();
        with_balance(&f, 1_000, 0).await;
        let request = f
            .registry
            .submit(&p("p-1"), d(500), None, None)
            .await
            .unwrap();

        assert!(matches!(
            f.processor.open(&p("p-1"), d(500), Some(request.id)).await,
            Err(CreditError::Validation(_))
        ));

        f.registry
            .decide(request.id, DecisionOutcome::Approved, "manager", None)
            .await
            .unwrap();
        let opened = f
            .processor
            .open(&p("p-1"), d(500), Some(request.id))
            .await
            .unwrap();
        assert_eq!(opened.source_request_id, Some(request.id));

        assert!(matches!(
            f.processor.open(&p("p-1"), d(500), Some(request.id)).await,
            Err(CreditError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_source_request_of_another_player_is_rejected() {
        let f = fixture();
        with_balance(&f, 1_000, 0).await;
        let request = f
            .registry
            .submit(&p("p-2"), d(500), None, None)
            .await
            .unwrap();
        f.registry
            .decide(request.id, DecisionOutcome::Approved, "manager", None)
            .await
            .unwrap();

        assert!(matches!(
            f.processor.open(&p("p-1"), d(500), Some(request.id)).await,
            Err(CreditError::Validation(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approvals_never_exceed_the_limit() {
        let f = fixture();
        with_balance(&f, 100, 0).await;
        let first = f.processor.open(&p("p-1"), d(60), None).await.unwrap();
        let second = f.processor.open(&p("p-1"), d(60), None).await.unwrap();

        let a = {
            let processor = f.processor.clone();
            tokio::spawn(async move { processor.approve_and_disburse(first.id, "a").await })
        };
        let b = {
            let processor = f.processor.clone();
            tokio::spawn(async move { processor.approve_and_disburse(second.id, "b").await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(CreditError::InsufficientCredit { .. })
        )));
        assert_eq!(
            f.ledger.entry(&p("p-1")).await.unwrap().current_balance,
            d(60)
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let f = fixture();
        with_balance(&f, 1_000, 0).await;
        let a = f.processor.open(&p("p-1"), d(100), None).await.unwrap();
        f.processor.open(&p("p-1"), d(100), None).await.unwrap();
        f.processor.approve_and_disburse(a.id, "cashier").await.unwrap();

        let pending = f
            .processor
            .list(&ListQuery {
                status: Some(RequestStatus::Pending),
                ..Default::default()
            })
            .await;
        assert_eq!(pending.len(), 1);
        assert_eq!(f.processor.list(&ListQuery::default()).await.len(), 2);
    }
}
