//! The credit ledger.
//!
//! One entry per player, created by the first `set_limit` and never
//! deleted. Every entry satisfies `0 <= current_balance <= credit_limit`
//! at all observable points: a mutation that would break it fails and
//! leaves the entry untouched.

use std::collections::HashMap;
use std::sync::Arc;

use clubcredit_sdk::objects::{
    AdjustDirection, ClubId, EventPayload, EventType, LedgerChange, ListQuery, PlayerId,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::directory::PlayerDirectory;
use crate::error::CreditError;
use crate::events::EventBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
    pub eligible: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl LedgerEntry {
    pub fn available_credit(&self) -> Decimal {
        (self.credit_limit - self.current_balance).max(Decimal::ZERO)
    }

    fn ensure_eligible(&self) -> Result<(), CreditError> {
        if self.eligible {
            Ok(())
        } else {
            Err(CreditError::NotEligible(self.player_id.clone()))
        }
    }

    /// Apply a credit or debit. Debits clamp at zero.
    fn apply(&mut self, delta: Decimal, direction: AdjustDirection) -> Result<(), CreditError> {
        if delta <= Decimal::ZERO {
            return Err(CreditError::validation("adjustment amount must be positive"));
        }
        self.ensure_eligible()?;
        match direction {
            AdjustDirection::Credit => {
                let next = self.current_balance + delta;
                if next > self.credit_limit {
                    return Err(CreditError::CreditLimitExceeded {
                        limit: self.credit_limit,
                        balance: self.current_balance,
                        delta,
                    });
                }
                self.current_balance = next;
            }
            AdjustDirection::Debit => {
                if delta > self.current_balance {
                    tracing::warn!(
                        player_id = %self.player_id,
                        balance = %self.current_balance,
                        %delta,
                        "Debit exceeds balance, clamping to zero"
                    );
                }
                self.current_balance = (self.current_balance - delta).max(Decimal::ZERO);
            }
        }
        self.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

type Slot = Arc<Mutex<LedgerEntry>>;

pub struct Ledger {
    entries: RwLock<HashMap<PlayerId, Slot>>,
    directory: Arc<dyn PlayerDirectory>,
    bus: EventBus,
}

/// Exclusive hold on one player's entry.
///
/// While a guard is alive no other operation can read-then-write that
/// player's balance, so a check and the mutation it guards happen in one
/// critical section.
pub struct LedgerGuard {
    entry: OwnedMutexGuard<LedgerEntry>,
}

impl LedgerGuard {
    pub fn entry(&self) -> &LedgerEntry {
        &self.entry
    }

    pub fn available_credit(&self) -> Decimal {
        self.entry.available_credit()
    }

    pub fn adjust(&mut self, delta: Decimal, direction: AdjustDirection) -> Result<(), CreditError> {
        self.entry.apply(delta, direction)
    }
}

impl Ledger {
    pub fn new(directory: Arc<dyn PlayerDirectory>, bus: EventBus) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            directory,
            bus,
        }
    }

    async fn slot(&self, player_id: &PlayerId) -> Option<Slot> {
        self.entries.read().await.get(player_id).cloned()
    }

    /// Get the player's slot, creating a zero-balance entry on first use.
    async fn slot_or_create(&self, player_id: &PlayerId, limit: Decimal) -> Result<Slot, CreditError> {
        if let Some(slot) = self.slot(player_id).await {
            return Ok(slot);
        }
        let profile = self
            .directory
            .profile(player_id)
            .await
            .ok_or_else(|| CreditError::not_found("player", player_id))?;

        let mut entries = self.entries.write().await;
        let slot = entries.entry(player_id.clone()).or_insert_with(|| {
            let now = OffsetDateTime::now_utc();
            Arc::new(Mutex::new(LedgerEntry {
                player_id: player_id.clone(),
                club_id: profile.club_id,
                credit_limit: limit,
                current_balance: Decimal::ZERO,
                eligible: true,
                created_at: now,
                updated_at: now,
            }))
        });
        Ok(Arc::clone(slot))
    }

    /// Lock the player's entry for a compound operation.
    ///
    /// Fails with `NotEligible` if the player has no entry or was removed.
    pub async fn lock(&self, player_id: &PlayerId) -> Result<LedgerGuard, CreditError> {
        let slot = self
            .slot(player_id)
            .await
            .ok_or_else(|| CreditError::NotEligible(player_id.clone()))?;
        let entry = slot.lock_owned().await;
        entry.ensure_eligible()?;
        Ok(LedgerGuard { entry })
    }

    /// Set a player's credit limit, creating the entry if needed.
    ///
    /// Also restores eligibility of a removed entry.
    pub async fn set_limit(
        &self,
        player_id: &PlayerId,
        new_limit: Decimal,
    ) -> Result<LedgerEntry, CreditError> {
        if new_limit <= Decimal::ZERO {
            return Err(CreditError::validation("credit limit must be positive"));
        }
        let slot = self.slot_or_create(player_id, new_limit).await?;
        let mut entry = slot.lock().await;
        if new_limit < entry.current_balance {
            tracing::warn!(
                %player_id,
                %new_limit,
                balance = %entry.current_balance,
                "Rejected credit limit below current balance"
            );
            return Err(CreditError::validation(format!(
                "credit limit {new_limit} is below the current balance {}",
                entry.current_balance
            )));
        }
        entry.credit_limit = new_limit;
        entry.eligible = true;
        entry.updated_at = OffsetDateTime::now_utc();
        let snapshot = entry.clone();
        drop(entry);

        tracing::info!(%player_id, limit = %new_limit, "Credit limit set");
        self.notify(&snapshot, LedgerChange::LimitSet);
        Ok(snapshot)
    }

    /// Manually credit or debit a player's balance.
    pub async fn adjust(
        &self,
        player_id: &PlayerId,
        delta: Decimal,
        direction: AdjustDirection,
    ) -> Result<LedgerEntry, CreditError> {
        if delta <= Decimal::ZERO {
            return Err(CreditError::validation("adjustment amount must be positive"));
        }
        let mut guard = self.lock(player_id).await?;
        if let Err(err) = guard.adjust(delta, direction) {
            tracing::warn!(%player_id, %delta, ?direction, error = %err, "Ledger adjustment rejected");
            return Err(err);
        }
        let snapshot = guard.entry().clone();
        drop(guard);

        tracing::info!(
            %player_id,
            %delta,
            ?direction,
            balance = %snapshot.current_balance,
            "Ledger adjusted"
        );
        let change = match direction {
            AdjustDirection::Credit => LedgerChange::Credited,
            AdjustDirection::Debit => LedgerChange::Debited,
        };
        self.notify(&snapshot, change);
        Ok(snapshot)
    }

    /// Revoke a player's credit eligibility. The entry is kept.
    pub async fn remove(&self, player_id: &PlayerId) -> Result<LedgerEntry, CreditError> {
        let slot = self
            .slot(player_id)
            .await
            .ok_or_else(|| CreditError::not_found("ledger entry", player_id))?;
        let mut entry = slot.lock().await;
        let was_eligible = entry.eligible;
        if was_eligible {
            entry.eligible = false;
            entry.updated_at = OffsetDateTime::now_utc();
        }
        let snapshot = entry.clone();
        drop(entry);

        if was_eligible {
            tracing::info!(%player_id, "Player removed from credit ledger");
            self.notify(&snapshot, LedgerChange::Removed);
        }
        Ok(snapshot)
    }

    pub async fn available_credit(&self, player_id: &PlayerId) -> Result<Decimal, CreditError> {
        let slot = self
            .slot(player_id)
            .await
            .ok_or_else(|| CreditError::NotEligible(player_id.clone()))?;
        let entry = slot.lock().await;
        entry.ensure_eligible()?;
        Ok(entry.available_credit())
    }

    pub async fn entry(&self, player_id: &PlayerId) -> Option<LedgerEntry> {
        let slot = self.slot(player_id).await?;
        let entry = slot.lock().await;
        Some(entry.clone())
    }

    /// Snapshot of every entry matching `query`, ordered by player id.
    ///
    /// `status` is ignored; ledger entries have none.
    pub async fn entries(&self, query: &ListQuery) -> Vec<LedgerEntry> {
        let slots: Vec<Slot> = self.entries.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            let entry = slot.lock().await;
            let club_matches = query.club_id.as_ref().is_none_or(|c| *c == entry.club_id);
            let player_matches = query.player_id.as_ref().is_none_or(|p| *p == entry.player_id);
            if club_matches && player_matches {
                out.push(entry.clone());
            }
        }
        out.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        out
    }

    fn notify(&self, entry: &LedgerEntry, change: LedgerChange) {
        self.bus.publish_player_change(
            &entry.player_id,
            &entry.club_id,
            EventType::CreditStatusChanged,
            EventPayload::Ledger {
                player_id: entry.player_id.clone(),
                change,
            },
        );
    }
}
