//! Wiring of the credit services around one event bus and directory.

use std::sync::Arc;

use clubcredit_sdk::objects::{ClubId, PlayerId};
use rust_decimal::Decimal;

use crate::directory::PlayerDirectory;
use crate::disbursement::DisbursementProcessor;
use crate::error::CreditError;
use crate::events::EventBus;
use crate::floor::Floor;
use crate::ledger::Ledger;
use crate::requests::RequestRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSummary {
    pub player_id: PlayerId,
    pub club_id: ClubId,
    /// Credit already disbursed into the player's balance.
    pub available_balance: Decimal,
    pub table_balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub available_credit: Option<Decimal>,
    pub credit_feature_enabled: bool,
}

impl BalanceSummary {
    pub fn total_balance(&self) -> Decimal {
        self.available_balance + self.table_balance
    }
}

#[derive(Clone)]
pub struct CreditDesk {
    pub directory: Arc<dyn PlayerDirectory>,
    pub bus: EventBus,
    pub ledger: Arc<Ledger>,
    pub requests: Arc<RequestRegistry>,
    pub disbursements: Arc<DisbursementProcessor>,
    pub floor: Arc<Floor>,
}

impl CreditDesk {
    pub fn new(directory: Arc<dyn PlayerDirectory>, bus: EventBus) -> Self {
        let ledger = Arc::new(Ledger::new(directory.clone(), bus.clone()));
        let requests = Arc::new(RequestRegistry::new(directory.clone(), bus.clone()));
        let disbursements = Arc::new(DisbursementProcessor::new(
            ledger.clone(),
            requests.clone(),
            bus.clone(),
        ));
        let floor = Arc::new(Floor::new(bus.clone()));
        Self {
            directory,
            bus,
            ledger,
            requests,
            disbursements,
            floor,
        }
    }

    /// Combined view of a player's disbursed credit and table balance.
    ///
    /// Limit and available credit are only reported while the player is
    /// credit-eligible.
    pub async fn player_balance(&self, player_id: &PlayerId) -> Result<BalanceSummary, CreditError> {
        let profile = self
            .directory
            .profile(player_id)
            .await
            .ok_or_else(|| CreditError::not_found("player", player_id))?;
        let entry = self.ledger.entry(player_id).await;
        let eligible = entry.as_ref().filter(|e| e.eligible);

        Ok(BalanceSummary {
            player_id: player_id.clone(),
            club_id: profile.club_id,
            available_balance: entry
                .as_ref()
                .map_or(Decimal::ZERO, |e| e.current_balance),
            table_balance: self.floor.table_balance(player_id).await,
            credit_limit: eligible.map(|e| e.credit_limit),
            available_credit: eligible.map(|e| e.available_credit()),
            credit_feature_enabled: self.requests.is_feature_enabled(player_id).await,
        })
    }
}
