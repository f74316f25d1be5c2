//! Player records seam.
//!
//! The credit service never owns player identity. It asks a
//! [`PlayerDirectory`] for the profile whenever it needs the club a player
//! belongs to or the KYC/account state that gates credit-feature approval.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use clubcredit_sdk::objects::{AccountStatus, ClubId, KycStatus, PlayerId};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub club_id: ClubId,
    pub display_name: String,
    pub kyc_status: KycStatus,
    pub account_status: AccountStatus,
}

impl PlayerProfile {
    /// Why this player cannot be enabled for credit, if anything.
    pub fn ineligibility(&self) -> Option<String> {
        if self.kyc_status != KycStatus::Approved {
            return Some(format!("kyc status is {:?}", self.kyc_status).to_lowercase());
        }
        if self.account_status != AccountStatus::Active {
            return Some(format!("account status is {:?}", self.account_status).to_lowercase());
        }
        None
    }
}

#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn profile(&self, player_id: &PlayerId) -> Option<PlayerProfile>;
}

/// An in-memory directory that can be replaced wholesale, as the server
/// does on config reload.
#[derive(Clone)]
pub struct StaticDirectory {
    profiles: Arc<RwLock<HashMap<PlayerId, PlayerProfile>>>,
}

impl StaticDirectory {
    pub fn new(profiles: impl IntoIterator<Item = PlayerProfile>) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(index(profiles))),
        }
    }

    /// Swap in a new set of profiles. Lookups already in flight finish
    /// against the old set.
    pub async fn replace(&self, profiles: impl IntoIterator<Item = PlayerProfile>) {
        let mut guard = self.profiles.write().await;
        *guard = index(profiles);
        let count = guard.len();
        drop(guard);
        tracing::info!(players = count, "Player directory replaced");
    }
}

#[async_trait]
impl PlayerDirectory for StaticDirectory {
    async fn profile(&self, player_id: &PlayerId) -> Option<PlayerProfile> {
        self.profiles.read().await.get(player_id).cloned()
    }
}

fn index(profiles: impl IntoIterator<Item = PlayerProfile>) -> HashMap<PlayerId, PlayerProfile> {
    profiles
        .into_iter()
        .map(|profile| (profile.player_id.clone(), profile))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn profile(player: &str, club: &str) -> PlayerProfile {
        PlayerProfile {
            player_id: PlayerId::new(player),
            club_id: ClubId::new(club),
            display_name: player.to_uppercase(),
            kyc_status: KycStatus::Approved,
            account_status: AccountStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_lookup_returns_seeded_profile() {
        let directory = StaticDirectory::new([profile("p-1", "riverside")]);
        let found = directory.profile(&PlayerId::new("p-1")).await;
        assert_eq!(found.map(|p| p.club_id), Some(ClubId::new("riverside")));
        assert!(directory.profile(&PlayerId::new("p-2")).await.is_none());
    }

    #[tokio::test]
    async fn test_replace_swaps_every_profile() {
        let directory = StaticDirectory::new([profile("p-1", "riverside")]);
        let shared = directory.clone();

        directory.replace([profile("p-2", "harbor")]).await;

        assert!(shared.profile(&PlayerId::new("p-1")).await.is_none());
        let found = shared.profile(&PlayerId::new("p-2")).await;
        assert_eq!(found.map(|p| p.club_id), Some(ClubId::new("harbor")));
    }

    #[test]
    fn test_ineligibility_checks_kyc_before_account() {
        let mut p = profile("p-1", "riverside");
        assert_eq!(p.ineligibility(), None);

        p.account_status = AccountStatus::Suspended;
        assert_eq!(p.ineligibility().as_deref(), Some("account status is suspended"));

        p.kyc_status = KycStatus::Pending;
        assert_eq!(p.ineligibility().as_deref(), Some("kyc status is pending"));
    }
}
