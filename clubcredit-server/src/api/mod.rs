//! HTTP and WebSocket API.
//!
//! - `/api/v1/player/*` for the player dashboard, see [`player`]
//! - `/api/v1/staff/*` for the cashier and admin dashboards, see [`staff`]
//! - `/realtime` for event delivery, see [`realtime`]

use axum::Router;
use clubcredit_core::desk::BalanceSummary;
use clubcredit_core::disbursement::Disbursement;
use clubcredit_core::floor::{Table, WaitlistEntry, WaitlistPosition};
use clubcredit_core::ledger::LedgerEntry;
use clubcredit_core::requests::{CreditFeatureRequest, CreditLimitRequest};
use clubcredit_sdk::objects::{
    CreditFeatureRequestResponse, CreditLimitRequestResponse, DisbursementResponse,
    LedgerEntryResponse, PlayerBalance, TableResponse, WaitlistEntryResponse,
    WaitlistStatusResponse,
};
use time::OffsetDateTime;

use crate::state::AppState;

pub mod error;
pub mod extractors;
pub mod player;
pub mod realtime;
pub mod staff;

/// Build the `/api/v1` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/player", player::router())
        .nest("/staff", staff::router())
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn unix(t: OffsetDateTime) -> i64 {
    t.unix_timestamp()
}

pub(crate) fn limit_request_response(r: &CreditLimitRequest) -> CreditLimitRequestResponse {
    CreditLimitRequestResponse {
        id: r.id,
        player_id: r.player_id.clone(),
        club_id: r.club_id.clone(),
        amount: r.amount,
        requested_limit: r.requested_limit,
        status: r.status,
        reason: r.reason.clone(),
        requested_at: unix(r.requested_at),
        decided_at: r.decided_at.map(unix),
        decided_by: r.decided_by.clone(),
        decision_notes: r.decision_notes.clone(),
    }
}

pub(crate) fn feature_request_response(r: &CreditFeatureRequest) -> CreditFeatureRequestResponse {
    CreditFeatureRequestResponse {
        id: r.id,
        player_id: r.player_id.clone(),
        club_id: r.club_id.clone(),
        kyc_status: r.kyc_status,
        account_status: r.account_status,
        status: r.status,
        rejection_reason: r.rejection_reason.clone(),
        requested_at: unix(r.requested_at),
        decided_at: r.decided_at.map(unix),
        decided_by: r.decided_by.clone(),
    }
}

pub(crate) fn ledger_response(e: &LedgerEntry) -> LedgerEntryResponse {
    LedgerEntryResponse {
        player_id: e.player_id.clone(),
        club_id: e.club_id.clone(),
        credit_limit: e.credit_limit,
        current_balance: e.current_balance,
        available_credit: e.available_credit(),
        eligible: e.eligible,
        updated_at: unix(e.updated_at),
    }
}

pub(crate) fn disbursement_response(d: &Disbursement) -> DisbursementResponse {
    DisbursementResponse {
        id: d.id,
        player_id: d.player_id.clone(),
        club_id: d.club_id.clone(),
        source_request_id: d.source_request_id,
        approved_limit: d.approved_limit,
        current_balance_snapshot: d.current_balance_snapshot,
        requested_amount: d.requested_amount,
        status: d.status,
        reason: d.reason.clone(),
        created_at: unix(d.created_at),
        decided_at: d.decided_at.map(unix),
        decided_by: d.decided_by.clone(),
    }
}

pub(crate) fn balance_response(b: &BalanceSummary) -> PlayerBalance {
    PlayerBalance {
        player_id: b.player_id.clone(),
        club_id: b.club_id.clone(),
        available_balance: b.available_balance,
        table_balance: b.table_balance,
        total_balance: b.total_balance(),
        credit_limit: b.credit_limit,
        available_credit: b.available_credit,
        credit_feature_enabled: b.credit_feature_enabled,
    }
}

pub(crate) fn table_response(t: &Table) -> TableResponse {
    TableResponse {
        id: t.id,
        club_id: t.club_id.clone(),
        name: t.name.clone(),
        game_type: t.game_type.clone(),
        seats: t.seats,
        occupied: t.occupied,
        status: t.status,
    }
}

pub(crate) fn waitlist_entry_response(e: &WaitlistEntry) -> WaitlistEntryResponse {
    WaitlistEntryResponse {
        id: e.id,
        player_id: e.player_id.clone(),
        club_id: e.club_id.clone(),
        table_type: e.table_type.clone(),
        party_size: e.party_size,
        status: e.status,
        joined_at: unix(e.joined_at),
    }
}

pub(crate) fn waitlist_status_response(w: &WaitlistPosition) -> WaitlistStatusResponse {
    WaitlistStatusResponse {
        on_waitlist: w.entry.is_some(),
        position: w.position,
        total_in_queue: w.total_in_queue,
        entry: w.entry.as_ref().map(waitlist_entry_response),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, Response};
    use clubcredit_core::directory::{PlayerProfile, StaticDirectory};
    use clubcredit_sdk::config::{
        RealtimeConfig, ServerConfig, SessionConfig, SharedConfig, StaffConfig,
    };
    use clubcredit_sdk::objects::{AccountStatus, ClubId, KycStatus, PlayerId};
    use clubcredit_sdk::signature::{
        PLAYER_HEADER, SIGNATURE_HEADER, STAFF_AUTH_HEADER, STAFF_NAME_HEADER, sign_player,
    };
    use serde::de::DeserializeOwned;

    use crate::state::AppState;

    pub const STAFF_SECRET: &str = "front-desk";
    pub const SESSION_SECRET: &[u8] = b"session-secret";

    fn staff_config() -> StaffConfig {
        use argon2::{
            Argon2, PasswordHasher,
            password_hash::{SaltString, rand_core::OsRng},
        };
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(STAFF_SECRET.as_bytes(), &salt)
            .unwrap()
            .to_string();
        StaffConfig::new(hash)
    }

    pub fn profile(player: &str, club: &str, kyc: KycStatus) -> PlayerProfile {
        PlayerProfile {
            player_id: PlayerId::new(player),
            club_id: ClubId::new(club),
            display_name: player.to_string(),
            kyc_status: kyc,
            account_status: AccountStatus::Active,
        }
    }

    pub fn state() -> AppState {
        let config = SharedConfig::new(
            ServerConfig {
                listen: "127.0.0.1:0".parse().unwrap(),
            },
            staff_config(),
            SessionConfig::new(SESSION_SECRET.to_vec()),
        );
        let directory = StaticDirectory::new([
            profile("p-1", "riverside", KycStatus::Approved),
            profile("p-2", "riverside", KycStatus::Pending),
            profile("p-3", "harbor", KycStatus::Approved),
        ]);
        AppState::new(config, RealtimeConfig::default(), directory)
    }

    pub fn player_request(method: &str, uri: &str, player: &str, body: Option<String>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(PLAYER_HEADER, player)
            .header(SIGNATURE_HEADER, sign_player(player, SESSION_SECRET));
        with_body(builder, body)
    }

    pub fn staff_request(method: &str, uri: &str, body: Option<String>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(STAFF_AUTH_HEADER, STAFF_SECRET)
            .header(STAFF_NAME_HEADER, "alice");
        with_body(builder, body)
    }

    fn with_body(builder: axum::http::request::Builder, body: Option<String>) -> Request<Body> {
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
