use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use clubcredit_sdk::objects::{JoinWaitlist, WaitlistEntryId, WaitlistJoined};

use crate::api::error::ApiError;
use crate::api::extractors::PlayerSession;
use crate::api::{table_response, waitlist_entry_response, waitlist_status_response};
use crate::state::AppState;

/// `GET /waitlist`
pub(super) async fn get_waitlist_status(
    state: State<AppState>,
    session: PlayerSession,
) -> impl IntoResponse {
    let status = state
        .desk
        .floor
        .waitlist_status(&session.profile.player_id, &session.profile.club_id)
        .await;
    Json(waitlist_status_response(&status))
}

/// `POST /waitlist`
pub(super) async fn join_waitlist(
    state: State<AppState>,
    session: PlayerSession,
    Json(body): Json<JoinWaitlist>,
) -> Result<impl IntoResponse, ApiError> {
    let placement = state
        .desk
        .floor
        .join_waitlist(
            &session.profile.player_id,
            &session.profile.club_id,
            body.table_type,
            body.party_size,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(WaitlistJoined {
            position: placement.position,
            total_in_queue: placement.total_in_queue,
            entry: waitlist_entry_response(&placement.entry),
        }),
    ))
}

/// `DELETE /waitlist/{entry_id}`
pub(super) async fn cancel_waitlist(
    state: State<AppState>,
    session: PlayerSession,
    Path(entry_id): Path<WaitlistEntryId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .desk
        .floor
        .cancel_waitlist(entry_id, Some(&session.profile.player_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /tables`
pub(super) async fn list_tables(
    state: State<AppState>,
    session: PlayerSession,
) -> impl IntoResponse {
    let tables = state
        .desk
        .floor
        .list_tables(Some(&session.profile.club_id))
        .await;
    Json(tables.iter().map(table_response).collect::<Vec<_>>())
}
