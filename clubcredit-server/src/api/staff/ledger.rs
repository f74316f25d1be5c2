use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use clubcredit_sdk::objects::{AdjustBalance, ListQuery, PlayerId, SetCreditLimit};

use crate::api::error::ApiError;
use crate::api::extractors::StaffAuth;
use crate::api::{balance_response, ledger_response};
use crate::state::AppState;

/// `GET /ledger`
pub(super) async fn list_ledger(
    state: State<AppState>,
    _auth: StaffAuth,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let entries = state.desk.ledger.entries(&query).await;
    Json(entries.iter().map(ledger_response).collect::<Vec<_>>())
}

/// `GET /ledger/{player_id}`
pub(super) async fn get_ledger_entry(
    state: State<AppState>,
    _auth: StaffAuth,
    Path(player_id): Path<PlayerId>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .desk
        .ledger
        .entry(&player_id)
        .await
        .ok_or(ApiError::NotFound("ledger entry"))?;
    Ok(Json(ledger_response(&entry)))
}

/// `PUT /ledger/{player_id}/limit`
pub(super) async fn set_limit(
    state: State<AppState>,
    auth: StaffAuth,
    Path(player_id): Path<PlayerId>,
    Json(body): Json<SetCreditLimit>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.desk.ledger.set_limit(&player_id, body.limit).await?;
    tracing::info!(%player_id, staff = %auth.name, "Staff set credit limit");
    Ok(Json(ledger_response(&entry)))
}

/// `POST /ledger/{player_id}/adjust`
pub(super) async fn adjust(
    state: State<AppState>,
    auth: StaffAuth,
    Path(player_id): Path<PlayerId>,
    Json(body): Json<AdjustBalance>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .desk
        .ledger
        .adjust(&player_id, body.amount, body.direction)
        .await?;
    tracing::info!(%player_id, staff = %auth.name, "Staff adjusted balance");
    Ok(Json(ledger_response(&entry)))
}

/// `DELETE /ledger/{player_id}`
pub(super) async fn remove(
    state: State<AppState>,
    auth: StaffAuth,
    Path(player_id): Path<PlayerId>,
) -> Result<impl IntoResponse, ApiError> {
    state.desk.ledger.remove(&player_id).await?;
    tracing::info!(%player_id, staff = %auth.name, "Staff revoked credit eligibility");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /players/{player_id}/balance`
pub(super) async fn player_balance(
    state: State<AppState>,
    _auth: StaffAuth,
    Path(player_id): Path<PlayerId>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.desk.player_balance(&player_id).await?;
    Ok(Json(balance_response(&balance)))
}
