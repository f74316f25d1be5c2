use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use clubcredit_sdk::objects::{DisbursementId, ListQuery, OpenDisbursement, RejectDisbursement};

use crate::api::disbursement_response;
use crate::api::error::ApiError;
use crate::api::extractors::StaffAuth;
use crate::state::AppState;

/// `GET /disbursements`
pub(super) async fn list_disbursements(
    state: State<AppState>,
    _auth: StaffAuth,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let disbursements = state.desk.disbursements.list(&query).await;
    Json(disbursements.iter().map(disbursement_response).collect::<Vec<_>>())
}

/// `POST /disbursements`
pub(super) async fn open_disbursement(
    state: State<AppState>,
    _auth: StaffAuth,
    Json(body): Json<OpenDisbursement>,
) -> Result<impl IntoResponse, ApiError> {
    let opened = state
        .desk
        .disbursements
        .open(&body.player_id, body.amount, body.source_request_id)
        .await?;
    Ok((StatusCode::CREATED, Json(disbursement_response(&opened))))
}

/// `POST /disbursements/{id}/approve`
pub(super) async fn approve_disbursement(
    state: State<AppState>,
    auth: StaffAuth,
    Path(id): Path<DisbursementId>,
) -> Result<impl IntoResponse, ApiError> {
    let approved = state
        .desk
        .disbursements
        .approve_and_disburse(id, &auth.name)
        .await?;
    Ok(Json(disbursement_response(&approved)))
}

/// `POST /disbursements/{id}/reject`
pub(super) async fn reject_disbursement(
    state: State<AppState>,
    auth: StaffAuth,
    Path(id): Path<DisbursementId>,
    Json(body): Json<RejectDisbursement>,
) -> Result<impl IntoResponse, ApiError> {
    let rejected = state
        .desk
        .disbursements
        .reject(id, &auth.name, &body.reason)
        .await?;
    Ok(Json(disbursement_response(&rejected)))
}
