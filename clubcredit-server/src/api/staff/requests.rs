use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use clubcredit_sdk::objects::{DecideCreditRequest, DecideFeatureRequest, ListQuery, RequestId};

use crate::api::error::ApiError;
use crate::api::extractors::StaffAuth;
use crate::api::{feature_request_response, limit_request_response};
use crate::state::AppState;

/// `GET /credit-requests`
pub(super) async fn list_credit_requests(
    state: State<AppState>,
    _auth: StaffAuth,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let requests = state.desk.requests.list(&query).await;
    Json(requests.iter().map(limit_request_response).collect::<Vec<_>>())
}

/// `POST /credit-requests/{id}/decision`
///
/// Approval only authorizes credit; the money moves when a disbursement
/// backed by this request is approved.
pub(super) async fn decide_credit_request(
    state: State<AppState>,
    auth: StaffAuth,
    Path(request_id): Path<RequestId>,
    Json(body): Json<DecideCreditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let decided = state
        .desk
        .requests
        .decide(request_id, body.outcome, &auth.name, body.notes)
        .await?;
    Ok(Json(limit_request_response(&decided)))
}

/// `GET /credit-feature-requests`
pub(super) async fn list_feature_requests(
    state: State<AppState>,
    _auth: StaffAuth,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let requests = state.desk.requests.list_feature(&query).await;
    Json(requests.iter().map(feature_request_response).collect::<Vec<_>>())
}

/// `POST /credit-feature-requests/{id}/decision`
pub(super) async fn decide_feature_request(
    state: State<AppState>,
    auth: StaffAuth,
    Path(request_id): Path<RequestId>,
    Json(body): Json<DecideFeatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let decided = state
        .desk
        .requests
        .decide_feature(request_id, body.outcome, &auth.name, body.reason)
        .await?;
    Ok(Json(feature_request_response(&decided)))
}
