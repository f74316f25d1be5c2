use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use clubcredit_sdk::objects::{ListQuery, RequestCredit};

use crate::api::error::ApiError;
use crate::api::extractors::PlayerSession;
use crate::api::{balance_response, feature_request_response, limit_request_response};
use crate::state::AppState;

fn own(session: &PlayerSession) -> ListQuery {
    ListQuery {
        player_id: Some(session.profile.player_id.clone()),
        ..Default::default()
    }
}

/// `GET /balance`
pub(super) async fn get_balance(
    state: State<AppState>,
    session: PlayerSession,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state
        .desk
        .player_balance(&session.profile.player_id)
        .await?;
    Ok(Json(balance_response(&balance)))
}

/// `POST /credit-requests`
pub(super) async fn request_credit(
    state: State<AppState>,
    session: PlayerSession,
    Json(body): Json<RequestCredit>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .desk
        .requests
        .submit(
            &session.profile.player_id,
            body.amount,
            body.requested_limit,
            body.notes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(limit_request_response(&request))))
}

/// `GET /credit-requests`
pub(super) async fn list_credit_requests(
    state: State<AppState>,
    session: PlayerSession,
) -> impl IntoResponse {
    let requests = state.desk.requests.list(&own(&session)).await;
    Json(requests.iter().map(limit_request_response).collect::<Vec<_>>())
}

/// `POST /credit-feature`
pub(super) async fn request_credit_feature(
    state: State<AppState>,
    session: PlayerSession,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .desk
        .requests
        .submit_feature(&session.profile.player_id)
        .await?;
    Ok((StatusCode::CREATED, Json(feature_request_response(&request))))
}

/// `GET /credit-feature`
pub(super) async fn list_feature_requests(
    state: State<AppState>,
    session: PlayerSession,
) -> impl IntoResponse {
    let requests = state.desk.requests.list_feature(&own(&session)).await;
    Json(requests.iter().map(feature_request_response).collect::<Vec<_>>())
}
