use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use clubcredit_sdk::objects::{SeatNext, SeatedResponse, SetTableStatus, TableId, TablesQuery};

use crate::api::error::ApiError;
use crate::api::extractors::StaffAuth;
use crate::api::{table_response, waitlist_entry_response};
use crate::state::AppState;

/// `GET /tables`
pub(super) async fn list_tables(
    state: State<AppState>,
    _auth: StaffAuth,
    Query(query): Query<TablesQuery>,
) -> impl IntoResponse {
    let tables = state.desk.floor.list_tables(query.club_id.as_ref()).await;
    Json(tables.iter().map(table_response).collect::<Vec<_>>())
}

/// `PUT /tables/{id}/status`
pub(super) async fn set_table_status(
    state: State<AppState>,
    _auth: StaffAuth,
    Path(table_id): Path<TableId>,
    Json(body): Json<SetTableStatus>,
) -> Result<impl IntoResponse, ApiError> {
    let table = state
        .desk
        .floor
        .set_table_status(table_id, body.status)
        .await?;
    Ok(Json(table_response(&table)))
}

/// `POST /tables/{id}/seat-next`
pub(super) async fn seat_next(
    state: State<AppState>,
    _auth: StaffAuth,
    Path(table_id): Path<TableId>,
    Json(body): Json<SeatNext>,
) -> Result<impl IntoResponse, ApiError> {
    let seating = state.desk.floor.seat_next(table_id, body.buy_in).await?;
    Ok(Json(SeatedResponse {
        table: table_response(&seating.table),
        entry: waitlist_entry_response(&seating.entry),
    }))
}
