//! Staff API handlers.
//!
//! These endpoints back the cashier and admin dashboards. Every request
//! carries the shared staff secret in `Clubcredit-Staff-Authorization`;
//! the optional `Clubcredit-Staff-Name` header is recorded as the decider.
//!
//! # Endpoints
//!
//! - `GET    /credit-requests`                     – list credit-limit requests
//! - `POST   /credit-requests/{id}/decision`       – approve or reject
//! - `GET    /credit-feature-requests`             – list credit-feature requests
//! - `POST   /credit-feature-requests/{id}/decision`
//! - `GET    /ledger`                              – list ledger entries
//! - `GET    /ledger/{player_id}`
//! - `PUT    /ledger/{player_id}/limit`            – set the credit limit
//! - `POST   /ledger/{player_id}/adjust`           – manual balance correction
//! - `DELETE /ledger/{player_id}`                  – revoke eligibility
//! - `GET    /disbursements`
//! - `POST   /disbursements`                       – open a disbursement
//! - `POST   /disbursements/{id}/approve`          – approve and move the money
//! - `POST   /disbursements/{id}/reject`
//! - `GET    /tables`
//! - `PUT    /tables/{id}/status`
//! - `POST   /tables/{id}/seat-next`               – seat the head of the waitlist
//! - `GET    /players/{player_id}/balance`

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

mod disbursements;
mod ledger;
mod requests;
mod tables;

/// Build the staff API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/credit-requests", get(requests::list_credit_requests))
        .route(
            "/credit-requests/{id}/decision",
            post(requests::decide_credit_request),
        )
        .route(
            "/credit-feature-requests",
            get(requests::list_feature_requests),
        )
        .route(
            "/credit-feature-requests/{id}/decision",
            post(requests::decide_feature_request),
        )
        .route("/ledger", get(ledger::list_ledger))
        .route(
            "/ledger/{player_id}",
            get(ledger::get_ledger_entry).delete(ledger::remove),
        )
        .route("/ledger/{player_id}/limit", put(ledger::set_limit))
        .route("/ledger/{player_id}/adjust", post(ledger::adjust))
        .route(
            "/disbursements",
            get(disbursements::list_disbursements).post(disbursements::open_disbursement),
        )
        .route(
            "/disbursements/{id}/approve",
            post(disbursements::approve_disbursement),
        )
        .route(
            "/disbursements/{id}/reject",
            post(disbursements::reject_disbursement),
        )
        .route("/tables", get(tables::list_tables))
        .route("/tables/{id}/status", put(tables::set_table_status))
        .route("/tables/{id}/seat-next", post(tables::seat_next))
        .route("/players/{player_id}/balance", get(ledger::player_balance))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use clubcredit_sdk::objects::{
        CreditFeatureRequestResponse, CreditLimitRequestResponse, DisbursementResponse,
        LedgerEntryResponse, PlayerBalance, RequestStatus, SeatedResponse, TableResponse,
        TableStatus, WaitlistEntryStatus,
    };
    use clubcredit_sdk::signature::{STAFF_AUTH_HEADER, STAFF_NAME_HEADER};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use crate::api::test_support::{json, player_request, staff_request, state};
    use crate::server::build_router;

    async fn submit_request(router: &Router, player: &str, amount: &str) -> CreditLimitRequestResponse {
        let response = router
            .clone()
            .oneshot(player_request(
                "POST",
                "/api/v1/player/credit-requests",
                player,
                Some(format!(r#"{{"amount":"{amount}"}}"#)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json(response).await
    }

    #[tokio::test]
    async fn test_requires_staff_secret() {
        let router = build_router(state());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/staff/credit-requests")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/staff/credit-requests")
                    .header(STAFF_AUTH_HEADER, "not-the-secret")
                    .header(STAFF_NAME_HEADER, "mallory")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_decide_credit_request_once() {
        let router = build_router(state());
        let request = submit_request(&router, "p-1", "500").await;
        let uri = format!("/api/v1/staff/credit-requests/{}/decision", request.id);

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                &uri,
                Some(r#"{"outcome":"approved","notes":"regular"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let decided: CreditLimitRequestResponse = json(response).await;
        assert_eq!(decided.status, RequestStatus::Approved);
        assert_eq!(decided.decided_by.as_deref(), Some("alice"));
        assert_eq!(decided.decision_notes.as_deref(), Some("regular"));

        let response = router
            .clone()
            .oneshot(staff_request("POST", &uri, Some(r#"{"outcome":"rejected"}"#.into())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = router
            .oneshot(staff_request(
                "GET",
                "/api/v1/staff/credit-requests?status=approved&club_id=riverside",
                None,
            ))
            .await
            .unwrap();
        let listed: Vec<CreditLimitRequestResponse> = json(response).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, request.id);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let router = build_router(state());
        let uri = format!(
            "/api/v1/staff/credit-requests/{}/decision",
            uuid::Uuid::now_v7()
        );
        let response = router
            .oneshot(staff_request("POST", &uri, Some(r#"{"outcome":"approved"}"#.into())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feature_approval_checks_live_profile() {
        let router = build_router(state());

        // p-2 has kyc pending.
        let response = router
            .clone()
            .oneshot(player_request("POST", "/api/v1/player/credit-feature", "p-2", None))
            .await
            .unwrap();
        let request: CreditFeatureRequestResponse = json(response).await;
        let uri = format!("/api/v1/staff/credit-feature-requests/{}/decision", request.id);

        let response = router
            .clone()
            .oneshot(staff_request("POST", &uri, Some(r#"{"outcome":"approved"}"#.into())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                &uri,
                Some(r#"{"outcome":"rejected","reason":"kyc incomplete"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let decided: CreditFeatureRequestResponse = json(response).await;
        assert_eq!(decided.status, RequestStatus::Rejected);
        assert_eq!(decided.rejection_reason.as_deref(), Some("kyc incomplete"));
    }

    #[tokio::test]
    async fn test_credit_flow_end_to_end() {
        let router = build_router(state());

        let request = submit_request(&router, "p-1", "400").await;
        router
            .clone()
            .oneshot(staff_request(
                "POST",
                &format!("/api/v1/staff/credit-requests/{}/decision", request.id),
                Some(r#"{"outcome":"approved"}"#.into()),
            ))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(staff_request(
                "PUT",
                "/api/v1/staff/ledger/p-1/limit",
                Some(r#"{"limit":"1000"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let entry: LedgerEntryResponse = json(response).await;
        assert_eq!(entry.available_credit, Decimal::from(1000));

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                "/api/v1/staff/disbursements",
                Some(format!(
                    r#"{{"playerId":"p-1","amount":"400","sourceRequestId":"{}"}}"#,
                    request.id
                )),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let opened: DisbursementResponse = json(response).await;
        assert_eq!(opened.status, RequestStatus::Pending);
        assert_eq!(opened.approved_limit, Decimal::from(1000));

        let approve_uri = format!("/api/v1/staff/disbursements/{}/approve", opened.id);
        let response = router
            .clone()
            .oneshot(staff_request("POST", &approve_uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let approved: DisbursementResponse = json(response).await;
        assert_eq!(approved.status, RequestStatus::Approved);

        let response = router
            .clone()
            .oneshot(staff_request("POST", &approve_uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // The source request has been used.
        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                "/api/v1/staff/disbursements",
                Some(format!(
                    r#"{{"playerId":"p-1","amount":"100","sourceRequestId":"{}"}}"#,
                    request.id
                )),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // 600 left, 700 must not go through.
        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                "/api/v1/staff/disbursements",
                Some(r#"{"playerId":"p-1","amount":"700"}"#.into()),
            ))
            .await
            .unwrap();
        let too_big: DisbursementResponse = json(response).await;
        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                &format!("/api/v1/staff/disbursements/{}/approve", too_big.id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                &format!("/api/v1/staff/disbursements/{}/reject", too_big.id),
                Some(r#"{"reason":"over limit"}"#.into()),
            ))
            .await
            .unwrap();
        let rejected: DisbursementResponse = json(response).await;
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.reason.as_deref(), Some("over limit"));

        let response = router
            .clone()
            .oneshot(staff_request("GET", "/api/v1/staff/players/p-1/balance", None))
            .await
            .unwrap();
        let balance: PlayerBalance = json(response).await;
        assert_eq!(balance.available_balance, Decimal::from(400));
        assert_eq!(balance.available_credit, Some(Decimal::from(600)));

        let response = router
            .clone()
            .oneshot(staff_request("GET", "/api/v1/staff/disbursements?player_id=p-1", None))
            .await
            .unwrap();
        let listed: Vec<DisbursementResponse> = json(response).await;
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_and_remove_ledger_entry() {
        let router = build_router(state());

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                "/api/v1/staff/ledger/p-1/adjust",
                Some(r#"{"amount":"10","direction":"credit"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router
            .clone()
            .oneshot(staff_request("GET", "/api/v1/staff/ledger/p-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        router
            .clone()
            .oneshot(staff_request(
                "PUT",
                "/api/v1/staff/ledger/p-1/limit",
                Some(r#"{"limit":"200"}"#.into()),
            ))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                "/api/v1/staff/ledger/p-1/adjust",
                Some(r#"{"amount":"250","direction":"credit"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router
            .clone()
            .oneshot(staff_request("DELETE", "/api/v1/staff/ledger/p-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(staff_request("GET", "/api/v1/staff/ledger/p-1", None))
            .await
            .unwrap();
        let entry: LedgerEntryResponse = json(response).await;
        assert!(!entry.eligible);
    }

    #[tokio::test]
    async fn test_seat_next_from_waitlist() {
        let app = state();
        let table = app
            .desk
            .floor
            .add_table("riverside".into(), "T1", "holdem", 6)
            .await
            .unwrap();
        let router = build_router(app);

        router
            .clone()
            .oneshot(player_request(
                "POST",
                "/api/v1/player/waitlist",
                "p-1",
                Some(r#"{"partySize":1}"#.into()),
            ))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(staff_request(
                "POST",
                &format!("/api/v1/staff/tables/{}/seat-next", table.id),
                Some(r#"{"buyIn":"150"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let seated: SeatedResponse = json(response).await;
        assert_eq!(seated.entry.status, WaitlistEntryStatus::Seated);
        assert_eq!(seated.table.occupied, 1);

        let response = router
            .clone()
            .oneshot(player_request("GET", "/api/v1/player/balance", "p-1", None))
            .await
            .unwrap();
        let balance: PlayerBalance = json(response).await;
        assert_eq!(balance.table_balance, Decimal::from(150));

        let response = router
            .clone()
            .oneshot(staff_request(
                "PUT",
                &format!("/api/v1/staff/tables/{}/status", table.id),
                Some(r#"{"status":"closed"}"#.into()),
            ))
            .await
            .unwrap();
        let closed: TableResponse = json(response).await;
        assert_eq!(closed.status, TableStatus::Closed);

        let response = router
            .oneshot(staff_request(
                "GET",
                "/api/v1/staff/tables?club_id=harbor",
                None,
            ))
            .await
            .unwrap();
        let tables: Vec<TableResponse> = json(response).await;
        assert!(tables.is_empty());
    }
}
