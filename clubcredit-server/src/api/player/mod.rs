//! Player API handlers.
//!
//! These endpoints are called by the player dashboard and require a
//! signed session via the `Clubcredit-Player` and `Clubcredit-Signature`
//! headers. Every handler acts on the authenticated player only.
//!
//! # Endpoints
//!
//! - `GET    /balance`                – available, table and total balance
//! - `POST   /credit-requests`        – request credit
//! - `GET    /credit-requests`        – own credit requests
//! - `POST   /credit-feature`         – request first-time credit access
//! - `GET    /credit-feature`         – own credit feature requests
//! - `GET    /waitlist`               – queue position
//! - `POST   /waitlist`               – join the waitlist
//! - `DELETE /waitlist/{entry_id}`    – leave the waitlist
//! - `GET    /tables`                 – tables of the player's club

use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

mod credit;
mod floor;

/// Build the player API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/balance", get(credit::get_balance))
        .route(
            "/credit-requests",
            get(credit::list_credit_requests).post(credit::request_credit),
        )
        .route(
            "/credit-feature",
            get(credit::list_feature_requests).post(credit::request_credit_feature),
        )
        .route(
            "/waitlist",
            get(floor::get_waitlist_status).post(floor::join_waitlist),
        )
        .route("/waitlist/{entry_id}", delete(floor::cancel_waitlist))
        .route("/tables", get(floor::list_tables))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use clubcredit_sdk::objects::{
        CreditFeatureRequestResponse, CreditLimitRequestResponse, PlayerBalance, RequestStatus,
        TableResponse, WaitlistJoined, WaitlistStatusResponse,
    };
    use clubcredit_sdk::signature::{PLAYER_HEADER, SIGNATURE_HEADER, sign_player_at};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use crate::api::test_support::{SESSION_SECRET, json, player_request, state};
    use crate::server::build_router;

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let router = build_router(state());
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/player/balance")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forged_or_stale_signature_is_rejected() {
        let router = build_router(state());
        let forged = axum::http::Request::builder()
            .uri("/api/v1/player/balance")
            .header(PLAYER_HEADER, "p-1")
            .header(SIGNATURE_HEADER, sign_player_at("p-1", time::OffsetDateTime::now_utc().unix_timestamp(), b"wrong"))
            .body(axum::body::Body::empty())
            .unwrap();
        let response = router.clone().oneshot(forged).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let stale = axum::http::Request::builder()
            .uri("/api/v1/player/balance")
            .header(PLAYER_HEADER, "p-1")
            .header(SIGNATURE_HEADER, sign_player_at("p-1", 1_000, SESSION_SECRET))
            .body(axum::body::Body::empty())
            .unwrap();
        let response = router.oneshot(stale).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_player_is_forbidden() {
        let router = build_router(state());
        let response = router
            .oneshot(player_request("GET", "/api/v1/player/balance", "ghost", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_balance_of_new_player() {
        let router = build_router(state());
        let response = router
            .oneshot(player_request("GET", "/api/v1/player/balance", "p-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let balance: PlayerBalance = json(response).await;
        assert_eq!(balance.total_balance, Decimal::ZERO);
        assert_eq!(balance.credit_limit, None);
    }

    #[tokio::test]
    async fn test_request_credit_and_list_own() {
        let app = state();
        let router = build_router(app.clone());

        let response = router
            .clone()
            .oneshot(player_request(
                "POST",
                "/api/v1/player/credit-requests",
                "p-1",
                Some(r#"{"amount":"5000","notes":"weekend"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: CreditLimitRequestResponse = json(response).await;
        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.reason.as_deref(), Some("weekend"));

        // Another player's request must not show up.
        router
            .clone()
            .oneshot(player_request(
                "POST",
                "/api/v1/player/credit-requests",
                "p-2",
                Some(r#"{"amount":"100"}"#.into()),
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(player_request("GET", "/api/v1/player/credit-requests", "p-1", None))
            .await
            .unwrap();
        let own: Vec<CreditLimitRequestResponse> = json(response).await;
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, created.id);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_bad_request() {
        let router = build_router(state());
        let response = router
            .oneshot(player_request(
                "POST",
                "/api/v1/player/credit-requests",
                "p-1",
                Some(r#"{"amount":"0"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_credit_feature_request() {
        let router = build_router(state());
        let response = router
            .clone()
            .oneshot(player_request("POST", "/api/v1/player/credit-feature", "p-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: CreditFeatureRequestResponse = json(response).await;
        assert_eq!(created.status, RequestStatus::Pending);

        let response = router
            .clone()
            .oneshot(player_request("POST", "/api/v1/player/credit-feature", "p-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(player_request("GET", "/api/v1/player/credit-feature", "p-1", None))
            .await
            .unwrap();
        let listed: Vec<CreditFeatureRequestResponse> = json(response).await;
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_waitlist_join_status_and_cancel() {
        let router = build_router(state());

        let response = router
            .clone()
            .oneshot(player_request(
                "POST",
                "/api/v1/player/waitlist",
                "p-1",
                Some(r#"{"partySize":2,"tableType":"holdem"}"#.into()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let joined: WaitlistJoined = json(response).await;
        assert_eq!((joined.position, joined.total_in_queue), (1, 1));

        let response = router
            .clone()
            .oneshot(player_request("GET", "/api/v1/player/waitlist", "p-2", None))
            .await
            .unwrap();
        let other: WaitlistStatusResponse = json(response).await;
        assert!(!other.on_waitlist);
        assert_eq!(other.total_in_queue, 1);

        // Only the owner can cancel.
        let uri = format!("/api/v1/player/waitlist/{}", joined.entry.id);
        let response = router
            .clone()
            .oneshot(player_request("DELETE", &uri, "p-2", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .clone()
            .oneshot(player_request("DELETE", &uri, "p-1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(player_request("GET", "/api/v1/player/waitlist", "p-1", None))
            .await
            .unwrap();
        let status: WaitlistStatusResponse = json(response).await;
        assert!(!status.on_waitlist);
    }

    #[tokio::test]
    async fn test_tables_are_scoped_to_own_club() {
        let app = state();
        app.desk
            .floor
            .add_table("riverside".into(), "T1", "holdem", 9)
            .await
            .unwrap();
        app.desk
            .floor
            .add_table("harbor".into(), "H1", "omaha", 6)
            .await
            .unwrap();
        let router = build_router(app);

        let response = router
            .oneshot(player_request("GET", "/api/v1/player/tables", "p-1", None))
            .await
            .unwrap();
        let tables: Vec<TableResponse> = json(response).await;
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "T1");
    }
}
