//! Staff API client (cashier and admin dashboards → credit service).
//!
//! All requests carry the plaintext staff secret in the
//! `Clubcredit-Staff-Authorization` header and the acting staff member's
//! name in `Clubcredit-Staff-Name`.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use url::Url;

use super::{ClientError, expect_success, parse_response};
use crate::objects::{
    AdjustBalance, ClubId, CreditFeatureRequestResponse, CreditLimitRequestResponse,
    DecideCreditRequest, DecideFeatureRequest, DisbursementId, DisbursementResponse,
    LedgerEntryResponse, ListQuery, OpenDisbursement, PlayerBalance, PlayerId,
    RejectDisbursement, RequestId, SeatNext, SeatedResponse, SetCreditLimit, SetTableStatus,
    TableId, TableResponse, TableStatus, TablesQuery,
};
use crate::signature::{STAFF_AUTH_HEADER, STAFF_NAME_HEADER};
use crate::sync::{FetchError, Resource, ResourceFetcher, Snapshot};

/// Typed HTTP client for the **Staff API**.
#[derive(Debug, Clone)]
pub struct StaffClient {
    http: Client,
    base_url: Url,
    staff_secret: String,
    staff_name: String,
}

impl StaffClient {
    /// Create a new `StaffClient`.
    ///
    /// * `base_url` – root URL of the credit service.
    /// * `staff_secret` – the plaintext staff secret.
    /// * `staff_name` – recorded as `decidedBy` on every decision.
    pub fn new(base_url: Url, staff_secret: impl Into<String>, staff_name: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            staff_secret: staff_secret.into(),
            staff_name: staff_name.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self
            .http
            .request(method, url)
            .header(STAFF_AUTH_HEADER, &self.staff_secret)
            .header(STAFF_NAME_HEADER, &self.staff_name))
    }

    fn player_path(player_id: &PlayerId, suffix: &str) -> String {
        format!(
            "/api/v1/staff/ledger/{}{suffix}",
            urlencoding::encode(player_id.as_str())
        )
    }

    // -- credit requests ---------------------------------------------------

    /// `GET /api/v1/staff/credit-requests`
    pub async fn list_credit_requests(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<CreditLimitRequestResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/staff/credit-requests")?
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/credit-requests/{id}/decision`
    pub async fn decide_credit_request(
        &self,
        request_id: RequestId,
        body: &DecideCreditRequest,
    ) -> Result<CreditLimitRequestResponse, ClientError> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v1/staff/credit-requests/{request_id}/decision"),
            )?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/staff/credit-feature-requests`
    pub async fn list_feature_requests(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<CreditFeatureRequestResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/staff/credit-feature-requests")?
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/credit-feature-requests/{id}/decision`
    pub async fn decide_feature_request(
        &self,
        request_id: RequestId,
        body: &DecideFeatureRequest,
    ) -> Result<CreditFeatureRequestResponse, ClientError> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v1/staff/credit-feature-requests/{request_id}/decision"),
            )?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    // -- ledger ------------------------------------------------------------

    /// `GET /api/v1/staff/ledger`
    pub async fn list_ledger(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<LedgerEntryResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/staff/ledger")?
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/staff/ledger/{player_id}`
    pub async fn get_ledger_entry(
        &self,
        player_id: &PlayerId,
    ) -> Result<LedgerEntryResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, &Self::player_path(player_id, ""))?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/v1/staff/ledger/{player_id}/limit`
    pub async fn set_limit(
        &self,
        player_id: &PlayerId,
        limit: Decimal,
    ) -> Result<LedgerEntryResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::PUT, &Self::player_path(player_id, "/limit"))?
            .json(&SetCreditLimit { limit })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/ledger/{player_id}/adjust`
    pub async fn adjust(
        &self,
        player_id: &PlayerId,
        body: &AdjustBalance,
    ) -> Result<LedgerEntryResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, &Self::player_path(player_id, "/adjust"))?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /api/v1/staff/ledger/{player_id}` – remove credit eligibility.
    pub async fn remove_from_ledger(&self, player_id: &PlayerId) -> Result<(), ClientError> {
        let resp = self
            .request(reqwest::Method::DELETE, &Self::player_path(player_id, ""))?
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `GET /api/v1/staff/players/{player_id}/balance`
    pub async fn player_balance(&self, player_id: &PlayerId) -> Result<PlayerBalance, ClientError> {
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!(
                    "/api/v1/staff/players/{}/balance",
                    urlencoding::encode(player_id.as_str())
                ),
            )?
            .send()
            .await?;
        parse_response(resp).await
    }

    // -- disbursements -----------------------------------------------------

    /// `GET /api/v1/staff/disbursements`
    pub async fn list_disbursements(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<DisbursementResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/staff/disbursements")?
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/disbursements`
    pub async fn open_disbursement(
        &self,
        body: &OpenDisbursement,
    ) -> Result<DisbursementResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/v1/staff/disbursements")?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/disbursements/{id}/approve`
    pub async fn approve_disbursement(
        &self,
        id: DisbursementId,
    ) -> Result<DisbursementResponse, ClientError> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v1/staff/disbursements/{id}/approve"),
            )?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/disbursements/{id}/reject`
    pub async fn reject_disbursement(
        &self,
        id: DisbursementId,
        reason: impl Into<String>,
    ) -> Result<DisbursementResponse, ClientError> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v1/staff/disbursements/{id}/reject"),
            )?
            .json(&RejectDisbursement {
                reason: reason.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    // -- floor -------------------------------------------------------------

    /// `GET /api/v1/staff/tables`
    pub async fn list_tables(&self, query: &TablesQuery) -> Result<Vec<TableResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/staff/tables")?
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/v1/staff/tables/{id}/status`
    pub async fn set_table_status(
        &self,
        table_id: TableId,
        status: TableStatus,
    ) -> Result<TableResponse, ClientError> {
        let resp = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/v1/staff/tables/{table_id}/status"),
            )?
            .json(&SetTableStatus { status })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/staff/tables/{id}/seat-next`
    pub async fn seat_next(
        &self,
        table_id: TableId,
        body: &SeatNext,
    ) -> Result<SeatedResponse, ClientError> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v1/staff/tables/{table_id}/seat-next"),
            )?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }
}

/// [`ResourceFetcher`] for a staff dashboard scoped to one club.
#[derive(Debug, Clone)]
pub struct StaffDashboardFetcher {
    pub client: StaffClient,
    pub club_id: ClubId,
}

#[async_trait]
impl ResourceFetcher for StaffDashboardFetcher {
    async fn fetch(&self, resource: Resource) -> Result<Snapshot, FetchError> {
        let fail = |e: ClientError| FetchError {
            resource,
            message: e.to_string(),
        };
        let club = ListQuery {
            club_id: Some(self.club_id.clone()),
            ..ListQuery::default()
        };
        match resource {
            Resource::CreditRequests => self
                .client
                .list_credit_requests(&club)
                .await
                .map(Snapshot::CreditRequests)
                .map_err(fail),
            Resource::FeatureRequests => self
                .client
                .list_feature_requests(&club)
                .await
                .map(Snapshot::FeatureRequests)
                .map_err(fail),
            Resource::Ledger => self
                .client
                .list_ledger(&club)
                .await
                .map(Snapshot::Ledger)
                .map_err(fail),
            Resource::Disbursements => self
                .client
                .list_disbursements(&club)
                .await
                .map(Snapshot::Disbursements)
                .map_err(fail),
            Resource::Tables => self
                .client
                .list_tables(&TablesQuery {
                    club_id: Some(self.club_id.clone()),
                })
                .await
                .map(Snapshot::Tables)
                .map_err(fail),
            Resource::Balance | Resource::Waitlist => Err(FetchError {
                resource,
                message: "player-scoped resource".into(),
            }),
        }
    }
}
