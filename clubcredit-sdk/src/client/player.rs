//! Player API client (player dashboard → credit service).
//!
//! Every request carries the player id and a fresh HMAC session signature,
//! see [`crate::signature`].

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{ClientError, expect_success, parse_response};
use crate::objects::{
    CreditFeatureRequestResponse, CreditLimitRequestResponse, JoinWaitlist, PlayerBalance,
    PlayerId, RequestCredit, TableResponse, WaitlistEntryId, WaitlistJoined,
    WaitlistStatusResponse,
};
use crate::signature::{PLAYER_HEADER, SIGNATURE_HEADER, sign_player};
use crate::sync::{FetchError, Resource, ResourceFetcher, Snapshot};

/// Typed HTTP client for the **Player API**.
///
/// The client re-signs the player id on every call so the timestamp stays
/// fresh.
#[derive(Debug, Clone)]
pub struct PlayerClient {
    http: Client,
    base_url: Url,
    secret: Vec<u8>,
    player_id: PlayerId,
}

impl PlayerClient {
    /// Create a new `PlayerClient`.
    ///
    /// * `base_url` – root URL of the credit service.
    /// * `session_secret` – the shared HMAC secret for session signing.
    /// * `player_id` – the player this dashboard belongs to.
    pub fn new(base_url: Url, session_secret: impl Into<Vec<u8>>, player_id: PlayerId) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: session_secret.into(),
            player_id,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        let sig = sign_player(self.player_id.as_str(), &self.secret);
        Ok(self
            .http
            .request(method, url)
            .header(SIGNATURE_HEADER, sig)
            .header(PLAYER_HEADER, self.player_id.as_str()))
    }

    /// `GET /api/v1/player/balance` – available, table and total balance.
    pub async fn get_balance(&self) -> Result<PlayerBalance, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/player/balance")?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/player/credit-requests` – ask for credit.
    pub async fn request_credit(
        &self,
        body: &RequestCredit,
    ) -> Result<CreditLimitRequestResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/v1/player/credit-requests")?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/player/credit-requests` – the player's own requests.
    pub async fn list_credit_requests(
        &self,
    ) -> Result<Vec<CreditLimitRequestResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/player/credit-requests")?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/player/credit-feature` – ask for the credit feature to
    /// be enabled.
    pub async fn request_credit_feature(
        &self,
    ) -> Result<CreditFeatureRequestResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/v1/player/credit-feature")?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/player/credit-feature`
    pub async fn list_feature_requests(
        &self,
    ) -> Result<Vec<CreditFeatureRequestResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/player/credit-feature")?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/player/waitlist`
    pub async fn get_waitlist_status(&self) -> Result<WaitlistStatusResponse, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/player/waitlist")?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/player/waitlist`
    pub async fn join_waitlist(&self, body: &JoinWaitlist) -> Result<WaitlistJoined, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/v1/player/waitlist")?
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /api/v1/player/waitlist/{entry_id}`
    pub async fn cancel_waitlist(&self, entry_id: WaitlistEntryId) -> Result<(), ClientError> {
        let resp = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/v1/player/waitlist/{entry_id}"),
            )?
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `GET /api/v1/player/tables` – tables of the player's club.
    pub async fn list_tables(&self) -> Result<Vec<TableResponse>, ClientError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/v1/player/tables")?
            .send()
            .await?;
        parse_response(resp).await
    }
}

#[async_trait]
impl ResourceFetcher for PlayerClient {
    async fn fetch(&self, resource: Resource) -> Result<Snapshot, FetchError> {
        let fail = |e: ClientError| FetchError {
            resource,
            message: e.to_string(),
        };
        match resource {
            Resource::Balance => self.get_balance().await.map(Snapshot::Balance).map_err(fail),
            Resource::CreditRequests => self
                .list_credit_requests()
                .await
                .map(Snapshot::CreditRequests)
                .map_err(fail),
            Resource::FeatureRequests => self
                .list_feature_requests()
                .await
                .map(Snapshot::FeatureRequests)
                .map_err(fail),
            Resource::Waitlist => self
                .get_waitlist_status()
                .await
                .map(Snapshot::Waitlist)
                .map_err(fail),
            Resource::Tables => self.list_tables().await.map(Snapshot::Tables).map_err(fail),
            Resource::Ledger | Resource::Disbursements => Err(FetchError {
                resource,
                message: "not available on the player API".into(),
            }),
        }
    }
}
