//! Per-dashboard synchronisation with the credit service.
//!
//! A [`ClientSyncAdapter`] owns a dashboard's local read model. It never
//! applies event payloads as state: every event is an invalidation signal
//! that names which resources to re-fetch through a [`ResourceFetcher`].
//! Duplicate deliveries are dropped by their per-topic sequence number, and
//! anything missed while disconnected is healed by
//! [`ClientSyncAdapter::resync_after_reconnect`].

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::objects::{
    ClubId, CreditFeatureRequestResponse, CreditLimitRequestResponse, DisbursementResponse, Event,
    EventPayload, EventType, LedgerEntryResponse, PlayerBalance, PlayerId, TableResponse, Topic,
    WaitlistStatusResponse,
};

/// A resource a dashboard can re-fetch on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Balance,
    CreditRequests,
    FeatureRequests,
    Waitlist,
    Tables,
    Ledger,
    Disbursements,
}

/// The authoritative value of one [`Resource`] at fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Balance(PlayerBalance),
    CreditRequests(Vec<CreditLimitRequestResponse>),
    FeatureRequests(Vec<CreditFeatureRequestResponse>),
    Waitlist(WaitlistStatusResponse),
    Tables(Vec<TableResponse>),
    Ledger(Vec<LedgerEntryResponse>),
    Disbursements(Vec<DisbursementResponse>),
}

impl Snapshot {
    pub fn resource(&self) -> Resource {
        match self {
            Snapshot::Balance(_) => Resource::Balance,
            Snapshot::CreditRequests(_) => Resource::CreditRequests,
            Snapshot::FeatureRequests(_) => Resource::FeatureRequests,
            Snapshot::Waitlist(_) => Resource::Waitlist,
            Snapshot::Tables(_) => Resource::Tables,
            Snapshot::Ledger(_) => Resource::Ledger,
            Snapshot::Disbursements(_) => Resource::Disbursements,
        }
    }
}

/// Error returned by a [`ResourceFetcher`].
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {resource:?}: {message}")]
pub struct FetchError {
    pub resource: Resource,
    pub message: String,
}

/// Source of authoritative snapshots, usually the REST API.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, resource: Resource) -> Result<Snapshot, FetchError>;
}

/// Which dashboard the adapter serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardRole {
    Player { player_id: PlayerId, club_id: ClubId },
    Staff { club_id: ClubId },
}

impl DashboardRole {
    /// Topics this dashboard subscribes to.
    ///
    /// A player listens to its own topic and its club's; staff dashboards
    /// listen to the club only.
    pub fn topics(&self) -> Vec<Topic> {
        match self {
            DashboardRole::Player { player_id, club_id } => vec![
                Topic::Player(player_id.clone()),
                Topic::Club(club_id.clone()),
            ],
            DashboardRole::Staff { club_id } => vec![Topic::Club(club_id.clone())],
        }
    }

    /// Resources the dashboard displays.
    pub fn resources(&self) -> &'static [Resource] {
        match self {
            DashboardRole::Player { .. } => &[
                Resource::Balance,
                Resource::CreditRequests,
                Resource::FeatureRequests,
                Resource::Waitlist,
                Resource::Tables,
            ],
            DashboardRole::Staff { .. } => &[
                Resource::CreditRequests,
                Resource::FeatureRequests,
                Resource::Ledger,
                Resource::Disbursements,
                Resource::Tables,
            ],
        }
    }

    /// Whether an event on `topic` can change what this dashboard shows.
    ///
    /// Player-specific changes reach a player on its own topic; the club
    /// copy of the same change is for staff and is skipped here.
    fn concerns(&self, topic: &Topic, payload: &EventPayload) -> bool {
        match (self, payload.player_id()) {
            (DashboardRole::Player { player_id, .. }, Some(subject)) => {
                matches!(topic, Topic::Player(_)) && player_id == subject
            }
            _ => true,
        }
    }
}

/// Resources an event invalidates, before filtering by role.
pub fn invalidated_by(event: EventType, payload: &EventPayload) -> &'static [Resource] {
    match event {
        EventType::CreditStatusChanged => match payload {
            EventPayload::CreditRequest { .. } => &[Resource::CreditRequests],
            EventPayload::FeatureRequest { .. } => &[Resource::FeatureRequests],
            EventPayload::Disbursement { .. } => {
                &[Resource::Disbursements, Resource::Ledger, Resource::Balance]
            }
            EventPayload::Ledger { .. } => &[Resource::Ledger, Resource::Balance],
            _ => &[],
        },
        EventType::TableStatusChanged | EventType::TablesUpdated => &[Resource::Tables],
        EventType::TableAvailable => &[Resource::Waitlist, Resource::Tables, Resource::Balance],
        EventType::WaitlistPositionUpdated | EventType::WaitlistStatusChanged => {
            &[Resource::Waitlist]
        }
    }
}

/// State of the realtime connection as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
    },
    /// The retry budget ran out: "real-time updates unavailable".
    Unavailable,
}

/// Message from the realtime connection to the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeUpdate {
    Event(Event),
    /// Events may have been missed. `None` means every topic.
    Resync { topic: Option<Topic> },
    Status(ConnectionStatus),
}

/// The dashboard's local view. Every field is the last fetched snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadModel {
    pub balance: Option<PlayerBalance>,
    pub credit_requests: Vec<CreditLimitRequestResponse>,
    pub feature_requests: Vec<CreditFeatureRequestResponse>,
    pub waitlist: Option<WaitlistStatusResponse>,
    pub tables: Vec<TableResponse>,
    pub ledger: Vec<LedgerEntryResponse>,
    pub disbursements: Vec<DisbursementResponse>,
    pub realtime: ConnectionStatus,
}

impl ReadModel {
    fn apply(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Balance(b) => self.balance = Some(b),
            Snapshot::CreditRequests(r) => self.credit_requests = r,
            Snapshot::FeatureRequests(r) => self.feature_requests = r,
            Snapshot::Waitlist(w) => self.waitlist = Some(w),
            Snapshot::Tables(t) => self.tables = t,
            Snapshot::Ledger(l) => self.ledger = l,
            Snapshot::Disbursements(d) => self.disbursements = d,
        }
    }
}

/// What the adapter did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Already applied (same or older sequence number on that topic).
    Duplicate,
    /// The event concerns nothing this dashboard shows.
    Ignored,
    /// These resources were re-fetched.
    Refreshed(Vec<Resource>),
}

#[derive(Debug, Clone, Copy)]
struct TopicCursor {
    last_seq: u64,
    /// Set after a resync: the next sequence number may skip ahead without
    /// counting as a gap.
    rebased: bool,
}

/// Keeps one dashboard's [`ReadModel`] converged with the server.
pub struct ClientSyncAdapter<F> {
    role: DashboardRole,
    fetcher: F,
    model: ReadModel,
    cursors: HashMap<Topic, TopicCursor>,
    stale: BTreeSet<Resource>,
}

impl<F: ResourceFetcher> ClientSyncAdapter<F> {
    pub fn new(role: DashboardRole, fetcher: F) -> Self {
        Self {
            role,
            fetcher,
            model: ReadModel::default(),
            cursors: HashMap::new(),
            stale: BTreeSet::new(),
        }
    }

    pub fn role(&self) -> &DashboardRole {
        &self.role
    }

    /// Topics to subscribe to on every (re)connect.
    pub fn topics(&self) -> Vec<Topic> {
        self.role.topics()
    }

    pub fn view(&self) -> &ReadModel {
        &self.model
    }

    /// Resources whose last refresh failed and are waiting for the next
    /// reconcile.
    pub fn stale(&self) -> impl Iterator<Item = Resource> + '_ {
        self.stale.iter().copied()
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.model.realtime = status;
    }

    /// Handle one pushed event.
    ///
    /// The event is checked against the topic cursor first, so a replayed
    /// duplicate never triggers a second fetch. A gap in the sequence means
    /// events were lost and turns into a full resync.
    pub async fn handle_event(&mut self, event: &Event) -> Result<EventOutcome, FetchError> {
        let gap = match self.cursors.get(&event.topic) {
            Some(cursor) if event.seq <= cursor.last_seq => {
                debug!(topic = %event.topic, seq = event.seq, "Dropping duplicate event");
                return Ok(EventOutcome::Duplicate);
            }
            Some(cursor) => !cursor.rebased && event.seq > cursor.last_seq + 1,
            None => false,
        };
        self.cursors.insert(
            event.topic.clone(),
            TopicCursor {
                last_seq: event.seq,
                rebased: false,
            },
        );

        if gap {
            warn!(topic = %event.topic, seq = event.seq, "Sequence gap, resyncing");
            self.resync().await?;
            return Ok(EventOutcome::Refreshed(self.role.resources().to_vec()));
        }

        if !self.role.concerns(&event.topic, &event.payload) {
            return Ok(EventOutcome::Ignored);
        }

        let wanted: Vec<Resource> = invalidated_by(event.event, &event.payload)
            .iter()
            .copied()
            .filter(|r| self.role.resources().contains(r))
            .collect();
        if wanted.is_empty() {
            return Ok(EventOutcome::Ignored);
        }

        self.refresh(&wanted).await?;
        Ok(EventOutcome::Refreshed(wanted))
    }

    /// Re-fetch every resource the dashboard shows.
    ///
    /// Cursors are kept so later duplicates are still dropped, but the next
    /// event on each topic is allowed to skip ahead. Use this while the
    /// connection is the same one that delivered the cursors.
    pub async fn resync(&mut self) -> Result<(), FetchError> {
        for cursor in self.cursors.values_mut() {
            cursor.rebased = true;
        }
        let all = self.role.resources().to_vec();
        self.refresh(&all).await
    }

    /// Re-fetch everything after a new realtime connection.
    ///
    /// The server may have restarted and counted its sequence numbers from
    /// one again, so every cursor is dropped and the first event per topic
    /// on the new connection starts a fresh cursor.
    pub async fn resync_after_reconnect(&mut self) -> Result<(), FetchError> {
        self.cursors.clear();
        let all = self.role.resources().to_vec();
        self.refresh(&all).await
    }

    /// Re-fetch `resources`. Every resource is attempted; the first error
    /// is returned and failed resources stay stale.
    pub async fn refresh(&mut self, resources: &[Resource]) -> Result<(), FetchError> {
        let mut first_error = None;
        for &resource in resources {
            match self.fetcher.fetch(resource).await {
                Ok(snapshot) => {
                    self.stale.remove(&snapshot.resource());
                    self.model.apply(snapshot);
                }
                Err(e) => {
                    self.stale.insert(resource);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drive the adapter from a realtime feed until the feed closes or
    /// `shutdown_rx` flips to `true`.
    ///
    /// Every `reconcile_every` the full read model is re-fetched to heal
    /// anything the push channel missed. Each change to the read model is
    /// published on `view_tx`.
    pub async fn run(
        mut self,
        mut updates: mpsc::Receiver<RealtimeUpdate>,
        reconcile_every: Duration,
        view_tx: watch::Sender<ReadModel>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!(role = ?self.role, "ClientSyncAdapter started");

        if let Err(e) = self.resync().await {
            warn!(error = %e, "Initial fetch failed");
        }
        let _ = view_tx.send(self.model.clone());

        let mut reconcile = tokio::time::interval(reconcile_every);
        reconcile.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("ClientSyncAdapter received shutdown signal");
                        break;
                    }
                }

                update = updates.recv() => {
                    let Some(update) = update else {
                        info!("Realtime feed closed");
                        break;
                    };
                    match update {
                        RealtimeUpdate::Event(event) => {
                            if let Err(e) = self.handle_event(&event).await {
                                warn!(topic = %event.topic, seq = event.seq, error = %e, "Refresh after event failed");
                            }
                        }
                        RealtimeUpdate::Resync { topic: None } => {
                            debug!("Reconnected, resetting cursors");
                            if let Err(e) = self.resync_after_reconnect().await {
                                warn!(error = %e, "Resync failed");
                            }
                        }
                        RealtimeUpdate::Resync { topic: Some(topic) } => {
                            debug!(%topic, "Resync requested");
                            if let Err(e) = self.resync().await {
                                warn!(error = %e, "Resync failed");
                            }
                        }
                        RealtimeUpdate::Status(status) => self.set_status(status),
                    }
                    let _ = view_tx.send(self.model.clone());
                }

                _ = reconcile.tick() => {
                    if let Err(e) = self.resync().await {
                        warn!(error = %e, "Periodic reconcile failed");
                    }
                    let _ = view_tx.send(self.model.clone());
                }
            }
        }

        info!("ClientSyncAdapter shutdown complete");
    }
}
