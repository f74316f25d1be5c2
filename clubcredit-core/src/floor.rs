//! Tables and the waitlist.
//!
//! The floor is a collaborator of the credit service. It owns the table
//! list, one FIFO waitlist per club and each player's table balance (the
//! buy-in recorded when they are seated), and it publishes the table and
//! waitlist events the dashboards listen for.

use std::collections::HashMap;

use clubcredit_sdk::objects::{
    ClubId, EventPayload, EventType, PlayerId, TableId, TableStatus, Topic, WaitlistEntryId,
    WaitlistEntryStatus,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::CreditError;
use crate::events::EventBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: TableId,
    pub club_id: ClubId,
    pub name: String,
    pub game_type: String,
    pub seats: u32,
    pub occupied: u32,
    pub status: TableStatus,
}

impl Table {
    fn free_seats(&self) -> u32 {
        self.seats.saturating_sub(self.occupied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistEntry {
    pub id: WaitlistEntryId,
    pub player_id: PlayerId,
    pub club_id: ClubId,
    /// Game type the player wants, `None` for any table.
    pub table_type: Option<String>,
    pub party_size: u32,
    pub status: WaitlistEntryStatus,
    pub joined_at: OffsetDateTime,
}

impl WaitlistEntry {
    fn fits(&self, table: &Table) -> bool {
        self.party_size <= table.free_seats()
            && self
                .table_type
                .as_deref()
                .is_none_or(|wanted| wanted.eq_ignore_ascii_case(&table.game_type))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistPosition {
    pub entry: Option<WaitlistEntry>,
    /// 1-based, `None` when the player is not waiting.
    pub position: Option<u32>,
    pub total_in_queue: u32,
}

/// Result of joining the waitlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub entry: WaitlistEntry,
    pub position: u32,
    pub total_in_queue: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seating {
    pub table: Table,
    pub entry: WaitlistEntry,
}

#[derive(Default)]
struct FloorState {
    tables: HashMap<TableId, Table>,
    queues: HashMap<ClubId, Vec<WaitlistEntry>>,
    table_balances: HashMap<PlayerId, Decimal>,
}

impl FloorState {
    fn waiting_entry(&self, player_id: &PlayerId) -> Option<(usize, &WaitlistEntry, usize)> {
        self.queues.values().find_map(|queue| {
            queue
                .iter()
                .position(|e| e.player_id == *player_id)
                .map(|idx| (idx, &queue[idx], queue.len()))
        })
    }
}

pub struct Floor {
    state: Mutex<FloorState>,
    bus: EventBus,
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl Floor {
    pub fn new(bus: EventBus) -> Self {
        Self {
            state: Mutex::new(FloorState::default()),
            bus,
        }
    }

    pub async fn add_table(
        &self,
        club_id: ClubId,
        name: impl Into<String>,
        game_type: impl Into<String>,
        seats: u32,
    ) -> Result<Table, CreditError> {
        if seats == 0 {
            return Err(CreditError::validation("a table needs at least one seat"));
        }
        let table = Table {
            id: Uuid::now_v7(),
            club_id,
            name: name.into(),
            game_type: game_type.into(),
            seats,
            occupied: 0,
            status: TableStatus::Open,
        };
        self.state
            .lock()
            .await
            .tables
            .insert(table.id, table.clone());
        tracing::debug!(table_id = %table.id, club_id = %table.club_id, name = %table.name, "Table added");
        Ok(table)
    }

    /// Tables of one club, or of every club, ordered by name.
    pub async fn list_tables(&self, club_id: Option<&ClubId>) -> Vec<Table> {
        let state = self.state.lock().await;
        let mut tables: Vec<_> = state
            .tables
            .values()
            .filter(|t| club_id.is_none_or(|c| *c == t.club_id))
            .cloned()
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        tables
    }

    pub async fn set_table_status(
        &self,
        table_id: TableId,
        status: TableStatus,
    ) -> Result<Table, CreditError> {
        let mut state = self.state.lock().await;
        let table = state
            .tables
            .get_mut(&table_id)
            .ok_or_else(|| CreditError::not_found("table", table_id))?;
        table.status = status;
        let table = table.clone();

        tracing::info!(%table_id, ?status, "Table status changed");
        self.notify_table(&table);
        self.notify_tables(&table.club_id);
        Ok(table)
    }

    pub async fn join_waitlist(
        &self,
        player_id: &PlayerId,
        club_id: &ClubId,
        table_type: Option<String>,
        party_size: u32,
    ) -> Result<Placement, CreditError> {
        if party_size == 0 {
            return Err(CreditError::validation("party size must be at least one"));
        }
        let mut state = self.state.lock().await;
        if state.waiting_entry(player_id).is_some() {
            return Err(CreditError::validation("player is already on the waitlist"));
        }
        let entry = WaitlistEntry {
            id: Uuid::now_v7(),
            player_id: player_id.clone(),
            club_id: club_id.clone(),
            table_type: table_type.filter(|t| !t.trim().is_empty()),
            party_size,
            status: WaitlistEntryStatus::Waiting,
            joined_at: OffsetDateTime::now_utc(),
        };
        let queue = state.queues.entry(club_id.clone()).or_default();
        queue.push(entry.clone());
        let position = count(queue.len());

        tracing::info!(%player_id, %club_id, position, "Player joined waitlist");
        self.notify_entry(&entry, Some(position), position);
        Ok(Placement {
            entry,
            position,
            total_in_queue: position,
        })
    }

    /// Cancel a waiting entry. When `owner` is given the entry must
    /// belong to that player.
    pub async fn cancel_waitlist(
        &self,
        entry_id: WaitlistEntryId,
        owner: Option<&PlayerId>,
    ) -> Result<WaitlistEntry, CreditError> {
        let mut state = self.state.lock().await;
        let located = state.queues.iter().find_map(|(club, queue)| {
            queue
                .iter()
                .position(|e| e.id == entry_id && owner.is_none_or(|o| *o == e.player_id))
                .map(|idx| (club.clone(), idx))
        });
        let Some((club_id, idx)) = located else {
            return Err(CreditError::not_found("waitlist entry", entry_id));
        };
        let queue = state.queues.entry(club_id).or_default();
        let mut entry = queue.remove(idx);
        entry.status = WaitlistEntryStatus::Cancelled;
        let remaining = queue.clone();

        tracing::info!(%entry_id, player_id = %entry.player_id, "Waitlist entry cancelled");
        self.notify_entry(&entry, None, count(remaining.len()));
        self.notify_positions(&remaining, idx);
        Ok(entry)
    }

    pub async fn waitlist_status(&self, player_id: &PlayerId, club_id: &ClubId) -> WaitlistPosition {
        let state = self.state.lock().await;
        match state.waiting_entry(player_id) {
            Some((idx, entry, total)) => WaitlistPosition {
                entry: Some(entry.clone()),
                position: Some(count(idx + 1)),
                total_in_queue: count(total),
            },
            None => WaitlistPosition {
                entry: None,
                position: None,
                total_in_queue: count(state.queues.get(club_id).map_or(0, Vec::len)),
            },
        }
    }

    /// Seat the first waiting party that fits the table and record the
    /// buy-in as that player's table balance.
    pub async fn seat_next(
        &self,
        table_id: TableId,
        buy_in: Option<Decimal>,
    ) -> Result<Seating, CreditError> {
        let buy_in = buy_in.unwrap_or(Decimal::ZERO);
        if buy_in < Decimal::ZERO {
            return Err(CreditError::validation("buy-in cannot be negative"));
        }
        let mut state = self.state.lock().await;
        let table = state
            .tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| CreditError::not_found("table", table_id))?;
        match table.status {
            TableStatus::Closed => return Err(CreditError::validation("table is closed")),
            TableStatus::Full => return Err(CreditError::validation("table is full")),
            TableStatus::Open => {}
        }

        let queue = state.queues.entry(table.club_id.clone()).or_default();
        let Some(idx) = queue.iter().position(|e| e.fits(&table)) else {
            return Err(CreditError::validation("no waiting party fits this table"));
        };
        let mut entry = queue.remove(idx);
        entry.status = WaitlistEntryStatus::Seated;
        let remaining = queue.clone();

        let Some(seated_at) = state.tables.get_mut(&table_id) else {
            return Err(CreditError::not_found("table", table_id));
        };
        seated_at.occupied += entry.party_size;
        let became_full = seated_at.occupied >= seated_at.seats;
        if became_full {
            seated_at.status = TableStatus::Full;
        }
        let table = seated_at.clone();

        *state
            .table_balances
            .entry(entry.player_id.clone())
            .or_insert(Decimal::ZERO) += buy_in;

        tracing::info!(
            %table_id,
            player_id = %entry.player_id,
            party_size = entry.party_size,
            %buy_in,
            "Player seated"
        );
        self.bus.publish(
            Topic::Player(entry.player_id.clone()),
            EventType::TableAvailable,
            EventPayload::Table {
                table_id,
                club_id: table.club_id.clone(),
                status: table.status,
            },
        );
        self.notify_entry(&entry, None, count(remaining.len()));
        self.notify_positions(&remaining, idx);
        if became_full {
            self.notify_table(&table);
        }
        self.notify_tables(&table.club_id);
        Ok(Seating { table, entry })
    }

    pub async fn table_balance(&self, player_id: &PlayerId) -> Decimal {
        self.state
            .lock()
            .await
            .table_balances
            .get(player_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn waitlist_payload(entry: &WaitlistEntry, position: Option<u32>, total: u32) -> EventPayload {
        EventPayload::Waitlist {
            entry_id: entry.id,
            player_id: entry.player_id.clone(),
            status: entry.status,
            position,
            total_in_queue: total,
        }
    }

    /// The entry's own status change goes to the player, and the club
    /// queue view is told to refresh.
    fn notify_entry(&self, entry: &WaitlistEntry, position: Option<u32>, total: u32) {
        let payload = Self::waitlist_payload(entry, position, total);
        self.bus.publish(
            Topic::Player(entry.player_id.clone()),
            EventType::WaitlistStatusChanged,
            payload.clone(),
        );
        self.bus.publish(
            Topic::Club(entry.club_id.clone()),
            EventType::WaitlistPositionUpdated,
            payload,
        );
    }

    /// Tell every player from `from` onwards their new position.
    fn notify_positions(&self, queue: &[WaitlistEntry], from: usize) {
        let total = count(queue.len());
        for (idx, entry) in queue.iter().enumerate().skip(from) {
            self.bus.publish(
                Topic::Player(entry.player_id.clone()),
                EventType::WaitlistPositionUpdated,
                Self::waitlist_payload(entry, Some(count(idx + 1)), total),
            );
        }
    }

    fn notify_table(&self, table: &Table) {
        self.bus.publish(
            Topic::Club(table.club_id.clone()),
            EventType::TableStatusChanged,
            EventPayload::Table {
                table_id: table.id,
                club_id: table.club_id.clone(),
                status: table.status,
            },
        );
    }

    fn notify_tables(&self, club_id: &ClubId) {
        self.bus.publish(
            Topic::Club(club_id.clone()),
            EventType::TablesUpdated,
            EventPayload::Tables {
                club_id: club_id.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::d;

    fn club() -> ClubId {
        ClubId::new("riverside")
    }

    fn p(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    #[tokio::test]
    async fn test_add_table_requires_a_seat() {
        let floor = Floor::new(EventBus::default());
        assert!(matches!(
            floor.add_table(club(), "T1", "holdem", 0).await,
            Err(CreditError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_tables_is_scoped_to_club() {
        let floor = Floor::new(EventBus::default());
        floor.add_table(club(), "B", "holdem", 9).await.unwrap();
        floor.add_table(club(), "A", "omaha", 6).await.unwrap();
        floor
            .add_table(ClubId::new("harbor"), "C", "holdem", 9)
            .await
            .unwrap();

        let names: Vec<_> = floor
            .list_tables(Some(&club()))
            .await
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(floor.list_tables(None).await.len(), 3);
    }

    #[tokio::test]
    async fn test_set_table_status_publishes_to_club() {
        let bus = EventBus::default();
        let floor = Floor::new(bus.clone());
        let table = floor.add_table(club(), "T1", "holdem", 9).await.unwrap();
        let mut rx = bus.subscribe(&Topic::Club(club()));

        floor
            .set_table_status(table.id, TableStatus::Closed)
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().event, EventType::TableStatusChanged);
        assert_eq!(rx.recv().await.unwrap().event, EventType::TablesUpdated);
    }

    #[tokio::test]
    async fn test_set_status_of_unknown_table_is_not_found() {
        let floor = Floor::new(EventBus::default());
        assert!(matches!(
            floor
                .set_table_status(Uuid::new_v4(), TableStatus::Open)
                .await,
            Err(CreditError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_join_reports_position_and_rejects_duplicates() {
        let floor = Floor::new(EventBus::default());
        let first = floor
            .join_waitlist(&p("p-1"), &club(), None, 2)
            .await
            .unwrap();
        let second = floor
            .join_waitlist(&p("p-2"), &club(), Some("holdem".into()), 1)
            .await
            .unwrap();
        assert_eq!((first.position, first.total_in_queue), (1, 1));
        assert_eq!((second.position, second.total_in_queue), (2, 2));

        assert!(matches!(
            floor.join_waitlist(&p("p-1"), &club(), None, 1).await,
            Err(CreditError::Validation(_))
        ));
        assert!(matches!(
            floor.join_waitlist(&p("p-3"), &club(), None, 0).await,
            Err(CreditError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_renumbers_the_queue() {
        let bus = EventBus::default();
        let floor = Floor::new(bus.clone());
        let first = floor
            .join_waitlist(&p("p-1"), &club(), None, 1)
            .await
            .unwrap();
        floor
            .join_waitlist(&p("p-2"), &club(), None, 1)
            .await
            .unwrap();
        let mut p2_rx = bus.subscribe(&Topic::Player(p("p-2")));

        let entry_id = first.entry.id;
        let cancelled = floor.cancel_waitlist(entry_id, Some(&p("p-1"))).await.unwrap();
        assert_eq!(cancelled.status, WaitlistEntryStatus::Cancelled);

        let status = floor.waitlist_status(&p("p-2"), &club()).await;
        assert_eq!((status.position, status.total_in_queue), (Some(1), 1));

        let moved = p2_rx.recv().await.unwrap();
        assert_eq!(moved.event, EventType::WaitlistPositionUpdated);
        assert!(matches!(
            moved.payload,
            EventPayload::Waitlist {
                position: Some(1),
                ..
            }
        ));

        assert!(matches!(
            floor.cancel_waitlist(entry_id, None).await,
            Err(CreditError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_of_someone_elses_entry_is_not_found() {
        let floor = Floor::new(EventBus::default());
        let joined = floor
            .join_waitlist(&p("p-1"), &club(), None, 1)
            .await
            .unwrap();
        assert!(matches!(
            floor
                .cancel_waitlist(joined.entry.id, Some(&p("p-2")))
                .await,
            Err(CreditError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_waitlist_status_when_not_waiting() {
        let floor = Floor::new(EventBus::default());
        floor
            .join_waitlist(&p("p-1"), &club(), None, 1)
            .await
            .unwrap();
        let status = floor.waitlist_status(&p("p-2"), &club()).await;
        assert_eq!(status.entry, None);
        assert_eq!(status.position, None);
        assert_eq!(status.total_in_queue, 1);
    }

    #[tokio::test]
    async fn test_seat_next_skips_parties_that_do_not_fit() {
        let bus = EventBus::default();
        let floor = Floor::new(bus.clone());
        let table = floor.add_table(club(), "T1", "holdem", 2).await.unwrap();
        floor
            .join_waitlist(&p("p-1"), &club(), Some("omaha".into()), 1)
            .await
            .unwrap();
        floor
            .join_waitlist(&p("p-2"), &club(), None, 3)
            .await
            .unwrap();
        floor
            .join_waitlist(&p("p-3"), &club(), Some("Holdem".into()), 2)
            .await
            .unwrap();
        let mut p3_rx = bus.subscribe(&Topic::Player(p("p-3")));

        let seating = floor.seat_next(table.id, Some(d(500))).await.unwrap();
        assert_eq!(seating.entry.player_id, p("p-3"));
        assert_eq!(seating.entry.status, WaitlistEntryStatus::Seated);
        assert_eq!(seating.table.occupied, 2);
        assert_eq!(seating.table.status, TableStatus::Full);
        assert_eq!(floor.table_balance(&p("p-3")).await, d(500));
        assert_eq!(floor.table_balance(&p("p-1")).await, Decimal::ZERO);

        assert_eq!(p3_rx.recv().await.unwrap().event, EventType::TableAvailable);
        assert_eq!(
            p3_rx.recv().await.unwrap().event,
            EventType::WaitlistStatusChanged
        );

        assert!(matches!(
            floor.seat_next(table.id, None).await,
            Err(CreditError::Validation(_))
        ));
        assert_eq!(
            floor.waitlist_status(&p("p-1"), &club()).await.total_in_queue,
            2
        );
    }

    #[tokio::test]
    async fn test_seat_next_on_closed_table_is_rejected() {
        let floor = Floor::new(EventBus::default());
        let table = floor.add_table(club(), "T1", "holdem", 9).await.unwrap();
        floor
            .set_table_status(table.id, TableStatus::Closed)
            .await
            .unwrap();
        floor
            .join_waitlist(&p("p-1"), &club(), None, 1)
            .await
            .unwrap();
        assert!(matches!(
            floor.seat_next(table.id, None).await,
            Err(CreditError::Validation(_))
        ));
    }
}
