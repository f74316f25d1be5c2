pub mod credit;
pub mod events;
pub mod floor;
pub mod ids;
pub mod ws;

pub use credit::{
    AccountStatus, AdjustBalance, AdjustDirection, CreditFeatureRequestResponse,
    CreditLimitRequestResponse, DecideCreditRequest, DecideFeatureRequest, DecisionOutcome,
    DisbursementResponse, KycStatus, LedgerEntryResponse, ListQuery, OpenDisbursement,
    PlayerBalance, RejectDisbursement, RequestCredit, RequestStatus, SetCreditLimit,
};
pub use events::{Event, EventPayload, EventType, LedgerChange, ParseTopicError, Topic};
pub use floor::{
    JoinWaitlist, SeatNext, SeatedResponse, SetTableStatus, TableResponse, TableStatus,
    TablesQuery, WaitlistEntryResponse, WaitlistEntryStatus, WaitlistJoined,
    WaitlistStatusResponse,
};
pub use ids::{ClubId, DisbursementId, PlayerId, RequestId, TableId, WaitlistEntryId};
pub use ws::{WsClientMessage, WsCloseCode, WsServerMessage};
