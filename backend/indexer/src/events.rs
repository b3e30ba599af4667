//! Event types emitted by the CrowdFund ledger contract.
//!
//! These mirror the events published from `contracts/crowdfund/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The ledger was deployed (`created` topic). Actor is the beneficiary,
    /// amount is the threshold.
    LedgerCreated,
    /// A contribution was recorded (`contrib` topic).
    ContributionReceived,
    /// The threshold was missed and refunds are open (`open` topic).
    CollectionOpen,
    /// The collected balance went to the beneficiary (`payout` topic).
    PayoutSent,
    /// A contributor reclaimed their contribution (`withdrawn` topic).
    WithdrawalIssued,
    /// An event from this contract that we don't recognise.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::LedgerCreated,
            "contrib" => Self::ContributionReceived,
            "open" => Self::CollectionOpen,
            "payout" => Self::PayoutSent,
            "withdrawn" => Self::WithdrawalIssued,
            _ => Self::Unknown,
        }
    }

    /// Identifier stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LedgerCreated => "ledger_created",
            Self::ContributionReceived => "contribution_received",
            Self::CollectionOpen => "collection_open",
            Self::PayoutSent => "payout_sent",
            Self::WithdrawalIssued => "withdrawal_issued",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_stored(s: &str) -> Self {
        match s {
            "ledger_created" => Self::LedgerCreated,
            "contribution_received" => Self::ContributionReceived,
            "collection_open" => Self::CollectionOpen,
            "payout_sent" => Self::PayoutSent,
            "withdrawal_issued" => Self::WithdrawalIssued,
            _ => Self::Unknown,
        }
    }
}

/// A decoded ledger event, ready to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique RPC event id; the idempotency key.
    pub event_id: String,
    pub event_type: String,
    pub actor: Option<String>,
    /// Decimal string; amounts are i128 on chain.
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event row as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}
