//! Ledger view rebuilt from indexed events.
//!
//! The fold mirrors the contract's own bookkeeping: contributions add to a
//! contributor's outstanding amount, withdrawals clear it, and the first
//! `payout_sent` / `collection_open` event fixes the phase. Any later phase
//! event is counted as skipped.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::events::{EventKind, EventRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPhase {
    Collecting,
    Succeeded,
    Refundable,
}

/// Amounts are serialized as decimal strings; they are i128 on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub phase: LedgerPhase,
    pub beneficiary: Option<String>,
    #[serde(with = "amount_str::option")]
    pub threshold: Option<i128>,
    #[serde(with = "amount_str")]
    pub total_contributed: i128,
    #[serde(with = "amount_str")]
    pub total_withdrawn: i128,
    #[serde(with = "amount_str")]
    pub paid_out: i128,
    /// Equals the contract's `get_balance`.
    #[serde(with = "amount_str")]
    pub balance: i128,
    /// Still-recorded amount per contributor; zeroed entries are dropped.
    #[serde(serialize_with = "amount_str::map")]
    pub contributors: BTreeMap<String, i128>,
    /// Events that could not be applied (missing actor or bad amount).
    pub skipped: usize,
}

impl LedgerSummary {
    fn empty() -> Self {
        LedgerSummary {
            phase: LedgerPhase::Collecting,
            beneficiary: None,
            threshold: None,
            total_contributed: 0,
            total_withdrawn: 0,
            paid_out: 0,
            balance: 0,
            contributors: BTreeMap::new(),
            skipped: 0,
        }
    }
}

/// Fold events (in ledger order) into a [`LedgerSummary`].
pub fn summarize(events: &[EventRecord]) -> LedgerSummary {
    let mut summary = LedgerSummary::empty();

    for ev in events {
        let amount = ev.amount.as_deref().and_then(|a| a.parse::<i128>().ok());
        match ev.kind() {
            EventKind::LedgerCreated => {
                summary.beneficiary = ev.actor.clone();
                summary.threshold = amount;
            }
            EventKind::ContributionReceived => match (&ev.actor, amount) {
                (Some(actor), Some(amount)) => {
                    *summary.contributors.entry(actor.clone()).or_insert(0) += amount;
                    summary.total_contributed += amount;
                    summary.balance += amount;
                }
                _ => skip(&mut summary, ev),
            },
            EventKind::WithdrawalIssued => match (&ev.actor, amount) {
                (Some(actor), Some(amount)) => {
                    summary.contributors.remove(actor);
                    summary.total_withdrawn += amount;
                    summary.balance -= amount;
                }
                _ => skip(&mut summary, ev),
            },
            EventKind::PayoutSent | EventKind::CollectionOpen
                if summary.phase != LedgerPhase::Collecting =>
            {
                skip(&mut summary, ev)
            }
            EventKind::PayoutSent => match amount {
                Some(amount) => {
                    summary.phase = LedgerPhase::Succeeded;
                    summary.paid_out = amount;
                }
                None => skip(&mut summary, ev),
            },
            EventKind::CollectionOpen => summary.phase = LedgerPhase::Refundable,
            EventKind::Unknown => {}
        }
    }

    summary
}

fn skip(summary: &mut LedgerSummary, ev: &EventRecord) {
    warn!(
        "Skipping malformed {} event {} (actor={:?}, amount={:?})",
        ev.event_type, ev.event_id, ev.actor, ev.amount
    );
    summary.skipped += 1;
}

mod amount_str {
    use std::collections::BTreeMap;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn map<S: Serializer>(
        value: &BTreeMap<String, i128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(value.iter().map(|(k, v)| (k, v.to_string())))
    }

    pub mod option {
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            value: &Option<i128>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.collect_str(v),
                None => serializer.serialize_none(),
            }
        }
    }
}
