//! # Types
//!
//! Shared data structures of the CrowdFund ledger.
//!
//! ## Config / State split
//!
//! The ledger is stored as two instance entries plus one persistent entry per
//! contributor:
//!
//! - [`LedgerConfig`]: written once by the constructor; never mutated.
//! - [`LedgerState`]: written on every contribution, execution and withdrawal.
//! - contribution amounts: keyed by contributor address (see `storage`).
//!
//! ## Phase as a Finite-State Machine
//!
//! ```text
//! Collecting ──execute()──► Succeeded    (total >= threshold, payout sent)
//!      └──────execute()──► Refundable   (total <  threshold, withdraw open)
//! ```
//!
//! Both executed phases are terminal.

use soroban_sdk::{contracttype, Address};

/// How the collection deadline is fixed at construction.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FundingWindow {
    /// Deadline is the creation timestamp plus this many seconds.
    Duration(u64),
    /// Deadline is this absolute ledger timestamp.
    Until(u64),
}

impl FundingWindow {
    /// Resolve the window into an absolute deadline relative to `now`.
    ///
    /// Returns `None` when a duration would overflow the timestamp range.
    pub fn deadline_from(&self, now: u64) -> Option<u64> {
        match *self {
            FundingWindow::Duration(seconds) => now.checked_add(seconds),
            FundingWindow::Until(timestamp) => Some(timestamp),
        }
    }
}

/// Lifecycle phase of the ledger.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Accepting contributions.
    Collecting,
    /// Threshold met; the collected balance went to the beneficiary.
    Succeeded,
    /// Threshold missed; contributors may withdraw what they put in.
    Refundable,
}

/// Immutable ledger configuration, written once at construction.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerConfig {
    /// The single asset contributions are made in.
    pub token: Address,
    /// Receives the whole collected balance on success.
    pub beneficiary: Address,
    /// Minimum total (inclusive) for the collection to succeed.
    pub threshold: i128,
    /// Ledger timestamp at which collection closes.
    pub deadline: u64,
    /// Ledger timestamp of construction.
    pub created_at: u64,
}

/// Mutable ledger state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerState {
    /// Sum of all recorded contribution entries.
    pub total_collected: i128,
    pub phase: Phase,
}

impl LedgerState {
    pub fn new() -> Self {
        LedgerState {
            total_collected: 0,
            phase: Phase::Collecting,
        }
    }

    /// `true` once `execute` has run, whichever way it went.
    pub fn is_executed(&self) -> bool {
        self.phase != Phase::Collecting
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}
