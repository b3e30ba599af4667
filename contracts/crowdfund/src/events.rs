//! # Events
//!
//! Every state transition publishes exactly one event. The leading topic is a
//! short symbol that off-chain consumers (the indexer, the front-end) switch on:
//!
//! | Topic       | Data                    |
//! |-------------|-------------------------|
//! | `created`   | [`LedgerCreated`]        |
//! | `contrib`   | [`ContributionReceived`] |
//! | `open`      | `()`                    |
//! | `payout`    | [`PayoutSent`]           |
//! | `withdrawn` | [`WithdrawalIssued`]     |

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

pub const CREATED: Symbol = symbol_short!("created");
pub const CONTRIBUTED: Symbol = symbol_short!("contrib");
pub const OPEN: Symbol = symbol_short!("open");
pub const PAYOUT: Symbol = symbol_short!("payout");
pub const WITHDRAWN: Symbol = symbol_short!("withdrawn");

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerCreated {
    pub beneficiary: Address,
    pub threshold: i128,
    pub deadline: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionReceived {
    pub contributor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PayoutSent {
    pub recipient: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalIssued {
    pub contributor: Address,
    pub amount: i128,
}

pub fn ledger_created(env: &Env, beneficiary: &Address, threshold: i128, deadline: u64) {
    env.events().publish(
        (CREATED,),
        LedgerCreated {
            beneficiary: beneficiary.clone(),
            threshold,
            deadline,
        },
    );
}

pub fn contribution_received(env: &Env, contributor: &Address, amount: i128) {
    env.events().publish(
        (CONTRIBUTED,),
        ContributionReceived {
            contributor: contributor.clone(),
            amount,
        },
    );
}

/// Threshold missed: the ledger is open for refunds. Carries no payload.
pub fn collection_open(env: &Env) {
    env.events().publish((OPEN,), ());
}

pub fn payout_sent(env: &Env, recipient: &Address, amount: i128) {
    env.events().publish(
        (PAYOUT,),
        PayoutSent {
            recipient: recipient.clone(),
            amount,
        },
    );
}

pub fn withdrawal_issued(env: &Env, contributor: &Address, amount: i128) {
    env.events().publish(
        (WITHDRAWN,),
        WithdrawalIssued {
            contributor: contributor.clone(),
            amount,
        },
    );
}
