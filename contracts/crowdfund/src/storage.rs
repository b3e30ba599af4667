//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the ledger.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key      | Type           | Description                       |
//! |----------|----------------|-----------------------------------|
//! | `Config` | `LedgerConfig` | Immutable configuration           |
//! | `State`  | `LedgerState`  | Running total and lifecycle phase |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                     | Type   | Description                     |
//! |-------------------------|--------|---------------------------------|
//! | `Contribution(address)` | `i128` | Amount recorded for one address |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days
//! remaining. A missing entry reads as zero, and withdrawal removes the entry
//! rather than storing a zero.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{LedgerConfig, LedgerState};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Immutable ledger configuration (Instance).
    Config,
    /// Mutable ledger state (Instance).
    State,
    /// Recorded contribution for an address (Persistent).
    Contribution(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Write the configuration. Only the constructor calls this.
pub fn save_config(env: &Env, config: &LedgerConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

/// Panics if the contract was never constructed.
pub fn load_config(env: &Env) -> LedgerConfig {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("ledger not constructed")
}

pub fn load_state(env: &Env) -> LedgerState {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::State)
        .unwrap_or_default()
}

pub fn save_state(env: &Env, state: &LedgerState) {
    env.storage().instance().set(&DataKey::State, state);
    bump_instance(env);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Amount recorded for `contributor`, zero if there is none.
pub fn load_contribution(env: &Env, contributor: &Address) -> i128 {
    let key = DataKey::Contribution(contributor.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(amount) => {
            bump_persistent(env, &key);
            amount
        }
        None => 0,
    }
}

pub fn save_contribution(env: &Env, contributor: &Address, amount: i128) {
    let key = DataKey::Contribution(contributor.clone());
    env.storage().persistent().set(&key, &amount);
    bump_persistent(env, &key);
}

/// Zero an entry by removing it.
pub fn clear_contribution(env: &Env, contributor: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Contribution(contributor.clone()));
}
