//! # CrowdFund Ledger Contract
//!
//! A single-instance ledger that collects contributions in one asset until a
//! deadline, then either pays the whole balance to a beneficiary (threshold
//! met) or opens every contribution up for refund (threshold missed).
//!
//! | Phase      | Entry Point(s)                                     |
//! |------------|----------------------------------------------------|
//! | Deploy     | `__constructor`                                    |
//! | Collecting | [`CrowdFund::contribute`]                          |
//! | Deadline   | [`CrowdFund::execute`]                             |
//! | Refundable | [`CrowdFund::withdraw`]                            |
//! | Queries    | `get_balance`, `contribution_of`, `get_config`, `get_state`, `phase`, `is_executed`, `time_left` |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`] and event emission to
//! [`events`]. This file holds the entry points and the transition rules.
//!
//! Every entry point runs as one Soroban invocation. Returning an [`Error`]
//! aborts the invocation and the host discards all of its writes, including
//! token transfers made along the way, so a rejected call leaves the ledger
//! exactly as it was.
//!
//! The same contract covers both a fixed-duration collection and one with an
//! absolute deadline; see [`FundingWindow`].

#![no_std]

#[cfg(test)]
extern crate std;

use soroban_sdk::{
    contract, contracterror, contractimpl, log, panic_with_error, token, Address, Env,
};

pub mod events;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_refunds;

pub use types::{FundingWindow, LedgerConfig, LedgerState, Phase};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    PhaseClosed          = 1,
    ZeroAmount           = 2,
    TooEarly             = 3,
    AlreadyExecuted      = 4,
    PhaseNotRefundable   = 5,
    NothingToWithdraw    = 6,
    InvalidThreshold     = 7,
    InvalidDeadline      = 8,
}

/// Coarse grouping of [`Error`] by what the caller has to change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// The operation is not valid in the current phase.
    Phase,
    /// The arguments or the caller's recorded balance are unacceptable.
    Validation,
    /// The ledger clock is on the wrong side of the deadline.
    Timing,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::PhaseClosed | Error::AlreadyExecuted | Error::PhaseNotRefundable => {
                ErrorClass::Phase
            }
            Error::ZeroAmount | Error::NothingToWithdraw | Error::InvalidThreshold => {
                ErrorClass::Validation
            }
            Error::TooEarly | Error::InvalidDeadline => ErrorClass::Timing,
        }
    }

    /// Stable revert reason. Callers may match on these strings.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::PhaseClosed => "CrowdFund: Funding phase is over already",
            Error::ZeroAmount => "CrowdFund: User has no funds deposited",
            Error::TooEarly => "CrowdFund: The deadline is not over yet",
            Error::AlreadyExecuted => "CrowdFund: Contract has been executed already.",
            Error::PhaseNotRefundable => {
                "CrowdFund: Contract is not open for withdraw - funding continues / threshold reached."
            }
            Error::NothingToWithdraw => "CrowdFund: No funds to withdraw",
            Error::InvalidThreshold => "CrowdFund: Threshold must be positive",
            Error::InvalidDeadline => "CrowdFund: Deadline must be in the future",
        }
    }
}

#[contract]
pub struct CrowdFund;

#[contractimpl]
impl CrowdFund {
    /// Fix the ledger configuration. Runs exactly once, at deployment.
    ///
    /// - `token` is the single asset contributions are made in.
    /// - `threshold` must be positive.
    /// - `window` must resolve to a deadline strictly after the current
    ///   ledger timestamp.
    pub fn __constructor(
        env: Env,
        token: Address,
        beneficiary: Address,
        threshold: i128,
        window: FundingWindow,
    ) {
        if threshold <= 0 {
            panic_with_error!(&env, Error::InvalidThreshold);
        }

        let now = env.ledger().timestamp();
        let deadline = match window.deadline_from(now) {
            Some(deadline) if deadline > now => deadline,
            _ => panic_with_error!(&env, Error::InvalidDeadline),
        };

        let config = LedgerConfig {
            token,
            beneficiary,
            threshold,
            deadline,
            created_at: now,
        };
        storage::save_config(&env, &config);
        storage::save_state(&env, &LedgerState::new());

        events::ledger_created(&env, &config.beneficiary, threshold, deadline);
    }

    /// Contribute `amount` of the ledger's token.
    ///
    /// The tokens are moved into the contract before anything is recorded;
    /// if the transfer fails the invocation aborts with nothing written.
    /// Repeated contributions from the same address accumulate.
    pub fn contribute(env: Env, contributor: Address, amount: i128) -> Result<(), Error> {
        contributor.require_auth();

        let config = storage::load_config(&env);
        let mut state = storage::load_state(&env);

        if state.phase != Phase::Collecting || env.ledger().timestamp() >= config.deadline {
            return Err(Error::PhaseClosed);
        }
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }

        let token_client = token::Client::new(&env, &config.token);
        token_client.transfer(&contributor, &env.current_contract_address(), &amount);

        let recorded = storage::load_contribution(&env, &contributor);
        storage::save_contribution(&env, &contributor, recorded + amount);

        state.total_collected += amount;
        storage::save_state(&env, &state);

        events::contribution_received(&env, &contributor, amount);
        Ok(())
    }

    /// Close the collection. Callable by anyone once the deadline is reached,
    /// and only once.
    ///
    /// With `total_collected >= threshold` the whole balance goes to the
    /// beneficiary in this same invocation; otherwise nothing moves and the
    /// ledger becomes refundable.
    pub fn execute(env: Env) -> Result<Phase, Error> {
        let config = storage::load_config(&env);
        let mut state = storage::load_state(&env);

        if state.is_executed() {
            return Err(Error::AlreadyExecuted);
        }
        if env.ledger().timestamp() < config.deadline {
            return Err(Error::TooEarly);
        }

        let total = state.total_collected;
        if total >= config.threshold {
            state.phase = Phase::Succeeded;
            storage::save_state(&env, &state);

            let token_client = token::Client::new(&env, &config.token);
            token_client.transfer(&env.current_contract_address(), &config.beneficiary, &total);

            log!(&env, "collection succeeded", total);
            events::payout_sent(&env, &config.beneficiary, total);
        } else {
            state.phase = Phase::Refundable;
            storage::save_state(&env, &state);

            log!(&env, "collection open for refund", total, config.threshold);
            events::collection_open(&env);
        }

        Ok(state.phase)
    }

    /// Reclaim everything `contributor` put in. Only after a failed collection.
    ///
    /// The entry is zeroed before the tokens leave the contract. Returns the
    /// refunded amount.
    pub fn withdraw(env: Env, contributor: Address) -> Result<i128, Error> {
        contributor.require_auth();

        let config = storage::load_config(&env);
        let mut state = storage::load_state(&env);

        if state.phase != Phase::Refundable {
            return Err(Error::PhaseNotRefundable);
        }

        let amount = storage::load_contribution(&env, &contributor);
        if amount == 0 {
            return Err(Error::NothingToWithdraw);
        }

        storage::clear_contribution(&env, &contributor);
        state.total_collected -= amount;
        storage::save_state(&env, &state);

        let token_client = token::Client::new(&env, &config.token);
        token_client.transfer(&env.current_contract_address(), &contributor, &amount);

        events::withdrawal_issued(&env, &contributor, amount);
        Ok(amount)
    }

    /// Sum of all recorded contributions.
    pub fn get_balance(env: Env) -> i128 {
        storage::load_state(&env).total_collected
    }

    /// Amount currently recorded for `contributor`.
    pub fn contribution_of(env: Env, contributor: Address) -> i128 {
        storage::load_contribution(&env, &contributor)
    }

    pub fn get_config(env: Env) -> LedgerConfig {
        storage::load_config(&env)
    }

    pub fn get_state(env: Env) -> LedgerState {
        storage::load_state(&env)
    }

    pub fn phase(env: Env) -> Phase {
        storage::load_state(&env).phase
    }

    pub fn is_executed(env: Env) -> bool {
        storage::load_state(&env).is_executed()
    }

    /// Seconds left until the deadline; zero once it has been reached.
    pub fn time_left(env: Env) -> u64 {
        let config = storage::load_config(&env);
        config.deadline.saturating_sub(env.ledger().timestamp())
    }
}
