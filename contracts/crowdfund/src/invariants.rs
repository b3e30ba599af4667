#![allow(dead_code)]

extern crate std;

use soroban_sdk::{token, Address};

use crate::{CrowdFundClient, LedgerConfig, Phase};

/// INV-1: the running total equals the sum of every recorded contribution.
///
/// `contributors` must list every address that ever contributed.
pub fn assert_total_matches_contributions(client: &CrowdFundClient, contributors: &[Address]) {
    let sum: i128 = contributors.iter().map(|c| client.contribution_of(c)).sum();
    let total = client.get_balance();
    assert_eq!(
        total, sum,
        "INV-1 violated: total_collected {} != sum of contributions {}",
        total, sum
    );
}

/// INV-2: no recorded contribution is negative.
pub fn assert_contributions_non_negative(client: &CrowdFundClient, contributors: &[Address]) {
    for c in contributors {
        let amount = client.contribution_of(c);
        assert!(
            amount >= 0,
            "INV-2 violated: negative contribution ({})",
            amount
        );
    }
}

/// INV-3: until the payout, the contract holds exactly what it has recorded.
pub fn assert_custody_matches_total(client: &CrowdFundClient, token: &token::Client) {
    let held = token.balance(&client.address);
    match client.phase() {
        Phase::Collecting | Phase::Refundable => assert_eq!(
            held,
            client.get_balance(),
            "INV-3 violated: contract holds {} but recorded {}",
            held,
            client.get_balance()
        ),
        Phase::Succeeded => assert_eq!(held, 0, "INV-3 violated: payout left {} behind", held),
    }
}

/// INV-4: only forward transitions out of `Collecting` exist.
///   Collecting -> Succeeded | Refundable
///   Succeeded  -> (none)
///   Refundable -> (none)
pub fn assert_valid_phase_transition(from: &Phase, to: &Phase) {
    let valid = matches!(
        (from, to),
        (Phase::Collecting, Phase::Succeeded) | (Phase::Collecting, Phase::Refundable)
    );
    assert!(
        valid,
        "INV-4 violated: invalid phase transition from {:?} to {:?}",
        from, to
    );
}

/// INV-5: the configuration never changes after construction.
pub fn assert_config_immutable(original: &LedgerConfig, current: &LedgerConfig) {
    assert_eq!(original, current, "INV-5 violated: ledger config changed");
}

/// Run every ledger-wide invariant.
pub fn assert_ledger_invariants(
    client: &CrowdFundClient,
    token: &token::Client,
    contributors: &[Address],
) {
    assert_total_matches_contributions(client, contributors);
    assert_contributions_non_negative(client, contributors);
    assert_custody_matches_total(client, token);
}
