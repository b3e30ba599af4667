extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    Address,
};

use crate::invariants::{assert_config_immutable, assert_ledger_invariants};
use crate::test::{funded_contributor, pass_deadline, setup, ONE_UNIT};
use crate::{Error, Phase};

#[test]
fn test_withdraw_rejected_while_collecting() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, 1_000);
    s.client.contribute(&alice, &1_000);

    assert_eq!(
        s.client.try_withdraw(&alice),
        Err(Ok(Error::PhaseNotRefundable))
    );

    // Deadline alone does not open refunds; execute has to run first.
    pass_deadline(&s.env);
    assert_eq!(
        s.client.try_withdraw(&alice),
        Err(Ok(Error::PhaseNotRefundable))
    );
    assert_eq!(s.client.contribution_of(&alice), 1_000);
}

#[test]
fn test_every_contributor_refunded_exactly_once() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, 3_000);
    let bob = funded_contributor(&s, 7_000);
    let carol = funded_contributor(&s, 500);
    let contributors = [alice.clone(), bob.clone(), carol.clone()];
    let config = s.client.get_config();

    s.client.contribute(&alice, &1_000);
    s.client.contribute(&bob, &7_000);
    s.client.contribute(&alice, &2_000);
    s.client.contribute(&carol, &500);
    assert_ledger_invariants(&s.client, &s.token, &contributors);

    pass_deadline(&s.env);
    assert_eq!(s.client.execute(), Phase::Refundable);

    assert_eq!(s.client.withdraw(&bob), 7_000);
    assert_ledger_invariants(&s.client, &s.token, &contributors);
    assert_eq!(s.client.withdraw(&alice), 3_000);
    assert_ledger_invariants(&s.client, &s.token, &contributors);

    assert_eq!(s.token.balance(&alice), 3_000);
    assert_eq!(s.token.balance(&bob), 7_000);
    assert_eq!(s.client.get_balance(), 500);

    assert_eq!(
        s.client.try_withdraw(&alice),
        Err(Ok(Error::NothingToWithdraw))
    );
    assert_eq!(s.token.balance(&alice), 3_000);

    assert_eq!(s.client.withdraw(&carol), 500);
    assert_eq!(s.client.get_balance(), 0);
    assert_eq!(s.token.balance(&s.client.address), 0);
    assert_config_immutable(&config, &s.client.get_config());
}

#[test]
fn test_withdraw_by_non_participant_rejected() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, 1_000);
    let outsider = Address::generate(&s.env);
    s.client.contribute(&alice, &1_000);
    pass_deadline(&s.env);
    s.client.execute();

    assert_eq!(
        s.client.try_withdraw(&outsider),
        Err(Ok(Error::NothingToWithdraw))
    );
    assert_eq!(s.client.get_balance(), 1_000);
}

#[test]
fn test_unclaimed_refund_stays_claimable() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, 1_000);
    s.client.contribute(&alice, &1_000);
    pass_deadline(&s.env);
    s.client.execute();

    s.env.ledger().set_timestamp(365 * 24 * 3_600);
    assert_eq!(s.client.contribution_of(&alice), 1_000);
    assert_eq!(s.client.withdraw(&alice), 1_000);
}

#[test]
fn test_beneficiary_cannot_withdraw_after_success() {
    let s = setup(1_000);
    let alice = funded_contributor(&s, 1_500);
    s.client.contribute(&alice, &1_500);
    pass_deadline(&s.env);
    s.client.execute();

    assert_eq!(
        s.client.try_withdraw(&s.beneficiary),
        Err(Ok(Error::PhaseNotRefundable))
    );
    assert_eq!(s.token.balance(&s.beneficiary), 1_500);
}
