extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    token, vec, Address, Env, IntoVal, TryIntoVal,
};

use crate::events::{ContributionReceived, LedgerCreated, PayoutSent, WithdrawalIssued};
use crate::test::{funded_contributor, pass_deadline, setup, DURATION, ONE_UNIT};
use crate::{CrowdFund, FundingWindow};

#[test]
fn test_ledger_created_event() {
    let env = Env::default();
    let token_admin = Address::generate(&env);
    let token_addr = env.register_stellar_asset_contract_v2(token_admin).address();
    let beneficiary = Address::generate(&env);

    let contract_id = env.register(
        CrowdFund,
        (
            token_addr,
            beneficiary.clone(),
            ONE_UNIT,
            FundingWindow::Duration(DURATION),
        ),
    );

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, contract_id);
    assert_eq!(
        last_event.1,
        vec![&env, symbol_short!("created").into_val(&env)]
    );
    let event_data: LedgerCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        LedgerCreated {
            beneficiary,
            threshold: ONE_UNIT,
            deadline: DURATION,
        }
    );
}

#[test]
fn test_contribution_received_event() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, 2_000);

    s.client.contribute(&alice, &2_000);

    let all_events = s.env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("contrib"),)
    assert_eq!(last_event.0, s.client.address);
    let expected_topics = vec![&s.env, symbol_short!("contrib").into_val(&s.env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: ContributionReceived = last_event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        ContributionReceived {
            contributor: alice,
            amount: 2_000,
        }
    );
}

#[test]
fn test_collection_open_event() {
    let s = setup(ONE_UNIT);
    pass_deadline(&s.env);

    s.client.execute();

    let all_events = s.env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, s.client.address);
    let expected_topics = vec![&s.env, symbol_short!("open").into_val(&s.env)];
    assert_eq!(last_event.1, expected_topics);
    assert!(last_event.2.is_void());
}

#[test]
fn test_payout_sent_event() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, ONE_UNIT);
    s.client.contribute(&alice, &ONE_UNIT);
    pass_deadline(&s.env);

    s.client.execute();

    let all_events = s.env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, s.client.address);
    let expected_topics = vec![&s.env, symbol_short!("payout").into_val(&s.env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: PayoutSent = last_event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        PayoutSent {
            recipient: s.beneficiary.clone(),
            amount: ONE_UNIT,
        }
    );
}

/// threshold = 1 unit, A contributes 1000, deadline passes, execute opens the
/// ledger for refund, A withdraws and the event carries (A, 1000).
#[test]
fn test_withdrawal_issued_event() {
    let s = setup(ONE_UNIT);
    let alice = funded_contributor(&s, 1_000);
    s.client.contribute(&alice, &1_000);
    pass_deadline(&s.env);
    s.client.execute();
    assert_eq!(s.client.get_balance(), 1_000);

    let refunded = s.client.withdraw(&alice);
    assert_eq!(refunded, 1_000);

    let all_events = s.env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, s.client.address);
    let expected_topics = vec![&s.env, symbol_short!("withdrawn").into_val(&s.env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: WithdrawalIssued = last_event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        WithdrawalIssued {
            contributor: alice.clone(),
            amount: 1_000,
        }
    );

    assert_eq!(s.client.get_balance(), 0);
    let token_client = token::Client::new(&s.env, &s.token.address);
    assert_eq!(token_client.balance(&alice), 1_000);
}
