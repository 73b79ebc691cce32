#![allow(non_snake_case)]
use std::collections::BTreeSet;

use gacha_machine::{
    DollId,
    SessionError,
    SessionState,
    catalog,
    session::{
        MachinePhase,
        SessionConfig,
    },
    test_helpers::*,
};

#[test]
fn spin__charges_one_play_and_dispenses_a_capsule() {
    // given
    let state = SessionState::default();

    // when
    let actual = state.spin().unwrap();

    // then
    assert_eq!(actual.balance(), 900);
    assert_eq!(actual.phase(), MachinePhase::Dispensed);
    assert_eq!(actual.capsules(), 14);
    assert!(!actual.can_spin());
}

#[test]
fn spin__full_round_collects_the_drawn_doll() {
    // given
    let rabbit = DollId(1);
    let state = session_with_revealed(rabbit);
    assert_eq!(state.balance(), 900);
    assert_eq!(state.pending_draw().map(|d| d.name), Some("Rabbit"));

    // when
    let actual = state.collect().unwrap();

    // then
    assert_eq!(actual.balance(), 900);
    assert_eq!(actual.ledger().count(rabbit), 1);
    assert_eq!(actual.ledger().total(), 1);
    assert_eq!(actual.phase(), MachinePhase::Ready);
    assert!(actual.can_spin());
}

#[test]
fn spin__ten_plays_exhaust_the_starting_balance() {
    // given
    let mut rng = seeded_rng(7);
    let mut state = SessionState::default();
    for _ in 0..10 {
        state = state
            .spin()
            .and_then(|s| s.resolve(&mut rng))
            .and_then(|s| s.collect())
            .unwrap();
    }
    assert_eq!(state.balance(), 0);
    assert_eq!(state.ledger().total(), 10);

    // when
    let actual = state.spin();

    // then
    assert_eq!(
        actual,
        Err(SessionError::InsufficientFunds {
            balance: 0,
            cost: 100
        })
    );
    assert!(!state.can_afford());
}

#[test]
fn spin__refused_when_balance_below_cost() {
    // given
    let state = SessionState::new(SessionConfig {
        starting_balance: 99,
        ..SessionConfig::default()
    });

    // when
    let actual = state.spin();

    // then
    assert_eq!(
        actual,
        Err(SessionError::InsufficientFunds {
            balance: 99,
            cost: 100
        })
    );
    assert_eq!(state.balance(), 99);
    assert_eq!(state.phase(), MachinePhase::Ready);
}

#[test]
fn spin__locked_until_the_prize_is_collected() {
    // given
    let dispensed = SessionState::default().spin().unwrap();
    let revealed = session_with_revealed(DollId(3));

    // when
    let while_dispensed = dispensed.spin();
    let while_revealed = revealed.spin();

    // then
    assert_eq!(while_dispensed, Err(SessionError::SpinLocked));
    assert_eq!(while_revealed, Err(SessionError::SpinLocked));
    assert_eq!(revealed.balance(), 900);
}

#[test]
fn spin__capsule_count_stops_at_zero() {
    // given
    let mut rng = seeded_rng(1);
    let mut state = SessionState::new(SessionConfig {
        starting_balance: 10_000,
        capsules: 2,
        ..SessionConfig::default()
    });

    // when
    for _ in 0..3 {
        state = state
            .spin()
            .and_then(|s| s.resolve(&mut rng))
            .and_then(|s| s.collect())
            .unwrap();
    }

    // then
    assert_eq!(state.capsules(), 0);
    assert_eq!(state.balance(), 9_700);
}

#[test]
fn resolve__requires_a_dispensed_capsule() {
    // given
    let mut rng = seeded_rng(0);
    let ready = SessionState::default();
    let revealed = session_with_revealed(DollId(2));

    // when
    let from_ready = ready.resolve(&mut rng);
    let from_revealed = revealed.resolve(&mut rng);

    // then
    assert_eq!(from_ready, Err(SessionError::NothingDispensed));
    assert_eq!(from_revealed, Err(SessionError::NothingDispensed));
}

#[test]
fn resolve__draws_every_catalog_entry() {
    // given
    let mut rng = seeded_rng(42);
    let dispensed = SessionState::default().spin().unwrap();
    let mut seen = BTreeSet::new();

    // when
    for _ in 0..500 {
        let revealed = dispensed.resolve(&mut rng).unwrap();
        if let MachinePhase::Revealed(id) = revealed.phase() {
            seen.insert(id);
        }
    }

    // then
    let expected: BTreeSet<DollId> = catalog::all().iter().map(|d| d.id).collect();
    assert_eq!(seen, expected);
}

#[test]
fn collect__requires_a_revealed_prize() {
    // given
    let ready = SessionState::default();
    let dispensed = ready.spin().unwrap();

    // when
    let from_ready = ready.collect();
    let from_dispensed = dispensed.collect();

    // then
    assert_eq!(from_ready, Err(SessionError::NothingRevealed));
    assert_eq!(from_dispensed, Err(SessionError::NothingRevealed));
}

#[test]
fn collect__same_doll_twice_counts_two() {
    // given
    let teddy = DollId(2);

    // when
    let actual = session_owning(&[teddy, teddy]);

    // then
    assert_eq!(actual.ledger().count(teddy), 2);
    assert_eq!(actual.ledger().unique(), 1);
    assert_eq!(actual.balance(), 800);
}

#[test]
fn decline__keeps_the_prize() {
    // given
    let capoo = DollId(4);
    let state = session_with_revealed(capoo);

    // when
    let actual = state.decline().unwrap();

    // then
    assert_eq!(actual, state.collect().unwrap());
    assert_eq!(actual.ledger().count(capoo), 1);
}
