#![allow(non_snake_case)]
use gacha_machine::{
    DollId,
    SessionError,
    session::Ledger,
};

fn ledger_with(entries: &[(DollId, u32)]) -> Ledger {
    let mut ledger = Ledger::new();
    for (id, count) in entries {
        for _ in 0..*count {
            ledger.add(*id);
        }
    }
    ledger
}

#[test]
fn reconcile_mint__success_removes_one_copy() {
    // given
    let mut ledger = ledger_with(&[(DollId(3), 2)]);

    // when
    ledger.reconcile_mint(DollId(3), true).unwrap();

    // then
    assert_eq!(ledger.count(DollId(3)), 1);
    assert_eq!(ledger.total(), 1);
}

#[test]
fn reconcile_mint__last_copy_removes_the_entry() {
    // given
    let mut ledger = ledger_with(&[(DollId(5), 1), (DollId(1), 1)]);

    // when
    ledger.reconcile_mint(DollId(5), true).unwrap();

    // then
    assert!(!ledger.contains(DollId(5)));
    assert_eq!(ledger.unique(), 1);
    assert_eq!(ledger.iter().collect::<Vec<_>>(), vec![(DollId(1), 1)]);
}

#[test]
fn reconcile_mint__failure_leaves_ledger_unchanged() {
    // given
    let mut ledger = ledger_with(&[(DollId(2), 3)]);
    let before = ledger.clone();

    // when
    ledger.reconcile_mint(DollId(2), false).unwrap();

    // then
    assert_eq!(ledger, before);
}

#[test]
fn reconcile_mint__refuses_unowned_doll() {
    // given
    let mut ledger = ledger_with(&[(DollId(1), 1)]);

    // when
    let actual = ledger.reconcile_mint(DollId(4), true);

    // then
    assert_eq!(actual, Err(SessionError::NotOwned(DollId(4))));
    assert_eq!(ledger.count(DollId(1)), 1);
}

#[test]
fn iter__orders_by_catalog_id() {
    // given
    let ledger = ledger_with(&[(DollId(4), 1), (DollId(2), 2), (DollId(1), 1)]);

    // when
    let ids: Vec<DollId> = ledger.iter().map(|(id, _)| id).collect();

    // then
    assert_eq!(ids, vec![DollId(1), DollId(2), DollId(4)]);
    assert_eq!(ledger.total(), 4);
}
