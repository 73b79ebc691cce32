#![allow(non_snake_case)]
use gacha_machine::{
    DollId,
    MintOrigin,
    SessionState,
    session::MachinePhase,
    test_helpers::*,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Intent {
    Spin,
    Resolve(u64),
    Collect,
    Decline,
    BeginMint(u8, MintOrigin),
    FinishMint(bool),
}

fn intent() -> impl Strategy<Value = Intent> {
    let origin = prop_oneof![Just(MintOrigin::FreshDraw), Just(MintOrigin::Ledger)];
    prop_oneof![
        3 => Just(Intent::Spin),
        3 => any::<u64>().prop_map(Intent::Resolve),
        2 => Just(Intent::Collect),
        1 => Just(Intent::Decline),
        2 => (0u8..=6, origin).prop_map(|(id, origin)| Intent::BeginMint(id, origin)),
        2 => any::<bool>().prop_map(Intent::FinishMint),
    ]
}

fn apply(state: &SessionState, intent: &Intent) -> Option<SessionState> {
    let next = match intent {
        Intent::Spin => state.spin(),
        Intent::Resolve(seed) => state.resolve(&mut seeded_rng(*seed)),
        Intent::Collect => state.collect(),
        Intent::Decline => state.decline(),
        Intent::BeginMint(id, origin) => state.begin_mint(DollId(*id), *origin).map(|(s, _)| s),
        Intent::FinishMint(success) => state.finish_mint(*success),
    };
    next.ok()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]
    #[test]
    fn session__balance_only_moves_down_by_the_cost_of_a_spin(
        intents in prop::collection::vec(intent(), 0..60)
    ) {
        let mut state = SessionState::default();
        for intent in &intents {
            let Some(next) = apply(&state, intent) else { continue };
            match intent {
                Intent::Spin => prop_assert_eq!(
                    next.balance(),
                    state.balance() - state.cost_per_play()
                ),
                _ => prop_assert_eq!(next.balance(), state.balance()),
            }
            state = next;
        }
    }

    #[test]
    fn session__spin_accepted_only_when_ready_and_affordable(
        intents in prop::collection::vec(intent(), 0..60)
    ) {
        let mut state = SessionState::default();
        for intent in &intents {
            let expected = state.can_spin() && state.can_afford();
            prop_assert_eq!(state.spin().is_ok(), expected);
            if let Some(next) = apply(&state, intent) {
                state = next;
            }
        }
    }

    #[test]
    fn session__ledger_never_holds_an_empty_entry(
        intents in prop::collection::vec(intent(), 0..80)
    ) {
        let mut state = SessionState::default();
        for intent in &intents {
            if let Some(next) = apply(&state, intent) {
                state = next;
            }
            for (id, count) in state.ledger().iter() {
                prop_assert!(count >= 1, "{} has count {}", id, count);
            }
        }
    }

    #[test]
    fn session__mint_in_flight_locks_the_machine(
        intents in prop::collection::vec(intent(), 0..60)
    ) {
        let mut state = SessionState::default();
        for intent in &intents {
            if let Some(next) = apply(&state, intent) {
                state = next;
            }
            if state.minting().is_some() {
                prop_assert!(!state.can_spin());
                prop_assert!(state.spin().is_err());
                prop_assert!(state.collect().is_err());
            }
            if let MachinePhase::Revealed(id) = state.phase() {
                prop_assert_eq!(state.pending_draw().map(|d| d.id), Some(id));
            }
        }
    }

    #[test]
    fn session__every_paid_play_is_accounted_for(
        intents in prop::collection::vec(intent(), 0..80)
    ) {
        // collected copies plus minted copies plus a prize still in the tray
        let mut state = SessionState::default();
        let mut minted = 0u64;
        for intent in &intents {
            let Some(next) = apply(&state, intent) else { continue };
            if let (Intent::FinishMint(true), Some(_)) = (intent, state.minting()) {
                minted += 1;
            }
            state = next;
        }
        let plays = (state.config().starting_balance - state.balance()) / state.cost_per_play();
        let in_tray = u64::from(state.phase() != MachinePhase::Ready);
        prop_assert_eq!(plays, state.ledger().total() + minted + in_tray);
    }
}
