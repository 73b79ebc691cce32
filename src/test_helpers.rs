//! Fixtures shared by unit and integration tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
        atomic::{
            AtomicUsize,
            Ordering,
        },
    },
};

use async_trait::async_trait;
use color_eyre::eyre::Result;
use rand::{
    SeedableRng,
    rngs::StdRng,
};

use crate::{
    catalog::DollId,
    mint::{
        MintBridge,
        MintCall,
        MintFailure,
        MintReceipt,
        MintTarget,
        WalletCapability,
    },
    session::SessionState,
    wallets::WalletAddress,
};

pub const ALICE: &str = "0xa11ce";
pub const SCRIPTED_BALANCE: u128 = 1_000_000_000;

pub fn alice() -> WalletAddress {
    WalletAddress::parse(ALICE).unwrap_or_else(|err| panic!("fixture address: {err}"))
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn test_target() -> MintTarget {
    MintTarget {
        package_id: String::from("0x7e57"),
        module: String::from("gacha"),
        function: String::from("mint_nft"),
        mint_record_id: String::from("0x4ec0"),
    }
}

/// Wallet that answers mints from a queue and remembers what it was asked.
/// An empty queue answers with a success.
#[derive(Default)]
pub struct ScriptedWallet {
    account: Option<WalletAddress>,
    outcomes: Mutex<VecDeque<Result<MintReceipt, MintFailure>>>,
    calls: Mutex<Vec<MintCall>>,
    account_lookups: AtomicUsize,
    balance_queries: Mutex<Vec<WalletAddress>>,
}

impl ScriptedWallet {
    pub fn connected() -> Self {
        Self {
            account: Some(alice()),
            ..Self::default()
        }
    }

    /// A wallet extension with no account selected.
    pub fn locked() -> Self {
        Self::default()
    }

    pub fn then_succeed(self, digest: &str) -> Self {
        self.push(Ok(MintReceipt {
            digest: digest.to_string(),
        }));
        self
    }

    pub fn then_fail(self, failure: MintFailure) -> Self {
        self.push(Err(failure));
        self
    }

    fn push(&self, outcome: Result<MintReceipt, MintFailure>) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
    }

    pub fn calls(&self) -> Vec<MintCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }

    /// Accounts the balance was asked for, in order.
    pub fn balance_queries(&self) -> Vec<WalletAddress> {
        self.balance_queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WalletCapability for ScriptedWallet {
    async fn current_account(&self) -> Option<WalletAddress> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        self.account.clone()
    }

    async fn sign_and_execute(&self, call: MintCall) -> Result<MintReceipt, MintFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        let next = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front());
        next.unwrap_or_else(|| {
            Ok(MintReceipt {
                digest: String::from("scripted"),
            })
        })
    }

    async fn balance(&self, account: &WalletAddress) -> Result<u128> {
        if let Ok(mut queries) = self.balance_queries.lock() {
            queries.push(account.clone());
        }
        Ok(SCRIPTED_BALANCE)
    }
}

pub fn bridge_with(wallet: Arc<ScriptedWallet>) -> MintBridge {
    let wallet: Arc<dyn WalletCapability> = wallet;
    MintBridge::new(Some(wallet), Some(test_target()))
}

/// Spins and opens one capsule, retrying seeds until `doll` comes out.
pub fn session_with_revealed(doll: DollId) -> SessionState {
    revealed_from(&SessionState::default(), doll)
}

pub fn revealed_from(state: &SessionState, doll: DollId) -> SessionState {
    for seed in 0..1_000 {
        let mut rng = seeded_rng(seed);
        let revealed = state.spin().and_then(|s| s.resolve(&mut rng));
        if let Ok(state) = revealed {
            if state.pending_draw().map(|d| d.id) == Some(doll) {
                return state;
            }
        }
    }
    panic!("no seed below 1000 draws {doll}");
}

/// A fresh session that has collected each of `dolls` once, in order.
pub fn session_owning(dolls: &[DollId]) -> SessionState {
    dolls
        .iter()
        .fold(SessionState::default(), |state, doll| play_round(&state, *doll))
}

/// Plays one round that draws `doll` and collects it.
pub fn play_round(state: &SessionState, doll: DollId) -> SessionState {
    revealed_from(state, doll)
        .collect()
        .unwrap_or_else(|err| panic!("collect {doll}: {err}"))
}
