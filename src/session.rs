//! Session state and the pure transitions that drive it.
//!
//! Every transition borrows the current [`SessionState`] and returns the next
//! one. A refused transition returns a [`SessionError`] and the caller keeps
//! the state it already had, so nothing is ever half-applied.
//!
//! ```text
//!            spin            resolve                collect / decline
//!  Ready ──────────▶ Dispensed ──────▶ Revealed(doll) ───────────────────▶ Ready
//!                                          │   fresh-draw mint succeeded     ▲
//!                                          └─────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use rand::Rng;

use crate::{
    catalog::{
        self,
        COST_PER_PLAY,
        DOLLS,
        Doll,
        DollId,
        STARTING_BALANCE,
        STARTING_CAPSULES,
    },
    error::SessionError,
    i18n::Language,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionConfig {
    pub starting_balance: u64,
    pub cost_per_play: u64,
    pub capsules: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: STARTING_BALANCE,
            cost_per_play: COST_PER_PLAY,
            capsules: STARTING_CAPSULES,
        }
    }
}

/// Owned dolls that have not been minted. Every present key has a count of
/// at least one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ledger {
    counts: BTreeMap<DollId, u32>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, id: DollId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: DollId) -> bool {
        self.counts.contains_key(&id)
    }

    pub fn add(&mut self, id: DollId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Applies the outcome of a mint that was taken from the ledger. Success
    /// removes one copy; failure leaves the ledger as it was.
    pub fn reconcile_mint(&mut self, id: DollId, success: bool) -> Result<(), SessionError> {
        let Some(count) = self.counts.get_mut(&id) else {
            return Err(SessionError::NotOwned(id));
        };
        if !success {
            return Ok(());
        }
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&id);
        }
        Ok(())
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| u64::from(*c)).sum()
    }

    /// Number of distinct dolls owned.
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DollId, u32)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }
}

/// Where the machine is in a single play. Only `Ready` accepts a spin.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MachinePhase {
    #[default]
    Ready,
    /// Paid for; the capsule is in the tray but has not been opened.
    Dispensed,
    /// The pending draw.
    Revealed(DollId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MintOrigin {
    /// The prize that was just revealed and never entered the ledger.
    FreshDraw,
    /// A copy taken from the collection.
    Ledger,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingMint {
    pub doll: DollId,
    pub origin: MintOrigin,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CollectionView {
    #[default]
    OwnedOnly,
    ShowAll,
}

impl CollectionView {
    pub fn toggled(self) -> Self {
        match self {
            CollectionView::OwnedOnly => CollectionView::ShowAll,
            CollectionView::ShowAll => CollectionView::OwnedOnly,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionState {
    config: SessionConfig,
    balance: u64,
    ledger: Ledger,
    phase: MachinePhase,
    capsules: u32,
    minting: Option<PendingMint>,
    language: Language,
    view: CollectionView,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            balance: config.starting_balance,
            ledger: Ledger::new(),
            phase: MachinePhase::Ready,
            capsules: config.capsules,
            minting: None,
            language: Language::default(),
            view: CollectionView::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn cost_per_play(&self) -> u64 {
        self.config.cost_per_play
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn phase(&self) -> MachinePhase {
        self.phase
    }

    pub fn capsules(&self) -> u32 {
        self.capsules
    }

    pub fn minting(&self) -> Option<PendingMint> {
        self.minting
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn view(&self) -> CollectionView {
        self.view
    }

    /// The revealed prize waiting to be collected or minted.
    pub fn pending_draw(&self) -> Option<&'static Doll> {
        match self.phase {
            MachinePhase::Revealed(id) => catalog::get(id).ok(),
            _ => None,
        }
    }

    /// The spin-eligibility flag.
    pub fn can_spin(&self) -> bool {
        self.phase == MachinePhase::Ready && self.minting.is_none()
    }

    pub fn can_afford(&self) -> bool {
        self.balance >= self.config.cost_per_play
    }

    /// Pays for one play and locks the machine until the prize is collected.
    pub fn spin(&self) -> Result<Self, SessionError> {
        if self.minting.is_some() {
            return Err(SessionError::MintInFlight);
        }
        if self.phase != MachinePhase::Ready {
            return Err(SessionError::SpinLocked);
        }
        let cost = self.config.cost_per_play;
        let Some(balance) = self.balance.checked_sub(cost) else {
            return Err(SessionError::InsufficientFunds {
                balance: self.balance,
                cost,
            });
        };
        let mut next = self.clone();
        next.balance = balance;
        next.phase = MachinePhase::Dispensed;
        next.capsules = next.capsules.saturating_sub(1);
        Ok(next)
    }

    /// Opens the dispensed capsule: one catalog entry, chosen uniformly.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self, SessionError> {
        if self.phase != MachinePhase::Dispensed {
            return Err(SessionError::NothingDispensed);
        }
        let doll = &DOLLS[rng.random_range(0..DOLLS.len())];
        let mut next = self.clone();
        next.phase = MachinePhase::Revealed(doll.id);
        Ok(next)
    }

    /// Moves the pending draw into the ledger and unlocks the machine.
    pub fn collect(&self) -> Result<Self, SessionError> {
        if self.minting.is_some() {
            return Err(SessionError::MintInFlight);
        }
        let MachinePhase::Revealed(id) = self.phase else {
            return Err(SessionError::NothingRevealed);
        };
        let mut next = self.clone();
        next.ledger.add(id);
        next.phase = MachinePhase::Ready;
        Ok(next)
    }

    /// Answering "no" to the mint prompt keeps the prize.
    pub fn decline(&self) -> Result<Self, SessionError> {
        self.collect()
    }

    /// Validates a mint request and marks it in flight. The returned
    /// [`PendingMint`] is what the wallet call is made for.
    pub fn begin_mint(
        &self,
        doll: DollId,
        origin: MintOrigin,
    ) -> Result<(Self, PendingMint), SessionError> {
        catalog::get(doll)?;
        if self.minting.is_some() {
            return Err(SessionError::MintInFlight);
        }
        match origin {
            MintOrigin::FreshDraw => {
                if self.phase != MachinePhase::Revealed(doll) {
                    return Err(SessionError::NotPending(doll));
                }
            }
            MintOrigin::Ledger => {
                if !self.ledger.contains(doll) {
                    return Err(SessionError::NotOwned(doll));
                }
            }
        }
        let pending = PendingMint { doll, origin };
        let mut next = self.clone();
        next.minting = Some(pending);
        Ok((next, pending))
    }

    /// Applies the wallet's answer to the mint in flight.
    ///
    /// A fresh-draw success clears the pending draw without touching the
    /// ledger. A ledger success removes one copy. Failures only clear the
    /// in-flight marker.
    pub fn finish_mint(&self, success: bool) -> Result<Self, SessionError> {
        let Some(pending) = self.minting else {
            return Err(SessionError::NoMintInFlight);
        };
        let mut next = self.clone();
        next.minting = None;
        match pending.origin {
            MintOrigin::FreshDraw => {
                if success {
                    next.phase = MachinePhase::Ready;
                }
            }
            MintOrigin::Ledger => next.ledger.reconcile_mint(pending.doll, success)?,
        }
        Ok(next)
    }

    pub fn toggle_language(&self) -> Self {
        let mut next = self.clone();
        next.language = next.language.toggled();
        next
    }

    pub fn set_language(&self, language: Language) -> Self {
        let mut next = self.clone();
        next.language = language;
        next
    }

    pub fn toggle_view(&self) -> Self {
        let mut next = self.clone();
        next.view = next.view.toggled();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_removes_key_at_zero() {
        let mut ledger = Ledger::new();
        let rabbit = DollId(1);
        ledger.add(rabbit);
        ledger.reconcile_mint(rabbit, true).unwrap();
        assert!(!ledger.contains(rabbit));
        assert_eq!(ledger.unique(), 0);
        assert_eq!(
            ledger.reconcile_mint(rabbit, true),
            Err(SessionError::NotOwned(rabbit))
        );
    }

    #[test]
    fn ledger_failure_keeps_count() {
        let mut ledger = Ledger::new();
        ledger.add(DollId(2));
        ledger.add(DollId(2));
        ledger.reconcile_mint(DollId(2), false).unwrap();
        assert_eq!(ledger.count(DollId(2)), 2);
        assert_eq!(ledger.total(), 2);
    }

    #[test]
    fn finish_without_mint_is_refused() {
        let state = SessionState::default();
        assert_eq!(state.finish_mint(true), Err(SessionError::NoMintInFlight));
    }

    #[test]
    fn toggles_flip_preferences() {
        let state = SessionState::default().toggle_language().toggle_view();
        assert_eq!(state.language(), Language::Zh);
        assert_eq!(state.view(), CollectionView::ShowAll);
        assert_eq!(state.set_language(Language::En).language(), Language::En);
    }
}
