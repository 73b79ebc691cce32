use thiserror::Error;

use crate::catalog::DollId;

/// Reasons a session transition is refused. A refused transition never
/// changes the session.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SessionError {
    #[error("Insufficient balance: have {balance}, need {cost}")]
    InsufficientFunds { balance: u64, cost: u64 },

    #[error("The machine is busy; collect the current prize first")]
    SpinLocked,

    #[error("No capsule has been dispensed")]
    NothingDispensed,

    #[error("No prize is waiting to be collected")]
    NothingRevealed,

    #[error("Doll {0} is not the pending prize")]
    NotPending(DollId),

    #[error("Doll {0} is not in the collection")]
    NotOwned(DollId),

    #[error("A mint is already in progress")]
    MintInFlight,

    #[error("No mint is in progress")]
    NoMintInFlight,

    #[error("Unknown doll id {0}")]
    UnknownDoll(u8),
}

/// A wallet address that is not a `0x`-prefixed hex string of at most 32 bytes.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Address is empty")]
    Empty,

    #[error("Address has {0} hex digits, at most 64 allowed")]
    TooLong(usize),

    #[error("Address is not valid hex: {0}")]
    InvalidHex(String),
}
