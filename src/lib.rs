pub mod catalog;

pub mod deployment;

pub mod error;

pub mod i18n;

pub mod mint;

pub mod network;

pub mod session;

pub mod wallets;

pub mod test_helpers;

pub use catalog::{
    Doll,
    DollId,
};
pub use error::SessionError;
pub use mint::{
    MintBridge,
    MintOutcome,
    WalletCapability,
};
pub use session::{
    MintOrigin,
    SessionState,
};
