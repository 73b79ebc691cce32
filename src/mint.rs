//! Mint bridge: hands a collectible to an external wallet for minting and
//! reconciles the session with the answer.

use std::{
    fmt,
    sync::Arc,
};

use async_trait::async_trait;
use color_eyre::eyre::Result;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tracing::{
    info,
    warn,
};

use crate::{
    catalog::{
        self,
        DollId,
    },
    error::SessionError,
    session::{
        MintOrigin,
        PendingMint,
        SessionState,
    },
    wallets::WalletAddress,
};

/// The move function that mints a doll and the shared object it records
/// mints in.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MintTarget {
    pub package_id: String,
    pub module: String,
    pub function: String,
    pub mint_record_id: String,
}

impl MintTarget {
    /// `<package>::<module>::<function>`
    pub fn call_target(&self) -> String {
        format!("{}::{}::{}", self.package_id, self.module, self.function)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintCall {
    pub target: String,
    pub mint_record: String,
    pub image: String,
    pub recipient: WalletAddress,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintReceipt {
    pub digest: String,
}

/// An attempt that reached the wallet, or should have, and did not mint.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MintFailure {
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Wallet unreachable: {0}")]
    Transport(String),

    #[error("Minting unavailable: {0}")]
    Unavailable(String),
}

/// A mint that was refused before anything was sent.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MintError {
    #[error("No wallet connected")]
    NoWallet,

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MintOutcome {
    Minted(MintReceipt),
    Failed(MintFailure),
}

impl MintOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MintOutcome::Minted(_))
    }
}

impl fmt::Display for MintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MintOutcome::Minted(receipt) => write!(f, "minted ({})", receipt.digest),
            MintOutcome::Failed(failure) => write!(f, "failed: {failure}"),
        }
    }
}

/// The wallet as seen by the game. Keys and signing stay on the other side.
#[async_trait]
pub trait WalletCapability: Send + Sync {
    async fn current_account(&self) -> Option<WalletAddress>;

    async fn sign_and_execute(&self, call: MintCall) -> Result<MintReceipt, MintFailure>;

    /// Native coin balance of `account`, for display.
    async fn balance(&self, account: &WalletAddress) -> Result<u128>;
}

/// A mint that has been accepted by the session and is waiting on the wallet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintTicket {
    pub pending: PendingMint,
    pub recipient: WalletAddress,
}

#[derive(Clone)]
pub struct MintBridge {
    wallet: Option<Arc<dyn WalletCapability>>,
    target: Option<MintTarget>,
}

impl MintBridge {
    pub fn new(wallet: Option<Arc<dyn WalletCapability>>, target: Option<MintTarget>) -> Self {
        Self { wallet, target }
    }

    pub fn disconnected() -> Self {
        Self::new(None, None)
    }

    pub fn wallet(&self) -> Option<&Arc<dyn WalletCapability>> {
        self.wallet.as_ref()
    }

    pub async fn account(&self) -> Option<WalletAddress> {
        match &self.wallet {
            Some(wallet) => wallet.current_account().await,
            None => None,
        }
    }

    /// Checks the wallet is present and marks the mint in flight.
    pub fn begin(
        &self,
        state: &SessionState,
        account: Option<WalletAddress>,
        doll: DollId,
        origin: MintOrigin,
    ) -> Result<(SessionState, MintTicket), MintError> {
        let recipient = match (&self.wallet, account) {
            (Some(_), Some(account)) => account,
            _ => return Err(MintError::NoWallet),
        };
        let (next, pending) = state.begin_mint(doll, origin)?;
        info!(%doll, ?origin, %recipient, "mint started");
        Ok((next, MintTicket { pending, recipient }))
    }

    pub fn call_for(&self, ticket: &MintTicket) -> Result<MintCall, MintFailure> {
        let target = self.target.as_ref().ok_or_else(|| {
            MintFailure::Unavailable(String::from(
                "no deployment recorded for the selected network",
            ))
        })?;
        let doll = catalog::get(ticket.pending.doll)
            .map_err(|err| MintFailure::Unavailable(err.to_string()))?;
        Ok(MintCall {
            target: target.call_target(),
            mint_record: target.mint_record_id.clone(),
            image: doll.image.to_string(),
            recipient: ticket.recipient.clone(),
        })
    }

    /// Sends the mint to the wallet. Every failure is reported as an
    /// outcome, never as an error.
    pub async fn submit(&self, ticket: &MintTicket) -> MintOutcome {
        let Some(wallet) = &self.wallet else {
            return MintOutcome::Failed(MintFailure::Unavailable(String::from(
                "wallet disconnected",
            )));
        };
        let call = match self.call_for(ticket) {
            Ok(call) => call,
            Err(failure) => return MintOutcome::Failed(failure),
        };
        match wallet.sign_and_execute(call).await {
            Ok(receipt) => {
                info!(doll = %ticket.pending.doll, digest = %receipt.digest, "mint executed");
                MintOutcome::Minted(receipt)
            }
            Err(failure) => {
                warn!(doll = %ticket.pending.doll, %failure, "mint failed");
                MintOutcome::Failed(failure)
            }
        }
    }

    pub fn finish(
        state: &SessionState,
        outcome: &MintOutcome,
    ) -> Result<SessionState, SessionError> {
        state.finish_mint(outcome.is_success())
    }

    /// Presence check, begin, submit and finish in one call.
    pub async fn mint(
        &self,
        state: &SessionState,
        doll: DollId,
        origin: MintOrigin,
    ) -> Result<(SessionState, MintOutcome), MintError> {
        let account = self.account().await;
        let (in_flight, ticket) = self.begin(state, account, doll, origin)?;
        let outcome = self.submit(&ticket).await;
        let next = Self::finish(&in_flight, &outcome)?;
        Ok((next, outcome))
    }
}

impl fmt::Debug for MintBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintBridge")
            .field("wallet", &self.wallet.is_some())
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> MintTarget {
        MintTarget {
            package_id: String::from("0xabc"),
            module: String::from("gacha"),
            function: String::from("mint_nft"),
            mint_record_id: String::from("0xdef"),
        }
    }

    #[test]
    fn call_target_joins_path() {
        assert_eq!(target().call_target(), "0xabc::gacha::mint_nft");
    }

    #[test]
    fn call_for_requires_deployment() {
        let bridge = MintBridge::disconnected();
        let ticket = MintTicket {
            pending: PendingMint {
                doll: DollId(1),
                origin: MintOrigin::FreshDraw,
            },
            recipient: WalletAddress::parse("0x1").unwrap(),
        };
        assert!(matches!(
            bridge.call_for(&ticket),
            Err(MintFailure::Unavailable(_))
        ));

        let bridge = MintBridge::new(None, Some(target()));
        let call = bridge.call_for(&ticket).unwrap();
        assert_eq!(call.mint_record, "0xdef");
        assert_eq!(call.image, catalog::DOLLS[0].image);
    }

    #[test]
    fn begin_without_wallet_is_refused() {
        let bridge = MintBridge::new(None, Some(target()));
        let state = SessionState::default();
        let account = WalletAddress::parse("0x1").ok();
        assert_eq!(
            bridge.begin(&state, account, DollId(1), MintOrigin::Ledger),
            Err(MintError::NoWallet)
        );
    }
}
