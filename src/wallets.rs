use std::{
    fmt,
    str::FromStr,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};

use crate::{
    error::AddressError,
    deployment::{
        DEFAULT_FUNCTION,
        DEFAULT_MODULE,
    },
    mint::{
        MintCall,
        MintFailure,
        MintReceipt,
        MintTarget,
        WalletCapability,
    },
    network::{
        CONNECT_TIMEOUT,
        LOOKUP_TIMEOUT,
        Network,
        RpcClient,
    },
};

/// Account address, normalised to `0x` followed by 64 lowercase hex digits.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;
        if digits.is_empty() {
            return Err(AddressError::Empty);
        }
        if digits.len() > 64 {
            return Err(AddressError::TooLong(digits.len()));
        }
        let padded = format!("{digits:0>64}").to_ascii_lowercase();
        hex::decode(&padded).map_err(|_| AddressError::InvalidHex(trimmed.to_string()))?;
        Ok(Self(format!("0x{padded}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234…cdef`
    pub fn short(&self) -> String {
        let hex = &self.0[2..];
        format!("0x{}…{}", &hex[..4], &hex[hex.len() - 4..])
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

/// Wallet reached over HTTP through a local signer bridge.
#[derive(Clone)]
pub struct BridgeWallet {
    base_url: String,
    network: Network,
    lookup_timeout: Duration,
    http: reqwest::Client,
    rpc: RpcClient,
}

impl BridgeWallet {
    pub fn new(base_url: impl Into<String>, network: Network, rpc: RpcClient) -> Result<Self> {
        Self::with_timeout(base_url, network, rpc, LOOKUP_TIMEOUT)
    }

    /// `lookup_timeout` bounds account lookups only; signing waits for the
    /// user for as long as it takes.
    pub fn with_timeout(
        base_url: impl Into<String>,
        network: Network,
        rpc: RpcClient,
        lookup_timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(lookup_timeout.min(CONNECT_TIMEOUT))
            .build()
            .wrap_err("failed to build HTTP client for wallet bridge")?;
        Ok(Self {
            base_url,
            network,
            lookup_timeout,
            http,
            rpc,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_account(&self) -> Result<Option<WalletAddress>> {
        let url = format!("{}/account", self.base_url);
        let res = self
            .http
            .get(url)
            .timeout(self.lookup_timeout)
            .send()
            .await
            .wrap_err("wallet bridge request failed")?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(eyre!("wallet bridge responded with {status} for account"));
        }
        let dto: AccountDto = res
            .json()
            .await
            .wrap_err("invalid wallet bridge account payload")?;
        dto.address
            .map(|raw| WalletAddress::parse(&raw))
            .transpose()
            .wrap_err("wallet bridge returned a malformed address")
    }
}

#[async_trait]
impl WalletCapability for BridgeWallet {
    async fn current_account(&self) -> Option<WalletAddress> {
        match self.fetch_account().await {
            Ok(account) => account,
            Err(err) => {
                warn!(?err, "wallet account lookup failed");
                None
            }
        }
    }

    async fn sign_and_execute(&self, call: MintCall) -> Result<MintReceipt, MintFailure> {
        let url = format!("{}/sign-and-execute", self.base_url);
        let body = SignRequestDto::new(self.network, &call);
        debug!(move_call = %call.target, recipient = %call.recipient, "sending mint to wallet bridge");
        let res = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| MintFailure::Transport(err.to_string()))?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .map_err(|err| MintFailure::Transport(err.to_string()))?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(MintFailure::Transport(format!(
                "wallet bridge responded with {status}: {body}"
            )));
        }
        let dto: ExecuteResponseDto = serde_json::from_slice(&bytes)
            .map_err(|err| MintFailure::Transport(format!("invalid execute payload: {err}")))?;
        dto.into_receipt()
    }

    async fn balance(&self, account: &WalletAddress) -> Result<u128> {
        self.rpc.get_balance(account).await
    }
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    address: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignRequestDto {
    network: &'static str,
    transaction: TransactionDto,
}

impl SignRequestDto {
    fn new(network: Network, call: &MintCall) -> Self {
        Self {
            network: network.as_str(),
            transaction: TransactionDto {
                kind: "moveCall",
                target: call.target.clone(),
                arguments: vec![
                    ArgumentDto::Object(call.mint_record.clone()),
                    ArgumentDto::Pure(PureDto::String(call.image.clone())),
                    ArgumentDto::Pure(PureDto::Address(call.recipient.to_string())),
                ],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionDto {
    kind: &'static str,
    target: String,
    arguments: Vec<ArgumentDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ArgumentDto {
    Object(String),
    Pure(PureDto),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum PureDto {
    String(String),
    Address(String),
}

#[derive(Debug, Deserialize)]
struct ExecuteResponseDto {
    digest: String,
    effects: Option<EffectsDto>,
}

#[derive(Debug, Deserialize)]
struct EffectsDto {
    status: StatusDto,
}

#[derive(Debug, Deserialize)]
struct StatusDto {
    status: String,
    error: Option<String>,
}

impl ExecuteResponseDto {
    fn into_receipt(self) -> Result<MintReceipt, MintFailure> {
        let Some(effects) = self.effects else {
            return Err(MintFailure::Rejected(format!(
                "transaction {} reported no effects",
                self.digest
            )));
        };
        if effects.status.status != "success" {
            let reason = effects
                .status
                .error
                .unwrap_or_else(|| effects.status.status.clone());
            return Err(MintFailure::Rejected(reason));
        }
        Ok(MintReceipt {
            digest: self.digest,
        })
    }
}

pub const DEMO_ADDRESS: &str =
    "0x00000000000000000000000000000000000000000000000000000000000decaf";
const DEMO_BALANCE: u128 = 5_000_000_000;

/// Stand-in target for offline play when no deployment is recorded.
pub fn demo_target() -> MintTarget {
    MintTarget {
        package_id: String::from("0x0"),
        module: DEFAULT_MODULE.to_string(),
        function: DEFAULT_FUNCTION.to_string(),
        mint_record_id: String::from("0x0"),
    }
}

/// In-process wallet for offline play. Accepts every mint except for a
/// configurable share that it rejects.
pub struct DemoWallet {
    address: WalletAddress,
    failure_rate: f64,
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl DemoWallet {
    pub fn new(failure_rate: f64) -> Result<Self> {
        let address = WalletAddress::parse(DEMO_ADDRESS)?;
        Ok(Self {
            address,
            failure_rate: if failure_rate.is_nan() {
                0.0
            } else {
                failure_rate.clamp(0.0, 1.0)
            },
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Delay before each mint answers, so the pending state is visible.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    fn roll(&self) -> Result<Option<String>, MintFailure> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| MintFailure::Unavailable(String::from("demo wallet lock poisoned")))?;
        if rng.random_bool(self.failure_rate) {
            return Ok(None);
        }
        let digest: [u8; 32] = rng.random();
        Ok(Some(hex::encode(digest)))
    }
}

#[async_trait]
impl WalletCapability for DemoWallet {
    async fn current_account(&self) -> Option<WalletAddress> {
        Some(self.address.clone())
    }

    async fn sign_and_execute(&self, call: MintCall) -> Result<MintReceipt, MintFailure> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(move_call = %call.target, "demo wallet signing");
        match self.roll()? {
            Some(digest) => Ok(MintReceipt { digest }),
            None => Err(MintFailure::Rejected(String::from(
                "demo wallet declined the transaction",
            ))),
        }
    }

    async fn balance(&self, _account: &WalletAddress) -> Result<u128> {
        Ok(DEMO_BALANCE)
    }
}
