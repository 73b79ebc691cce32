use std::{
    fmt,
    str::FromStr,
    time::Duration,
};

use clap::ValueEnum;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::wallets::WalletAddress;

pub const DEFAULT_TESTNET_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";
pub const DEFAULT_MAINNET_RPC_URL: &str = "https://sui-mainnet.nodeinfra.com:443";
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:9000";

/// Upper bound for display lookups (account, balance). Mint submissions are
/// not bounded.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";
pub const SUI_SYMBOL: &str = "SUI";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, ValueEnum)]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
    Local,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Testnet, Network::Mainnet, Network::Local];

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Local => "local",
        }
    }

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Testnet => DEFAULT_TESTNET_RPC_URL,
            Network::Mainnet => DEFAULT_MAINNET_RPC_URL,
            Network::Local => DEFAULT_LOCAL_RPC_URL,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Testnet => "Testnet",
            Network::Mainnet => "Mainnet",
            Network::Local => "Local",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Network {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            "local" | "localnet" => Ok(Network::Local),
            other => Err(eyre!("Unknown network: {other}")),
        }
    }
}

/// The network to talk to and the fullnode serving it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: String,
}

impl NetworkConfig {
    pub fn new(network: Network, rpc_url: Option<String>) -> Self {
        let rpc_url = rpc_url.unwrap_or_else(|| network.default_rpc_url().to_string());
        Self { network, rpc_url }
    }
}

/// Minimal JSON-RPC client for the fullnode.
#[derive(Clone)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout.min(CONNECT_TIMEOUT))
            .timeout(timeout)
            .build()
            .wrap_err("failed to build HTTP client for fullnode")?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// Total SUI held by `owner`, in MIST.
    pub async fn get_balance(&self, owner: &WalletAddress) -> Result<u128> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "suix_getBalance",
            "params": [owner.as_str(), SUI_COIN_TYPE],
        });
        debug!(%owner, url = %self.url, "querying balance");
        let res = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .wrap_err("fullnode request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read fullnode response body")?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(eyre!("fullnode responded with {status}: {body}"));
        }
        parse_balance_response(&bytes)
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponseDto<T> {
    result: Option<T>,
    error: Option<RpcErrorDto>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorDto {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceDto {
    total_balance: String,
}

pub fn parse_balance_response(bytes: &[u8]) -> Result<u128> {
    let dto: RpcResponseDto<BalanceDto> =
        serde_json::from_slice(bytes).wrap_err("invalid balance payload")?;
    if let Some(err) = dto.error {
        return Err(eyre!("fullnode error {}: {}", err.code, err.message));
    }
    let balance = dto
        .result
        .ok_or_else(|| eyre!("balance payload has no result"))?;
    balance
        .total_balance
        .parse::<u128>()
        .wrap_err_with(|| format!("totalBalance is not a number: {}", balance.total_balance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_per_network() {
        assert_eq!(
            NetworkConfig::new(Network::Testnet, None).rpc_url,
            DEFAULT_TESTNET_RPC_URL
        );
        assert_eq!(
            NetworkConfig::new(Network::Mainnet, None).rpc_url,
            DEFAULT_MAINNET_RPC_URL
        );
        let custom = NetworkConfig::new(Network::Local, Some(String::from("http://node:9000")));
        assert_eq!(custom.rpc_url, "http://node:9000");
        assert_eq!(Network::default(), Network::Testnet);
    }

    #[test]
    fn network_names_round_trip() {
        for network in Network::ALL {
            assert_eq!(network.as_str().parse::<Network>().unwrap(), network);
        }
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn balance_response_parses_decimal_string() {
        let raw = br#"{"jsonrpc":"2.0","id":1,"result":{"coinType":"0x2::sui::SUI","coinObjectCount":2,"totalBalance":"1500000000","lockedBalance":{}}}"#;
        assert_eq!(parse_balance_response(raw).unwrap(), 1_500_000_000);
    }

    #[test]
    fn balance_response_surfaces_rpc_errors() {
        let raw = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#;
        let err = parse_balance_response(raw).unwrap_err();
        assert!(err.to_string().contains("Invalid params"));

        let raw = br#"{"jsonrpc":"2.0","id":1,"result":{"totalBalance":"lots"}}"#;
        assert!(parse_balance_response(raw).is_err());
    }
}
