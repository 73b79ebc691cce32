use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use gacha_machine::{
    deployment,
    i18n::Language,
    network::{
        Network,
        NetworkConfig,
    },
    session::SessionConfig,
};
use std::{
    fs,
    path::PathBuf,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

const LOG_FILE: &str = "gacha.log";

#[derive(Debug, Parser)]
#[command(name = "gacha", version, about = "Capsule machine collectible game for the terminal")]
struct Cli {
    /// Network the NFT package is deployed on
    #[arg(long, value_enum, env = "GACHA_NETWORK", default_value = "testnet")]
    network: Network,

    /// Override the fullnode RPC URL for the selected network
    #[arg(long, env = "GACHA_RPC_URL")]
    rpc_url: Option<String>,

    /// Local wallet bridge that signs transactions
    #[arg(long, env = "GACHA_WALLET_BRIDGE", conflicts_with = "demo_wallet")]
    wallet_bridge: Option<String>,

    /// Play offline with an in-process wallet
    #[arg(long)]
    demo_wallet: bool,

    /// Share of demo mints that are rejected, 0 to 1
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    demo_failure_rate: f64,

    #[arg(long)]
    deployments_dir: Option<String>,

    #[arg(long, default_value = "logs")]
    log_dir: String,

    #[arg(long, default_value = "en", value_parser = parse_language)]
    language: Language,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record where the NFT package is published on the selected network
    RecordDeployment {
        #[arg(long)]
        package_id: String,
        #[arg(long)]
        mint_record_id: String,
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        function: Option<String>,
    },
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is outside 0..=1"))
    }
}

fn parse_language(raw: &str) -> Result<Language, String> {
    Language::parse(raw).ok_or_else(|| format!("unsupported language: {raw} (use en or zh)"))
}

fn init_tracing(log_dir: &str) -> Result<WorkerGuard> {
    let dir = PathBuf::from(shellexpand::tilde(log_dir).into_owned());
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| eyre!("failed to install tracing subscriber: {err}"))?;
    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(&cli.log_dir)?;
    tracing::info!(network = %cli.network, "starting gacha client");

    let deployments_root = deployment::resolve_root(cli.deployments_dir.as_deref());
    deployment::ensure_structure(&deployments_root)?;
    let network = NetworkConfig::new(cli.network, cli.rpc_url);

    if let Some(Command::RecordDeployment {
        package_id,
        mint_record_id,
        module,
        function,
    }) = cli.command
    {
        let record = deployment::record_deployment(
            &deployments_root,
            network.network,
            package_id,
            mint_record_id,
            &network.rpc_url,
            module.as_deref(),
            function.as_deref(),
        )?;
        println!(
            "Recorded {}::{}::{} on {}",
            record.package_id, record.module, record.function, network.network
        );
        return Ok(());
    }

    let wallet = match (cli.wallet_bridge, cli.demo_wallet) {
        (Some(url), _) => client::WalletConfig::Bridge { url },
        (None, true) => client::WalletConfig::Demo {
            failure_rate: cli.demo_failure_rate,
        },
        (None, false) => client::WalletConfig::Disconnected,
    };
    client::run_app(client::AppConfig {
        session: SessionConfig::default(),
        network,
        wallet,
        deployments_root,
        language: cli.language,
    })
    .await
}
