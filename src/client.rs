use crate::ui;
use chrono::{
    DateTime,
    Local,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use gacha_machine::{
    catalog::{
        self,
        DOLLS,
        Doll,
        DollId,
    },
    deployment::DeploymentStore,
    error::SessionError,
    i18n::{
        Language,
        Text,
    },
    mint::{
        MintBridge,
        MintError,
        MintOutcome,
        MintTicket,
        WalletCapability,
    },
    network::{
        Network,
        NetworkConfig,
        RpcClient,
    },
    session::{
        CollectionView,
        MachinePhase,
        MintOrigin,
        SessionConfig,
        SessionState,
    },
    wallets::{
        self,
        BridgeWallet,
        DemoWallet,
        WalletAddress,
    },
};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use std::{
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    info,
    warn,
};

const TOAST_HISTORY: usize = 50;
const BALANCE_REFRESH: Duration = Duration::from_secs(15);
const DEMO_LATENCY: Duration = Duration::from_millis(800);

#[derive(Clone, Debug)]
pub enum WalletConfig {
    Disconnected,
    Bridge { url: String },
    Demo { failure_rate: f64 },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    pub deployments_root: PathBuf,
    pub language: Language,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
    pub at: DateTime<Local>,
}

impl Toast {
    fn new(title: String, description: String, variant: ToastVariant) -> Self {
        Self {
            title,
            description,
            variant,
            at: Local::now(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CollectionEntry {
    pub doll: &'static Doll,
    pub count: u32,
}

impl CollectionEntry {
    pub fn owned(&self) -> bool {
        self.count > 0
    }
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub language: Language,
    pub network: Network,
    pub account: Option<WalletAddress>,
    pub chain_balance: Option<u128>,
    pub balance: u64,
    pub cost_per_play: u64,
    pub owned_total: u64,
    pub unique: usize,
    pub phase: MachinePhase,
    pub pending_draw: Option<&'static Doll>,
    pub minting: Option<&'static Doll>,
    pub capsules: Vec<&'static Doll>,
    pub view: CollectionView,
    pub collection: Vec<CollectionEntry>,
    pub hidden: usize,
    pub toasts: Vec<Toast>,
}

/// What the header shows about the wallet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WalletStatus {
    pub account: Option<WalletAddress>,
    pub chain_balance: Option<u128>,
}

/// One account lookup, then the balance of that account.
pub async fn wallet_status(bridge: &MintBridge) -> WalletStatus {
    let Some(account) = bridge.account().await else {
        return WalletStatus::default();
    };
    let chain_balance = match bridge.wallet() {
        Some(wallet) => match wallet.balance(&account).await {
            Ok(balance) => Some(balance),
            Err(err) => {
                warn!(?err, %account, "chain balance refresh failed");
                None
            }
        },
        None => None,
    };
    WalletStatus {
        account: Some(account),
        chain_balance,
    }
}

impl AppSnapshot {
    pub fn text(&self) -> Text {
        Text::new(self.language)
    }
}

pub struct AppController {
    state: SessionState,
    bridge: MintBridge,
    network: Network,
    rng: StdRng,
    account: Option<WalletAddress>,
    chain_balance: Option<u128>,
    capsule_colors: Vec<DollId>,
    toasts: Vec<Toast>,
}

impl AppController {
    pub fn new(state: SessionState, bridge: MintBridge, network: Network, mut rng: StdRng) -> Self {
        let capsule_colors = (0..state.capsules())
            .map(|_| DOLLS[rng.random_range(0..DOLLS.len())].id)
            .collect();
        Self {
            state,
            bridge,
            network,
            rng,
            account: None,
            chain_balance: None,
            capsule_colors,
            toasts: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let network = config.network.network;
        let target = match DeploymentStore::new(&config.deployments_root, network)
            .and_then(|store| store.load())
        {
            Ok(Some(record)) => Some(record.mint_target()),
            Ok(None) => {
                warn!(%network, "no deployment recorded; minting unavailable");
                None
            }
            Err(err) => {
                warn!(?err, %network, "failed to read deployment record");
                None
            }
        };
        let rpc = RpcClient::new(config.network.rpc_url.clone())?;
        let (wallet, target): (Option<Arc<dyn WalletCapability>>, _) = match &config.wallet {
            WalletConfig::Disconnected => (None, target),
            WalletConfig::Bridge { url } => {
                let wallet = BridgeWallet::new(url.clone(), network, rpc)
                    .wrap_err("wallet bridge setup failed")?;
                info!(url = %wallet.base_url(), "using wallet bridge");
                let wallet: Arc<dyn WalletCapability> = Arc::new(wallet);
                (Some(wallet), target)
            }
            WalletConfig::Demo { failure_rate } => {
                let wallet = DemoWallet::new(*failure_rate)?.with_latency(DEMO_LATENCY);
                info!(address = %wallet.address(), failure_rate, "using demo wallet");
                let wallet: Arc<dyn WalletCapability> = Arc::new(wallet);
                (Some(wallet), target.or_else(|| Some(wallets::demo_target())))
            }
        };
        let state = SessionState::new(config.session).set_language(config.language);
        Ok(Self::new(
            state,
            MintBridge::new(wallet, target),
            network,
            StdRng::from_os_rng(),
        ))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn bridge(&self) -> &MintBridge {
        &self.bridge
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    fn text(&self) -> Text {
        Text::new(self.state.language())
    }

    pub fn spin(&mut self) {
        match self.state.spin() {
            Ok(next) => {
                info!(balance = next.balance(), capsules = next.capsules(), "spin");
                self.state = next;
            }
            Err(err) => self.refused(err),
        }
    }

    pub fn open_capsule(&mut self) {
        match self.state.resolve(&mut self.rng) {
            Ok(next) => {
                self.state = next;
                if let Some(doll) = self.state.pending_draw() {
                    info!(%doll, "capsule opened");
                }
            }
            Err(err) => self.refused(err),
        }
    }

    pub fn collect(&mut self) {
        let kept = self.state.collect();
        self.keep_prize(kept, "prize collected");
    }

    pub fn decline(&mut self) {
        let kept = self.state.decline();
        self.keep_prize(kept, "mint declined, prize kept");
    }

    fn keep_prize(&mut self, kept: Result<SessionState, SessionError>, message: &str) {
        let prize = self.state.pending_draw();
        match (kept, prize) {
            (Ok(next), Some(doll)) => {
                info!(%doll, owned = next.ledger().total(), "{message}");
                self.state = next;
                let text = self.text();
                self.push_toast(Toast::new(
                    text.success_title(),
                    text.you_got(doll.name),
                    ToastVariant::Default,
                ));
            }
            (Ok(next), None) => self.state = next,
            (Err(err), _) => self.refused(err),
        }
    }

    /// Marks a mint in flight. The returned ticket is what the worker submits.
    pub fn begin_mint(&mut self, doll: DollId, origin: MintOrigin) -> Option<MintTicket> {
        match self
            .bridge
            .begin(&self.state, self.account.clone(), doll, origin)
        {
            Ok((next, ticket)) => {
                self.state = next;
                let text = self.text();
                let name = catalog::get(doll).map(|d| d.name).unwrap_or_default();
                self.push_toast(Toast::new(
                    text.minting_title(),
                    text.minting_body(name),
                    ToastVariant::Default,
                ));
                Some(ticket)
            }
            Err(MintError::NoWallet) => {
                let text = self.text();
                self.push_toast(Toast::new(
                    text.wallet_not_connected_title(),
                    text.wallet_not_connected_body(),
                    ToastVariant::Destructive,
                ));
                None
            }
            Err(MintError::Session(err)) => {
                self.refused(err);
                None
            }
        }
    }

    pub fn finish_mint(&mut self, ticket: &MintTicket, outcome: MintOutcome) {
        match MintBridge::finish(&self.state, &outcome) {
            Ok(next) => self.state = next,
            Err(err) => {
                self.refused(err);
                return;
            }
        }
        let text = self.text();
        let name = catalog::get(ticket.pending.doll)
            .map(|d| d.name)
            .unwrap_or_default();
        let toast = match &outcome {
            MintOutcome::Minted(_) => Toast::new(
                text.mint_success_title(),
                text.mint_success_body(name),
                ToastVariant::Default,
            ),
            MintOutcome::Failed(failure) => Toast::new(
                text.mint_failed_title(),
                format!("{} ({failure})", text.mint_failed_body()),
                ToastVariant::Destructive,
            ),
        };
        info!(doll = %ticket.pending.doll, origin = ?ticket.pending.origin, %outcome, "mint settled");
        self.push_toast(toast);
    }

    pub fn toggle_language(&mut self) {
        self.state = self.state.toggle_language();
    }

    pub fn toggle_view(&mut self) {
        self.state = self.state.toggle_view();
    }

    pub fn apply_wallet_status(&mut self, status: WalletStatus) {
        self.account = status.account;
        self.chain_balance = status.chain_balance;
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let ledger = self.state.ledger();
        let collection: Vec<CollectionEntry> = catalog::all()
            .iter()
            .map(|doll| CollectionEntry {
                doll,
                count: ledger.count(doll.id),
            })
            .filter(|entry| {
                entry.owned() || self.state.view() == CollectionView::ShowAll
            })
            .collect();
        let hidden = catalog::all().len() - collection.len();
        let capsules = self
            .capsule_colors
            .iter()
            .take(self.state.capsules() as usize)
            .filter_map(|id| catalog::get(*id).ok())
            .collect();
        AppSnapshot {
            language: self.state.language(),
            network: self.network,
            account: self.account.clone(),
            chain_balance: self.chain_balance,
            balance: self.state.balance(),
            cost_per_play: self.state.cost_per_play(),
            owned_total: ledger.total(),
            unique: ledger.unique(),
            phase: self.state.phase(),
            pending_draw: self.state.pending_draw(),
            minting: self
                .state
                .minting()
                .and_then(|pending| catalog::get(pending.doll).ok()),
            capsules,
            view: self.state.view(),
            collection,
            hidden,
            toasts: self.toasts.clone(),
        }
    }

    fn refused(&mut self, err: SessionError) {
        let text = self.text();
        let toast = match err {
            SessionError::InsufficientFunds { .. } => Toast::new(
                text.insufficient_balance_title(),
                text.insufficient_balance_body(),
                ToastVariant::Destructive,
            ),
            other => Toast::new(
                text.not_allowed_title(),
                other.to_string(),
                ToastVariant::Destructive,
            ),
        };
        self.push_toast(toast);
    }

    fn push_toast(&mut self, toast: Toast) {
        match toast.variant {
            ToastVariant::Default => info!(title = %toast.title, "{}", toast.description),
            ToastVariant::Destructive => warn!(title = %toast.title, "{}", toast.description),
        }
        self.toasts.push(toast);
        if self.toasts.len() > TOAST_HISTORY {
            let drain = self.toasts.len() - TOAST_HISTORY;
            self.toasts.drain(0..drain);
        }
    }
}

type MintResult = (MintTicket, MintOutcome);

fn spawn_mint(
    controller: &mut AppController,
    mint_tx: &mpsc::UnboundedSender<MintResult>,
    doll: DollId,
    origin: MintOrigin,
) {
    let Some(ticket) = controller.begin_mint(doll, origin) else {
        return;
    };
    let bridge = controller.bridge().clone();
    let mint_tx = mint_tx.clone();
    tokio::spawn(async move {
        let outcome = bridge.submit(&ticket).await;
        if mint_tx.send((ticket, outcome)).is_err() {
            warn!("mint result dropped; app loop closed");
        }
    });
}

fn spawn_refresh(bridge: MintBridge, status_tx: &mpsc::UnboundedSender<WalletStatus>) {
    let status_tx = status_tx.clone();
    tokio::spawn(async move {
        let status = wallet_status(&bridge).await;
        if status_tx.send(status).is_err() {
            warn!("wallet status dropped; app loop closed");
        }
    });
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let mut controller = AppController::from_config(&config)?;
    let mut ui_state = ui::UiState::default();

    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(controller: &mut AppController, ui_state: &mut ui::UiState) -> Result<()> {
    info!("running app loop");
    let mut input_events = ui::InputEvents::new();
    let (mint_tx, mut mint_rx) = mpsc::unbounded_channel::<MintResult>();
    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<WalletStatus>();
    // first tick fires immediately
    let mut balance_ticker = time::interval(BALANCE_REFRESH);
    let mut refreshing = false;

    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = balance_ticker.tick() => {
                if !refreshing {
                    refreshing = true;
                    spawn_refresh(controller.bridge().clone(), &status_tx);
                }
            }
            Some(status) = status_rx.recv() => {
                refreshing = false;
                controller.apply_wallet_status(status);
            }
            Some((ticket, outcome)) = mint_rx.recv() => {
                controller.finish_mint(&ticket, outcome);
            }
            raw_ev = ui::next_raw_event(&mut input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Spin => controller.spin(),
                    ui::UserEvent::OpenCapsule => controller.open_capsule(),
                    ui::UserEvent::Collect => controller.collect(),
                    ui::UserEvent::Decline => controller.decline(),
                    ui::UserEvent::MintDraw => {
                        if let Some(doll) = controller.state().pending_draw() {
                            spawn_mint(controller, &mint_tx, doll.id, MintOrigin::FreshDraw);
                        }
                    }
                    ui::UserEvent::MintOwned(doll) => {
                        spawn_mint(controller, &mint_tx, doll, MintOrigin::Ledger);
                    }
                    ui::UserEvent::ToggleView => controller.toggle_view(),
                    ui::UserEvent::ToggleLanguage => controller.toggle_language(),
                    ui::UserEvent::Redraw => {}
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}
