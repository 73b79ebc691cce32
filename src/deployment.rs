use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::info;

use crate::{
    mint::MintTarget,
    network::Network,
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENT_FILE: &str = "deployment.json";

pub const DEFAULT_MODULE: &str = "gacha";
pub const DEFAULT_FUNCTION: &str = "mint_nft";

/// Where the NFT package lives on one network.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: String,
    pub package_id: String,
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default = "default_function")]
    pub function: String,
    pub mint_record_id: String,
    pub network_url: String,
}

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

fn default_function() -> String {
    DEFAULT_FUNCTION.to_string()
}

impl DeploymentRecord {
    pub fn mint_target(&self) -> MintTarget {
        MintTarget {
            package_id: self.package_id.clone(),
            module: self.module.clone(),
            function: self.function.clone(),
            mint_record_id: self.mint_record_id.clone(),
        }
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    network: Network,
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(root: impl AsRef<Path>, network: Network) -> Result<Self> {
        let path = ensure_store(root.as_ref(), network)?;
        Ok(Self { network, path })
    }

    /// `None` when nothing has been deployed to this network yet.
    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        read_record(&self.path)
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        write_record(&self.path, record)?;
        info!(network = %self.network, package = %record.package_id, "deployment recorded");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn record_deployment(
    root: impl AsRef<Path>,
    network: Network,
    package_id: impl AsRef<str>,
    mint_record_id: impl AsRef<str>,
    network_url: impl AsRef<str>,
    module: Option<&str>,
    function: Option<&str>,
) -> Result<DeploymentRecord> {
    let store = DeploymentStore::new(root, network)?;
    let record = DeploymentRecord {
        deployed_at: Utc::now().to_rfc3339(),
        package_id: package_id.as_ref().to_string(),
        module: module.unwrap_or(DEFAULT_MODULE).to_string(),
        function: function.unwrap_or(DEFAULT_FUNCTION).to_string(),
        mint_record_id: mint_record_id.as_ref().to_string(),
        network_url: network_url.as_ref().to_string(),
    };
    store.save(&record)?;
    Ok(record)
}

pub fn ensure_structure(root: impl AsRef<Path>) -> Result<()> {
    for network in Network::ALL {
        let _ = ensure_store(root.as_ref(), network)?;
    }
    Ok(())
}

/// Resolves `~` in a user-supplied deployments directory.
pub fn resolve_root(dir: Option<&str>) -> PathBuf {
    match dir {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
        None => PathBuf::from(DEPLOYMENTS_ROOT),
    }
}

fn ensure_store(root: &Path, network: Network) -> Result<PathBuf> {
    let dir = root.join(network.as_str());
    if !dir.exists() {
        fs::create_dir_all(&dir).wrap_err_with(|| {
            format!("Failed to create deployments directory {}", dir.display())
        })?;
    }
    Ok(dir.join(DEPLOYMENT_FILE))
}

fn read_record(path: &Path) -> Result<Option<DeploymentRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).wrap_err("Failed to read deployment record")?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let record = serde_json::from_slice::<DeploymentRecord>(&data)
        .wrap_err("Failed to parse deployment record JSON")?;
    Ok(Some(record))
}

fn write_record(path: &Path, record: &DeploymentRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)
        .wrap_err("Failed to serialize deployment record")?;
    fs::write(path, json).wrap_err("Failed to write deployment record")?;
    Ok(())
}
