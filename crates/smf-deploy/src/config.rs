use std::path::{Path, PathBuf};

use smf_contract::{Address, RpcConfig};

use crate::stages::FatalError;

pub const DEFAULT_NETWORK: &str = "localhost";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";
pub const DEFAULT_VERIFIER_API_URL: &str = "https://api.etherscan.io/v2/api";
pub const DEFAULT_VERIFIER_POLL_MS: u64 = 3_000;
pub const DEFAULT_VERIFIER_MAX_POLLS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `VerifierConfig` for the Etherscan-compatible verifier.
pub struct VerifierConfig {
    pub api_url: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything one deployment run needs, resolved before the run starts.
pub struct DeployConfig {
    pub network: String,
    pub rpc: RpcConfig,
    pub deployer: Option<Address>,
    pub artifacts_dir: PathBuf,
    pub deployments_dir: PathBuf,
    pub verifier: Option<VerifierConfig>,
}

impl DeployConfig {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            rpc: RpcConfig::default(),
            deployer: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            deployments_dir: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
            verifier: None,
        }
    }

    pub fn validate(&self) -> Result<(), FatalError> {
        validate_network_name(&self.network).map_err(FatalError::InvalidConfig)?;
        if self.rpc.url.trim().is_empty() {
            return Err(FatalError::InvalidConfig(
                "rpc url cannot be empty".to_string(),
            ));
        }
        if let Some(verifier) = &self.verifier {
            if verifier.api_url.trim().is_empty() {
                return Err(FatalError::InvalidConfig(
                    "verifier api url cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        manifest_path(&self.deployments_dir, &self.network)
    }
}

/// `<deployments_dir>/<network>.json`.
pub fn manifest_path(deployments_dir: &Path, network: &str) -> PathBuf {
    deployments_dir.join(format!("{network}.json"))
}

pub fn validate_network_name(network: &str) -> Result<(), String> {
    if network.is_empty() {
        return Err("network name cannot be empty".to_string());
    }
    if network == "." || network == ".." {
        return Err(format!("network name '{network}' is reserved"));
    }
    if let Some(invalid) = network
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
    {
        return Err(format!(
            "network name '{network}' contains unsupported character '{invalid}'; use [A-Za-z0-9._-]"
        ));
    }
    Ok(())
}
