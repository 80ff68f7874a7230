use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use smf_contract::{
    parse_address, RpcConfig, DEFAULT_CONFIRMATION_POLL_MS, DEFAULT_CONFIRMATION_TIMEOUT_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RPC_URL,
};

use crate::config::{
    DeployConfig, VerifierConfig, DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR,
    DEFAULT_NETWORK, DEFAULT_VERIFIER_API_URL, DEFAULT_VERIFIER_MAX_POLLS,
    DEFAULT_VERIFIER_POLL_MS,
};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "smf-deploy",
    about = "Deploy and register the Secure Music Flow contracts",
    version
)]
/// Public struct `Cli`; every setting also reads from the environment.
pub struct Cli {
    #[arg(
        long,
        env = "SMF_NETWORK",
        default_value = DEFAULT_NETWORK,
        help = "Network identifier; names the manifest written to <deployments-dir>/<network>.json"
    )]
    pub network: String,

    #[arg(
        long = "rpc-url",
        env = "SMF_RPC_URL",
        default_value = DEFAULT_RPC_URL,
        help = "JSON-RPC endpoint of the target node"
    )]
    pub rpc_url: String,

    #[arg(
        long,
        env = "SMF_DEPLOYER",
        help = "Deployer address; defaults to the first account reported by the node"
    )]
    pub deployer: Option<String>,

    #[arg(
        long = "artifacts-dir",
        env = "SMF_ARTIFACTS_DIR",
        default_value = DEFAULT_ARTIFACTS_DIR,
        help = "Hardhat artifacts root"
    )]
    pub artifacts_dir: PathBuf,

    #[arg(
        long = "deployments-dir",
        env = "SMF_DEPLOYMENTS_DIR",
        default_value = DEFAULT_DEPLOYMENTS_DIR,
        help = "Directory receiving deployment manifests"
    )]
    pub deployments_dir: PathBuf,

    #[arg(
        long = "request-timeout-ms",
        env = "SMF_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Per-request HTTP timeout in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "confirmation-poll-ms",
        env = "SMF_CONFIRMATION_POLL_MS",
        default_value_t = DEFAULT_CONFIRMATION_POLL_MS,
        value_parser = parse_positive_u64,
        help = "Receipt polling interval in milliseconds"
    )]
    pub confirmation_poll_ms: u64,

    #[arg(
        long = "confirmation-timeout-ms",
        env = "SMF_CONFIRMATION_TIMEOUT_MS",
        default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Upper bound on waiting for a transaction receipt"
    )]
    pub confirmation_timeout_ms: u64,

    #[arg(
        long = "etherscan-api-key",
        env = "ETHERSCAN_API_KEY",
        hide_env_values = true,
        help = "Verifier API key; source verification is skipped when unset"
    )]
    pub etherscan_api_key: Option<String>,

    #[arg(
        long = "verifier-api-url",
        env = "SMF_VERIFIER_API_URL",
        default_value = DEFAULT_VERIFIER_API_URL,
        help = "Etherscan-compatible verification endpoint"
    )]
    pub verifier_api_url: String,

    #[arg(
        long = "verifier-poll-ms",
        env = "SMF_VERIFIER_POLL_MS",
        default_value_t = DEFAULT_VERIFIER_POLL_MS,
        value_parser = parse_positive_u64,
        help = "Verification status polling interval in milliseconds"
    )]
    pub verifier_poll_ms: u64,

    #[arg(
        long = "verifier-max-polls",
        env = "SMF_VERIFIER_MAX_POLLS",
        default_value_t = DEFAULT_VERIFIER_MAX_POLLS,
        value_parser = parse_positive_usize,
        help = "Maximum verification status checks per contract"
    )]
    pub verifier_max_polls: usize,
}

impl Cli {
    pub fn into_deploy_config(self) -> Result<DeployConfig> {
        let deployer = match self.deployer.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                parse_address(raw).with_context(|| format!("invalid deployer address '{raw}'"))?,
            ),
            _ => None,
        };
        let verifier = self
            .etherscan_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|api_key| VerifierConfig {
                api_url: self.verifier_api_url.trim().to_string(),
                api_key,
                request_timeout_ms: self.request_timeout_ms,
                poll_interval_ms: self.verifier_poll_ms,
                max_polls: self.verifier_max_polls,
            });
        let config = DeployConfig {
            network: self.network.trim().to_string(),
            rpc: RpcConfig {
                url: self.rpc_url.trim().to_string(),
                request_timeout_ms: self.request_timeout_ms,
                confirmation_poll_ms: self.confirmation_poll_ms,
                confirmation_timeout_ms: self.confirmation_timeout_ms,
            },
            deployer,
            artifacts_dir: self.artifacts_dir,
            deployments_dir: self.deployments_dir,
            verifier,
        };
        config.validate()?;
        Ok(config)
    }
}
