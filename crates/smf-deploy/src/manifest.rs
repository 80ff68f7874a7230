//! Deployment manifest persisted per network for client configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smf_core::write_text_atomic;

pub const FHE_PUBLIC_KEY_PREFIX: &str = "fhe_public_key_placeholder_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Addresses of the two contracts one run deploys.
pub struct ManifestContracts {
    #[serde(rename = "FHEEncryption")]
    pub fhe_encryption: String,
    #[serde(rename = "SecureMusicFlow")]
    pub secure_music_flow: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `DeploymentManifest` written to `deployments/<network>.json`.
pub struct DeploymentManifest {
    pub network: String,
    pub timestamp: String,
    pub contracts: ManifestContracts,
    pub fhe_public_key: String,
}

/// Placeholder key recorded on-chain; unique per run at millisecond granularity.
pub fn placeholder_public_key(unix_ms: u64) -> String {
    format!("{FHE_PUBLIC_KEY_PREFIX}{unix_ms}")
}

pub fn render_manifest(manifest: &DeploymentManifest) -> Result<String> {
    let mut encoded =
        serde_json::to_string_pretty(manifest).context("failed to encode deployment manifest")?;
    encoded.push('\n');
    Ok(encoded)
}

/// Replaces any manifest already at `path`; parent directories are created.
pub fn save_manifest(path: &Path, manifest: &DeploymentManifest) -> Result<()> {
    write_text_atomic(path, &render_manifest(manifest)?)
}

pub fn load_manifest(path: &Path) -> Result<DeploymentManifest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deployment manifest {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse deployment manifest {}", path.display()))
}
