use std::path::PathBuf;

use smf_contract::artifact::ArtifactError;
use smf_contract::ContractError;
use thiserror::Error;

use crate::verifier::VerifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Ordered steps of one deployment run.
pub enum DeploymentStage {
    DeployFheEncryption,
    DeploySecureMusicFlow,
    ConfigurePublicKey,
    VerifyFheEncryption,
    VerifySecureMusicFlow,
    PersistManifest,
}

impl DeploymentStage {
    /// Execution order.
    pub const ALL: [DeploymentStage; 6] = [
        DeploymentStage::DeployFheEncryption,
        DeploymentStage::DeploySecureMusicFlow,
        DeploymentStage::ConfigurePublicKey,
        DeploymentStage::VerifyFheEncryption,
        DeploymentStage::VerifySecureMusicFlow,
        DeploymentStage::PersistManifest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStage::DeployFheEncryption => "deploy-fhe-encryption",
            DeploymentStage::DeploySecureMusicFlow => "deploy-secure-music-flow",
            DeploymentStage::ConfigurePublicKey => "configure-public-key",
            DeploymentStage::VerifyFheEncryption => "verify-fhe-encryption",
            DeploymentStage::VerifySecureMusicFlow => "verify-secure-music-flow",
            DeploymentStage::PersistManifest => "persist-manifest",
        }
    }
}

impl std::fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `StageStatus` values.
pub enum StageStatus {
    Completed { detail: String },
    /// Best-effort stage failed; the run continued.
    Recovered { reason: String },
    Skipped { reason: String },
    Failed { reason: String },
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Completed { .. } => "completed",
            StageStatus::Recovered { .. } => "recovered",
            StageStatus::Skipped { .. } => "skipped",
            StageStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `StageReport` recording one stage outcome.
pub struct StageReport {
    pub stage: DeploymentStage,
    pub status: StageStatus,
}

/// Errors that abort the run before a manifest is written.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("invalid deployment configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to connect to rpc endpoint {url}")]
    Connect {
        url: String,
        #[source]
        source: ContractError,
    },
    #[error("failed to load artifact for {contract}")]
    Artifact {
        contract: &'static str,
        #[source]
        source: ArtifactError,
    },
    #[error("failed to deploy {contract}")]
    Deploy {
        contract: &'static str,
        #[source]
        source: ContractError,
    },
    #[error("failed to set FHE public key on {contract}")]
    Configure {
        contract: &'static str,
        #[source]
        source: ContractError,
    },
    #[error("failed to persist deployment manifest {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
}

/// Errors that are logged and recorded but never change the run outcome.
#[derive(Debug, Error)]
pub enum RecoverableError {
    #[error("verification of {contract} failed")]
    Verification {
        contract: &'static str,
        #[source]
        source: VerifyError,
    },
}

/// Renders `error` and its `source()` causes as `outer: cause: root`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
