//! Deployment and registration orchestrator for the Secure Music Flow
//! contracts.
//!
//! A run deploys `FHEEncryption` and `SecureMusicFlow`, sets the initial FHE
//! public key, attempts source verification and records the resulting
//! addresses in `<deployments-dir>/<network>.json`.
pub mod cli_args;
pub mod config;
pub mod manifest;
pub mod orchestrator;
pub mod stages;
pub mod verifier;

pub use cli_args::Cli;
pub use config::{DeployConfig, VerifierConfig};
pub use manifest::{load_manifest, DeploymentManifest, ManifestContracts};
pub use orchestrator::{
    render_deployment_summary, run_deployment, DeploymentFailure, DeploymentOrchestrator,
    DeploymentReport,
};
pub use stages::{
    error_chain, DeploymentStage, FatalError, RecoverableError, StageReport, StageStatus,
};
pub use verifier::{EtherscanVerifier, SourceVerifier, VerificationOutcome, VerificationRequest};
