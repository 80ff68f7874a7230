//! Stage runner that deploys both contracts, configures the public key,
//! verifies sources and persists the manifest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use smf_contract::artifact::{load_build_info, load_contract_artifact, ContractArtifact};
use smf_contract::bindings::{fhe_encryption, secure_music_flow};
use smf_contract::{Address, ContractClient, ContractDeployer, DeployedContract};
use smf_core::{current_unix_timestamp_ms, iso8601_from_unix_ms};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DeployConfig;
use crate::manifest::{placeholder_public_key, save_manifest, DeploymentManifest, ManifestContracts};
use crate::stages::{
    error_chain, DeploymentStage, FatalError, RecoverableError, StageReport, StageStatus,
};
use crate::verifier::{
    EtherscanVerifier, SourceVerifier, VerificationOutcome, VerificationRequest, VerifyError,
};

/// Millisecond wall clock used for the key placeholder and manifest timestamp.
pub type Clock = fn() -> u64;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `DeploymentReport` returned by a successful run.
pub struct DeploymentReport {
    pub network: String,
    pub manifest: DeploymentManifest,
    pub manifest_path: PathBuf,
    pub stages: Vec<StageReport>,
}

impl DeploymentReport {
    pub fn stage(&self, stage: DeploymentStage) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| &report.status)
    }
}

/// A fatal stage failure plus every stage outcome recorded up to it.
#[derive(Debug, Error)]
#[error("stage {stage} failed")]
pub struct DeploymentFailure {
    pub stage: DeploymentStage,
    #[source]
    pub error: FatalError,
    pub stages: Vec<StageReport>,
}

#[derive(Debug, Default)]
struct StageLog {
    reports: Vec<StageReport>,
}

impl StageLog {
    fn record(&mut self, stage: DeploymentStage, status: StageStatus) {
        self.reports.push(StageReport { stage, status });
    }

    fn completed<T>(
        &mut self,
        stage: DeploymentStage,
        result: Result<T, FatalError>,
        detail: impl FnOnce(&T) -> String,
    ) -> Result<T, DeploymentFailure> {
        match result {
            Ok(value) => {
                let detail = detail(&value);
                info!(stage = %stage, "{detail}");
                self.record(stage, StageStatus::Completed { detail });
                Ok(value)
            }
            Err(error) => Err(self.fail(stage, error)),
        }
    }

    fn fail(&mut self, stage: DeploymentStage, error: FatalError) -> DeploymentFailure {
        self.record(
            stage,
            StageStatus::Failed {
                reason: error_chain(&error),
            },
        );
        DeploymentFailure {
            stage,
            error,
            stages: std::mem::take(&mut self.reports),
        }
    }
}

/// Runs the fixed deployment stage list against one network.
pub struct DeploymentOrchestrator {
    config: DeployConfig,
    deployer: Arc<dyn ContractDeployer>,
    verifier: Option<Arc<dyn SourceVerifier>>,
    clock: Clock,
}

impl DeploymentOrchestrator {
    pub fn new(
        config: DeployConfig,
        deployer: Arc<dyn ContractDeployer>,
        verifier: Option<Arc<dyn SourceVerifier>>,
    ) -> Result<Self, FatalError> {
        config.validate()?;
        Ok(Self {
            config,
            deployer,
            verifier,
            clock: current_unix_timestamp_ms,
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<DeploymentReport, DeploymentFailure> {
        let mut log = StageLog::default();
        let public_key = placeholder_public_key((self.clock)());
        info!(network = %self.config.network, "starting deployment");

        // Both artifacts must load before anything reaches the chain.
        let (fhe_artifact, flow_artifact) = match self.load_artifacts() {
            Ok(artifacts) => artifacts,
            Err(error) => return Err(log.fail(DeploymentStage::DeployFheEncryption, error)),
        };
        let fhe = log.completed(
            DeploymentStage::DeployFheEncryption,
            self.deploy(fhe_encryption::CONTRACT_NAME, &fhe_artifact).await,
            deployed_detail,
        )?;
        let flow = log.completed(
            DeploymentStage::DeploySecureMusicFlow,
            self.deploy(secure_music_flow::CONTRACT_NAME, &flow_artifact).await,
            deployed_detail,
        )?;
        log.completed(
            DeploymentStage::ConfigurePublicKey,
            self.configure_public_key(flow.address, &public_key).await,
            |_| format!("FHE public key set to {public_key}"),
        )?;

        for (stage, contract, artifact, deployed) in [
            (
                DeploymentStage::VerifyFheEncryption,
                fhe_encryption::CONTRACT_NAME,
                &fhe_artifact,
                &fhe,
            ),
            (
                DeploymentStage::VerifySecureMusicFlow,
                secure_music_flow::CONTRACT_NAME,
                &flow_artifact,
                &flow,
            ),
        ] {
            let status = self.verify_stage(contract, artifact, deployed).await;
            log.record(stage, status);
        }

        let manifest_path = self.config.manifest_path();
        let manifest = DeploymentManifest {
            network: self.config.network.clone(),
            timestamp: iso8601_from_unix_ms((self.clock)()),
            contracts: ManifestContracts {
                fhe_encryption: fhe.checksummed_address(),
                secure_music_flow: flow.checksummed_address(),
            },
            fhe_public_key: public_key,
        };
        let persisted = save_manifest(&manifest_path, &manifest).map_err(|error| {
            FatalError::Persist {
                path: manifest_path.clone(),
                reason: format!("{error:#}"),
            }
        });
        log.completed(DeploymentStage::PersistManifest, persisted, |_| {
            format!("deployment info saved to {}", manifest_path.display())
        })?;

        Ok(DeploymentReport {
            network: self.config.network.clone(),
            manifest,
            manifest_path,
            stages: log.reports,
        })
    }

    fn load_artifacts(&self) -> Result<(ContractArtifact, ContractArtifact), FatalError> {
        let load = |contract: &'static str| {
            load_contract_artifact(&self.config.artifacts_dir, contract)
                .map_err(|source| FatalError::Artifact { contract, source })
        };
        Ok((
            load(fhe_encryption::CONTRACT_NAME)?,
            load(secure_music_flow::CONTRACT_NAME)?,
        ))
    }

    async fn deploy(
        &self,
        contract: &'static str,
        artifact: &ContractArtifact,
    ) -> Result<DeployedContract, FatalError> {
        info!(contract, "deploying contract");
        self.deployer
            .deploy_contract(artifact)
            .await
            .map_err(|source| FatalError::Deploy { contract, source })
    }

    async fn configure_public_key(
        &self,
        contract: Address,
        public_key: &str,
    ) -> Result<(), FatalError> {
        self.deployer
            .execute(contract, &secure_music_flow::update_fhe_public_key(public_key))
            .await
            .map(|_| ())
            .map_err(|source| FatalError::Configure {
                contract: secure_music_flow::CONTRACT_NAME,
                source,
            })
    }

    async fn verify_stage(
        &self,
        contract: &'static str,
        artifact: &ContractArtifact,
        deployed: &DeployedContract,
    ) -> StageStatus {
        let Some(verifier) = &self.verifier else {
            return StageStatus::Skipped {
                reason: "no verifier configured".to_string(),
            };
        };
        match self
            .verify(verifier.as_ref(), contract, artifact, deployed)
            .await
        {
            Ok(outcome) => {
                info!(
                    contract,
                    outcome = outcome.as_str(),
                    "source verification finished"
                );
                StageStatus::Completed {
                    detail: format!("{} {}", deployed.name, outcome.as_str()),
                }
            }
            Err(error) => {
                let reason = error_chain(&error);
                warn!("{reason}");
                StageStatus::Recovered { reason }
            }
        }
    }

    async fn verify(
        &self,
        verifier: &dyn SourceVerifier,
        contract: &'static str,
        artifact: &ContractArtifact,
        deployed: &DeployedContract,
    ) -> Result<VerificationOutcome, RecoverableError> {
        let request = self
            .verification_request(artifact, deployed)
            .await
            .map_err(|source| RecoverableError::Verification { contract, source })?;
        verifier
            .verify(&request)
            .await
            .map_err(|source| RecoverableError::Verification { contract, source })
    }

    async fn verification_request(
        &self,
        artifact: &ContractArtifact,
        deployed: &DeployedContract,
    ) -> Result<VerificationRequest, VerifyError> {
        let chain_id = self
            .deployer
            .chain_id()
            .await
            .map_err(VerifyError::ChainId)?;
        let build_info = load_build_info(&self.config.artifacts_dir, &artifact.contract_name)?;
        Ok(VerificationRequest {
            chain_id,
            address: deployed.address,
            contract_name: artifact.fully_qualified_name(),
            compiler_version: build_info.solc_long_version,
            standard_json_input: build_info.input,
            constructor_arguments: String::new(),
        })
    }
}

fn deployed_detail(deployed: &DeployedContract) -> String {
    format!(
        "{} deployed to {}",
        deployed.name,
        deployed.checksummed_address()
    )
}

/// Connects to the configured node and runs every stage.
pub async fn run_deployment(config: DeployConfig) -> Result<DeploymentReport> {
    config.validate()?;
    let connect_error = |source| FatalError::Connect {
        url: config.rpc.url.clone(),
        source,
    };
    let client = ContractClient::connect(config.rpc.clone(), config.deployer)
        .await
        .map_err(connect_error)?;
    let chain_id = client.rpc().chain_id().await.map_err(connect_error)?;
    info!(
        deployer = %client.from_address().to_checksum(None),
        rpc_url = %config.rpc.url,
        chain_id,
        "connected to rpc endpoint"
    );
    let verifier = match &config.verifier {
        Some(verifier_config) => {
            let verifier = EtherscanVerifier::new(verifier_config.clone()).map_err(|error| {
                FatalError::InvalidConfig(format!("failed to build verifier client: {error}"))
            })?;
            Some(Arc::new(verifier) as Arc<dyn SourceVerifier>)
        }
        None => None,
    };
    let orchestrator = DeploymentOrchestrator::new(config, Arc::new(client), verifier)?;
    Ok(orchestrator.run().await?)
}

pub fn render_deployment_summary(report: &DeploymentReport) -> String {
    let mut lines = vec![
        "=== Deployment Summary ===".to_string(),
        format!("Network: {}", report.network),
        format!("FHEEncryption: {}", report.manifest.contracts.fhe_encryption),
        format!(
            "SecureMusicFlow: {}",
            report.manifest.contracts.secure_music_flow
        ),
        format!("FHE Public Key: {}", report.manifest.fhe_public_key),
        format!(
            "Deployment info saved to: {}",
            report.manifest_path.display()
        ),
        String::new(),
        "=== Stages ===".to_string(),
    ];
    for report in &report.stages {
        let note = match &report.status {
            StageStatus::Completed { detail } => detail,
            StageStatus::Recovered { reason }
            | StageStatus::Skipped { reason }
            | StageStatus::Failed { reason } => reason,
        };
        lines.push(format!(
            "{:<26} {:<9} {note}",
            report.stage.as_str(),
            report.status.label()
        ));
    }
    lines.extend([
        String::new(),
        "=== Next Steps ===".to_string(),
        "1. Update your .env file with the contract addresses".to_string(),
        "2. Update your frontend configuration".to_string(),
        "3. Test the contracts on the testnet".to_string(),
    ]);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use smf_contract::artifact::artifact_path;
    use smf_contract::{ContractCall, ContractError, TransactionReceipt, B256};

    use super::*;
    use crate::manifest::load_manifest;

    const FHE_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
    const FLOW_ADDRESS: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
    const FIXED_MS: u64 = 1_792_411_200_123;

    fn fixed_clock() -> u64 {
        FIXED_MS
    }

    #[derive(Default)]
    struct ScriptedDeployer {
        fail_deploy: Option<&'static str>,
        fail_configure: bool,
        fail_chain_id: bool,
        deployed: Mutex<Vec<String>>,
        calls: Mutex<Vec<(Address, ContractCall)>>,
    }

    #[async_trait]
    impl ContractDeployer for ScriptedDeployer {
        async fn chain_id(&self) -> Result<u64, ContractError> {
            if self.fail_chain_id {
                return Err(ContractError::InvalidResponse("chain id".to_string()));
            }
            Ok(11_155_111)
        }

        async fn deploy_contract(
            &self,
            artifact: &ContractArtifact,
        ) -> Result<DeployedContract, ContractError> {
            if self.fail_deploy == Some(artifact.contract_name.as_str()) {
                return Err(ContractError::Rpc {
                    code: -32000,
                    message: "insufficient funds".to_string(),
                });
            }
            let mut deployed = self.deployed.lock().expect("deployed lock");
            let address = if deployed.is_empty() {
                FHE_ADDRESS
            } else {
                FLOW_ADDRESS
            };
            deployed.push(artifact.contract_name.clone());
            Ok(DeployedContract {
                name: artifact.contract_name.clone(),
                address: address.parse().expect("address"),
                transaction_hash: B256::repeat_byte(deployed.len() as u8),
                block_number: Some(deployed.len() as u64),
            })
        }

        async fn execute(
            &self,
            contract: Address,
            call: &ContractCall,
        ) -> Result<TransactionReceipt, ContractError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((contract, call.clone()));
            if self.fail_configure {
                return Err(ContractError::Reverted("0xdead".to_string()));
            }
            Ok(TransactionReceipt {
                transaction_hash: B256::repeat_byte(9),
                contract_address: None,
                block_number: Some(3),
                gas_used: Some(42_000),
                success: true,
            })
        }
    }

    #[derive(Default)]
    struct ScriptedVerifier {
        reject: bool,
        requests: Mutex<Vec<VerificationRequest>>,
    }

    #[async_trait]
    impl SourceVerifier for ScriptedVerifier {
        async fn verify(
            &self,
            request: &VerificationRequest,
        ) -> Result<VerificationOutcome, VerifyError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            if self.reject {
                return Err(VerifyError::Rejected("Invalid API Key".to_string()));
            }
            Ok(VerificationOutcome::Verified)
        }
    }

    fn write_artifacts(root: &Path) {
        for (name, bytecode) in [("FHEEncryption", "0x6001"), ("SecureMusicFlow", "0x6002")] {
            let path = artifact_path(root, name);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            let artifact = json!({
                "contractName": name,
                "sourceName": format!("contracts/{name}.sol"),
                "abi": [],
                "bytecode": bytecode,
            });
            std::fs::write(&path, artifact.to_string()).expect("artifact");
            std::fs::write(
                path.with_extension("dbg.json"),
                json!({"buildInfo": "../../build-info/abc123.json"}).to_string(),
            )
            .expect("dbg");
        }
        let build_info = root.join("build-info").join("abc123.json");
        std::fs::create_dir_all(build_info.parent().expect("parent")).expect("mkdir");
        std::fs::write(
            &build_info,
            json!({
                "solcLongVersion": "0.8.24+commit.e11b9ed9",
                "input": {"language": "Solidity", "sources": {}},
            })
            .to_string(),
        )
        .expect("build info");
    }

    fn config(root: &Path, network: &str) -> DeployConfig {
        let mut config = DeployConfig::new(network);
        config.artifacts_dir = root.join("artifacts");
        config.deployments_dir = root.join("deployments");
        config
    }

    fn orchestrator(
        config: DeployConfig,
        deployer: Arc<ScriptedDeployer>,
        verifier: Option<Arc<ScriptedVerifier>>,
    ) -> DeploymentOrchestrator {
        DeploymentOrchestrator::new(
            config,
            deployer,
            verifier.map(|verifier| verifier as Arc<dyn SourceVerifier>),
        )
        .expect("orchestrator")
        .with_clock(fixed_clock)
    }

    #[tokio::test]
    async fn functional_successful_run_writes_manifest_with_both_contracts() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let deployer = Arc::new(ScriptedDeployer::default());

        let report = orchestrator(config(tempdir.path(), "localhost"), deployer.clone(), None)
            .run()
            .await
            .expect("run");

        assert_eq!(
            *deployer.deployed.lock().expect("lock"),
            vec!["FHEEncryption".to_string(), "SecureMusicFlow".to_string()]
        );
        let manifest = load_manifest(&report.manifest_path).expect("manifest");
        assert_eq!(manifest, report.manifest);
        assert_eq!(manifest.network, "localhost");
        assert_eq!(
            manifest.contracts.fhe_encryption,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert_eq!(
            manifest.contracts.secure_music_flow,
            "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
        );
        assert_eq!(manifest.timestamp, "2026-10-19T12:00:00.123Z");

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&report.manifest_path).expect("read"),
        )
        .expect("json");
        assert_eq!(raw["contracts"].as_object().expect("contracts").len(), 2);
    }

    #[tokio::test]
    async fn functional_public_key_uses_run_start_millis_and_targets_second_contract() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let deployer = Arc::new(ScriptedDeployer::default());

        let report = orchestrator(config(tempdir.path(), "localhost"), deployer.clone(), None)
            .run()
            .await
            .expect("run");

        let key = &report.manifest.fhe_public_key;
        let digits = key
            .strip_prefix("fhe_public_key_placeholder_")
            .expect("prefix");
        assert!(!digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()));
        assert_eq!(digits, FIXED_MS.to_string());

        let calls = deployer.calls.lock().expect("lock");
        assert_eq!(calls.len(), 1);
        let (target, call) = &calls[0];
        assert_eq!(*target, FLOW_ADDRESS.parse::<Address>().expect("address"));
        assert_eq!(call.function, "updateFHEPublicKey(string)");
        let decoded = call
            .decode::<smf_contract::bindings::ISecureMusicFlow::updateFHEPublicKeyCall>()
            .expect("decode");
        assert_eq!(decoded.newPublicKey, *key);
    }

    #[tokio::test]
    async fn functional_second_run_fully_replaces_previous_manifest() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let path = config(tempdir.path(), "sepolia").manifest_path();
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, r#"{"network":"sepolia","legacy":"value"}"#).expect("seed");

        for _ in 0..2 {
            orchestrator(
                config(tempdir.path(), "sepolia"),
                Arc::new(ScriptedDeployer::default()),
                None,
            )
            .run()
            .await
            .expect("run");
        }

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(!raw.contains("legacy"));
        assert_eq!(load_manifest(&path).expect("manifest").network, "sepolia");
    }

    #[tokio::test]
    async fn regression_first_deploy_failure_leaves_existing_manifest_untouched() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let path = config(tempdir.path(), "sepolia").manifest_path();
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "previous").expect("seed");
        let deployer = Arc::new(ScriptedDeployer {
            fail_deploy: Some("FHEEncryption"),
            ..ScriptedDeployer::default()
        });

        let failure = orchestrator(config(tempdir.path(), "sepolia"), deployer.clone(), None)
            .run()
            .await
            .expect_err("deploy failure");

        assert_eq!(failure.stage, DeploymentStage::DeployFheEncryption);
        assert!(matches!(failure.error, FatalError::Deploy { contract: "FHEEncryption", .. }));
        assert_eq!(failure.stages.len(), 1);
        assert_eq!(failure.stages[0].status.label(), "failed");
        assert!(deployer.deployed.lock().expect("lock").is_empty());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "previous");
    }

    #[tokio::test]
    async fn regression_missing_artifacts_fail_without_writing_manifest() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let config = config(tempdir.path(), "localhost");
        let path = config.manifest_path();

        let failure = orchestrator(config, Arc::new(ScriptedDeployer::default()), None)
            .run()
            .await
            .expect_err("missing artifact");

        assert_eq!(failure.stage, DeploymentStage::DeployFheEncryption);
        assert!(matches!(failure.error, FatalError::Artifact { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn regression_missing_second_artifact_fails_before_any_deployment() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let artifacts = tempdir.path().join("artifacts");
        write_artifacts(&artifacts);
        std::fs::remove_file(artifact_path(&artifacts, "SecureMusicFlow")).expect("remove");
        let config = config(tempdir.path(), "localhost");
        let path = config.manifest_path();
        let deployer = Arc::new(ScriptedDeployer::default());

        let failure = orchestrator(config, deployer.clone(), None)
            .run()
            .await
            .expect_err("missing artifact");

        assert!(deployer.deployed.lock().expect("lock").is_empty());
        assert!(deployer.calls.lock().expect("lock").is_empty());
        assert_eq!(failure.stage, DeploymentStage::DeployFheEncryption);
        assert!(matches!(
            failure.error,
            FatalError::Artifact { contract: "SecureMusicFlow", .. }
        ));
        assert_eq!(failure.stages.len(), 1);
        assert!(matches!(
            &failure.stages[0].status,
            StageStatus::Failed { reason }
                if reason.starts_with("failed to load artifact for SecureMusicFlow: failed to read ")
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn regression_reverted_configuration_is_fatal() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let config = config(tempdir.path(), "localhost");
        let path = config.manifest_path();
        let deployer = Arc::new(ScriptedDeployer {
            fail_configure: true,
            ..ScriptedDeployer::default()
        });

        let failure = orchestrator(config, deployer, None)
            .run()
            .await
            .expect_err("configure failure");

        assert_eq!(failure.stage, DeploymentStage::ConfigurePublicKey);
        assert!(matches!(failure.error, FatalError::Configure { .. }));
        let labels = failure
            .stages
            .iter()
            .map(|report| report.status.label())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["completed", "completed", "failed"]);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn functional_verification_failure_is_recovered_and_manifest_written() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let verifier = Arc::new(ScriptedVerifier {
            reject: true,
            ..ScriptedVerifier::default()
        });

        let report = orchestrator(
            config(tempdir.path(), "sepolia"),
            Arc::new(ScriptedDeployer::default()),
            Some(verifier.clone()),
        )
        .run()
        .await
        .expect("verification failures are not fatal");

        assert!(matches!(
            report.stage(DeploymentStage::VerifyFheEncryption),
            Some(StageStatus::Recovered { reason }) if reason.contains("Invalid API Key")
        ));
        assert!(matches!(
            report.stage(DeploymentStage::VerifySecureMusicFlow),
            Some(StageStatus::Recovered { .. })
        ));
        assert_eq!(verifier.requests.lock().expect("lock").len(), 2);
        assert!(report.manifest_path.ends_with("deployments/sepolia.json"));
        assert_eq!(
            load_manifest(&report.manifest_path).expect("manifest").network,
            "sepolia"
        );
    }

    #[tokio::test]
    async fn functional_verification_requests_carry_build_metadata() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let verifier = Arc::new(ScriptedVerifier::default());

        let report = orchestrator(
            config(tempdir.path(), "sepolia"),
            Arc::new(ScriptedDeployer::default()),
            Some(verifier.clone()),
        )
        .run()
        .await
        .expect("run");

        let requests = verifier.requests.lock().expect("lock");
        assert_eq!(requests[0].chain_id, 11_155_111);
        assert_eq!(
            requests[0].contract_name,
            "contracts/FHEEncryption.sol:FHEEncryption"
        );
        assert_eq!(requests[0].compiler_version, "0.8.24+commit.e11b9ed9");
        assert_eq!(requests[0].standard_json_input["language"], "Solidity");
        assert!(requests[0].constructor_arguments.is_empty());
        assert_eq!(
            requests[1].contract_name,
            "contracts/SecureMusicFlow.sol:SecureMusicFlow"
        );
        assert_eq!(
            requests[1].address,
            FLOW_ADDRESS.parse::<Address>().expect("address")
        );
        assert!(matches!(
            report.stage(DeploymentStage::VerifySecureMusicFlow),
            Some(StageStatus::Completed { .. })
        ));
    }

    #[tokio::test]
    async fn regression_chain_id_failure_only_degrades_verification() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));
        let verifier = Arc::new(ScriptedVerifier::default());
        let deployer = Arc::new(ScriptedDeployer {
            fail_chain_id: true,
            ..ScriptedDeployer::default()
        });

        let report = orchestrator(
            config(tempdir.path(), "localhost"),
            deployer,
            Some(verifier.clone()),
        )
        .run()
        .await
        .expect("run");

        assert!(verifier.requests.lock().expect("lock").is_empty());
        assert_eq!(
            report.stage(DeploymentStage::VerifyFheEncryption),
            Some(&StageStatus::Recovered {
                reason: "verification of FHEEncryption failed: chain id unavailable: \
                         invalid response: chain id"
                    .to_string()
            })
        );
        assert!(report.manifest_path.exists());
    }

    #[tokio::test]
    async fn unit_stage_reports_follow_fixed_order_and_summary_lists_them() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        write_artifacts(&tempdir.path().join("artifacts"));

        let report = orchestrator(
            config(tempdir.path(), "localhost"),
            Arc::new(ScriptedDeployer::default()),
            None,
        )
        .run()
        .await
        .expect("run");

        let stages = report
            .stages
            .iter()
            .map(|report| report.stage)
            .collect::<Vec<_>>();
        assert_eq!(stages, DeploymentStage::ALL.to_vec());
        assert!(matches!(
            report.stage(DeploymentStage::VerifyFheEncryption),
            Some(StageStatus::Skipped { .. })
        ));

        let summary = render_deployment_summary(&report);
        assert!(summary.starts_with("=== Deployment Summary ===\nNetwork: localhost\n"));
        assert!(summary.contains("FHEEncryption: 0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        assert!(summary.contains("FHE Public Key: fhe_public_key_placeholder_1792411200123"));
        assert!(summary.contains("persist-manifest"));
        assert!(summary.ends_with("3. Test the contracts on the testnet"));
    }

    #[test]
    fn unit_invalid_network_is_rejected_before_any_stage() {
        let result = DeploymentOrchestrator::new(
            DeployConfig::new("../mainnet"),
            Arc::new(ScriptedDeployer::default()),
            None,
        );
        assert!(matches!(result, Err(FatalError::InvalidConfig(_))));
    }
}
