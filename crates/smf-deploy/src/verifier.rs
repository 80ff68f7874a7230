//! Best-effort source verification against an Etherscan-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use smf_contract::artifact::ArtifactError;
use smf_contract::{Address, ContractError};
use thiserror::Error;

use crate::config::VerifierConfig;

const CODE_FORMAT_STANDARD_JSON: &str = "solidity-standard-json-input";
const PENDING_MARKER: &str = "pending in queue";
const ALREADY_VERIFIED_MARKER: &str = "already verified";
const PASS_MARKER: &str = "pass - verified";

#[derive(Debug, Error)]
/// Enumerates supported `VerifyError` values.
pub enum VerifyError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("verifier returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("verifier rejected submission: {0}")]
    Rejected(String),
    #[error("verifier reported failure: {0}")]
    Failed(String),
    #[error("verification still pending after {attempts} status checks")]
    StillPending { attempts: usize },
    #[error("build metadata unavailable")]
    BuildInfo(#[from] ArtifactError),
    #[error("chain id unavailable")]
    ChainId(#[source] ContractError),
}

#[derive(Debug, Clone, PartialEq)]
/// Public struct `VerificationRequest` describing one contract to verify.
pub struct VerificationRequest {
    pub chain_id: u64,
    pub address: Address,
    /// `<sourceName>:<contractName>`.
    pub contract_name: String,
    /// Full solc version, e.g. `0.8.24+commit.e11b9ed9`.
    pub compiler_version: String,
    pub standard_json_input: Value,
    /// ABI-encoded constructor arguments, hex without prefix.
    pub constructor_arguments: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `VerificationOutcome` values.
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

impl VerificationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationOutcome::Verified => "verified",
            VerificationOutcome::AlreadyVerified => "already verified",
        }
    }
}

#[async_trait]
/// Trait contract for source-verification services.
pub trait SourceVerifier: Send + Sync {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl EtherscanResponse {
    fn result_text(&self) -> String {
        match &self.result {
            Value::String(text) => text.clone(),
            Value::Null => self.message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
/// Public struct `EtherscanVerifier` used for `verifysourcecode` submissions.
pub struct EtherscanVerifier {
    client: reqwest::Client,
    config: VerifierConfig,
}

impl EtherscanVerifier {
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    async fn submit(
        &self,
        request: &VerificationRequest,
    ) -> Result<EtherscanResponse, VerifyError> {
        let source_code = serde_json::to_string(&request.standard_json_input)?;
        let compiler_version = format!("v{}", request.compiler_version.trim_start_matches('v'));
        let contract_address = request.address.to_checksum(None);
        let form = [
            ("apikey", self.config.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", contract_address.as_str()),
            ("sourceCode", source_code.as_str()),
            ("codeformat", CODE_FORMAT_STANDARD_JSON),
            ("contractname", request.contract_name.as_str()),
            ("compilerversion", compiler_version.as_str()),
            // Etherscan's parameter name is misspelled.
            ("constructorArguements", request.constructor_arguments.as_str()),
        ];
        let response = self
            .client
            .post(&self.config.api_url)
            .query(&[("chainid", request.chain_id.to_string())])
            .form(&form)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn check_status(
        &self,
        chain_id: u64,
        guid: &str,
    ) -> Result<EtherscanResponse, VerifyError> {
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("chainid", chain_id.to_string().as_str()),
                ("apikey", self.config.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await?;
        parse_response(response).await
    }
}

#[async_trait]
impl SourceVerifier for EtherscanVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, VerifyError> {
        let submitted = self.submit(request).await?;
        let submitted_text = submitted.result_text();
        if submitted.status != "1" {
            if contains_marker(&submitted_text, ALREADY_VERIFIED_MARKER) {
                return Ok(VerificationOutcome::AlreadyVerified);
            }
            return Err(VerifyError::Rejected(submitted_text));
        }
        let guid = submitted_text;
        tracing::debug!(
            contract = %request.contract_name,
            guid = %guid,
            "verification submitted"
        );

        let interval = Duration::from_millis(self.config.poll_interval_ms);
        for _ in 0..self.config.max_polls {
            tokio::time::sleep(interval).await;
            let status = self.check_status(request.chain_id, &guid).await?;
            let text = status.result_text();
            if contains_marker(&text, PENDING_MARKER) {
                continue;
            }
            if contains_marker(&text, ALREADY_VERIFIED_MARKER) {
                return Ok(VerificationOutcome::AlreadyVerified);
            }
            if status.status == "1" || contains_marker(&text, PASS_MARKER) {
                return Ok(VerificationOutcome::Verified);
            }
            return Err(VerifyError::Failed(text));
        }
        Err(VerifyError::StillPending {
            attempts: self.config.max_polls,
        })
    }
}

async fn parse_response(response: reqwest::Response) -> Result<EtherscanResponse, VerifyError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(VerifyError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

fn contains_marker(text: &str, marker: &str) -> bool {
    text.to_ascii_lowercase().contains(marker)
}
