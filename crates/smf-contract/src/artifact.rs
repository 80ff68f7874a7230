//! Hardhat artifact loading for deployable contracts and their build metadata.

use std::path::{Path, PathBuf};

use alloy_primitives::hex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates supported `ArtifactError` values.
pub enum ArtifactError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {path} has unusable bytecode: {reason}")]
    InvalidBytecode { path: PathBuf, reason: String },
    #[error("artifact {path} names contract '{found}', expected '{expected}'")]
    NameMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// Compiled contract as emitted by `hardhat compile`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    #[serde(default)]
    pub abi: Value,
    pub bytecode: String,
}

impl ContractArtifact {
    pub fn creation_code(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.bytecode)
    }

    /// `<sourceName>:<contractName>`, the form verification services expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

/// Compiler input and version recorded by Hardhat for one compilation job.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    pub input: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

pub fn artifact_path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
    artifacts_dir
        .join("contracts")
        .join(format!("{contract_name}.sol"))
        .join(format!("{contract_name}.json"))
}

fn debug_file_path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
    artifact_path(artifacts_dir, contract_name).with_extension("dbg.json")
}

/// Loads and validates the artifact for `contract_name`.
pub fn load_contract_artifact(
    artifacts_dir: &Path,
    contract_name: &str,
) -> Result<ContractArtifact, ArtifactError> {
    let path = artifact_path(artifacts_dir, contract_name);
    let artifact: ContractArtifact = read_json(&path)?;
    if artifact.contract_name != contract_name {
        return Err(ArtifactError::NameMismatch {
            path,
            expected: contract_name.to_string(),
            found: artifact.contract_name,
        });
    }
    match artifact.creation_code() {
        Ok(code) if code.is_empty() => Err(ArtifactError::InvalidBytecode {
            path,
            reason: "bytecode is empty (abstract contract or interface?)".to_string(),
        }),
        Ok(_) => Ok(artifact),
        Err(error) => Err(ArtifactError::InvalidBytecode {
            path,
            reason: error.to_string(),
        }),
    }
}

/// Resolves the build-info file through the artifact's `.dbg.json` pointer.
pub fn load_build_info(
    artifacts_dir: &Path,
    contract_name: &str,
) -> Result<BuildInfo, ArtifactError> {
    let debug_path = debug_file_path(artifacts_dir, contract_name);
    let debug: DebugFile = read_json(&debug_path)?;
    let base = debug_path.parent().unwrap_or_else(|| Path::new("."));
    read_json(&base.join(debug.build_info))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
