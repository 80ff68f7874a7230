use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_primitives::{hex, Address, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use thiserror::Error;

use crate::artifact::ContractArtifact;

#[derive(Debug, Error)]
/// Enumerates supported `ContractError` values.
pub enum ContractError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("rpc endpoint returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("node exposes no unlocked accounts to send from")]
    NoAccounts,
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("transaction {hash} not confirmed after {waited_ms}ms")]
    ConfirmationTimeout { hash: String, waited_ms: u64 },
    #[error("invalid function signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    SolTypes(#[from] alloy_sol_types::Error),
    #[error(transparent)]
    DynAbi(#[from] alloy_dyn_abi::Error),
}

/// Parses a human-readable signature such as `getTotalMusic() returns (uint256)`.
pub fn parse_function(signature: &str) -> Result<Function, ContractError> {
    Function::parse(signature).map_err(|error| ContractError::InvalidSignature {
        signature: signature.to_string(),
        reason: error.to_string(),
    })
}

/// Mined transaction outcome as reported by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub success: bool,
}

/// Deployed contract handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
}

impl DeployedContract {
    pub fn checksummed_address(&self) -> String {
        self.address.to_checksum(None)
    }
}

/// State-changing call: encoded calldata plus attached wei.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Canonical signature, e.g. `updateFHEPublicKey(string)`.
    pub function: String,
    pub calldata: Vec<u8>,
    pub value: U256,
}

impl ContractCall {
    pub fn from_sol<C: SolCall>(call: &C) -> Self {
        Self {
            function: C::SIGNATURE.to_string(),
            calldata: call.abi_encode(),
            value: U256::ZERO,
        }
    }

    /// Encodes `args` against a signature string resolved at runtime.
    pub fn from_signature(signature: &str, args: &[DynSolValue]) -> Result<Self, ContractError> {
        let function = parse_function(signature)?;
        let calldata = function.abi_encode_input(args)?;
        Ok(Self {
            function: function.signature(),
            calldata,
            value: U256::ZERO,
        })
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn selector(&self) -> Option<[u8; 4]> {
        self.calldata.get(..4)?.try_into().ok()
    }

    /// Decodes the calldata back into its typed call, checking the selector.
    pub fn decode<C: SolCall>(&self) -> Result<C, ContractError> {
        Ok(C::abi_decode(&self.calldata, true)?)
    }
}

/// Lifecycle of a contract write, mirroring the status flags UI callers poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransactionStatus {
    #[default]
    Idle,
    /// Request built and sent; the node has not returned a hash yet.
    Pending,
    /// Hash known, no receipt yet.
    Confirming(B256),
    Confirmed(TransactionReceipt),
    Error(String),
}

impl TransactionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self, TransactionStatus::Confirming(_))
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransactionStatus::Confirmed(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TransactionStatus::Error(_))
    }

    pub fn transaction_hash(&self) -> Option<B256> {
        match self {
            TransactionStatus::Confirming(hash) => Some(*hash),
            TransactionStatus::Confirmed(receipt) => Some(receipt.transaction_hash),
            _ => None,
        }
    }
}

/// Submitted transaction awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHandle {
    pub hash: B256,
}

impl std::fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode_prefixed(self.hash))
    }
}

#[async_trait]
/// Trait contract for deploying and configuring contracts on a chain.
pub trait ContractDeployer: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ContractError>;

    async fn deploy_contract(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<DeployedContract, ContractError>;

    /// Sends `call` to `contract` and waits for a successful receipt.
    async fn execute(
        &self,
        contract: Address,
        call: &ContractCall,
    ) -> Result<TransactionReceipt, ContractError>;
}
