//! Contract interaction layer for Secure Music Flow.
//!
//! Wraps Ethereum JSON-RPC with Hardhat artifact loading, `sol!` bindings for
//! the `FHEEncryption` and `SecureMusicFlow` contracts, the encrypted-data
//! flows built on them and the read/write/confirm primitives used by
//! deployment tooling.
pub mod artifact;
pub mod bindings;
mod client;
pub mod encrypted_data;
mod rpc;
mod types;

pub use alloy_dyn_abi::DynSolValue;
pub use alloy_primitives::{Address, B256, U256};
pub use client::{ContractClient, TransactionTracker};
pub use encrypted_data::{EncryptedDataError, EncryptedDataSession, SensitiveDataKind};
pub use rpc::{
    parse_address, RpcClient, RpcConfig, TransactionRequest, DEFAULT_CONFIRMATION_POLL_MS,
    DEFAULT_CONFIRMATION_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RPC_URL,
};
pub use types::{
    parse_function, ContractCall, ContractDeployer, ContractError, DeployedContract,
    TransactionHandle, TransactionReceipt, TransactionStatus,
};
