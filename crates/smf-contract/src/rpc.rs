use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{hex, Address, B256, U256};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{ContractError, TransactionReceipt};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONFIRMATION_POLL_MS: u64 = 1_000;
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RpcConfig` used by JSON-RPC clients.
pub struct RpcConfig {
    pub url: String,
    pub request_timeout_ms: u64,
    pub confirmation_poll_ms: u64,
    pub confirmation_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            confirmation_poll_ms: DEFAULT_CONFIRMATION_POLL_MS,
            confirmation_timeout_ms: DEFAULT_CONFIRMATION_TIMEOUT_MS,
        }
    }
}

/// Transaction fields understood by `eth_sendTransaction` and `eth_call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub data: Vec<u8>,
    pub value: U256,
}

impl TransactionRequest {
    fn to_json(&self) -> Value {
        let mut object = json!({
            "from": hex::encode_prefixed(self.from),
            "data": hex::encode_prefixed(&self.data),
        });
        if let Some(to) = self.to {
            object["to"] = Value::String(hex::encode_prefixed(to));
        }
        if !self.value.is_zero() {
            object["value"] = Value::String(format!("0x{:x}", self.value));
        }
        object
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug)]
/// Public struct `RpcClient` speaking Ethereum JSON-RPC 2.0 over HTTP.
pub struct RpcClient {
    client: reqwest::Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Result<Self, ContractError> {
        if config.url.trim().is_empty() {
            return Err(ContractError::InvalidResponse(
                "rpc url cannot be empty".to_string(),
            ));
        }
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Issues one JSON-RPC request; `Ok(None)` when the node answers `null`.
    pub async fn request_optional(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<Value>, ContractError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(rpc_method = method, rpc_id = id, "sending json-rpc request");
        let response = self
            .client
            .post(&self.config.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ContractError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let envelope: RpcEnvelope = serde_json::from_str(&body)?;
        if let Some(error) = envelope.error {
            tracing::debug!(
                rpc_method = method,
                rpc_id = id,
                code = error.code,
                "json-rpc request failed"
            );
            return Err(ContractError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result.filter(|value| !value.is_null()))
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ContractError> {
        self.request_optional(method, params)
            .await?
            .ok_or_else(|| ContractError::InvalidResponse(format!("{method} returned no result")))
    }

    pub async fn chain_id(&self) -> Result<u64, ContractError> {
        let value = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&value)
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, ContractError> {
        let value = self.request("eth_accounts", json!([])).await?;
        let entries = value.as_array().ok_or_else(|| {
            ContractError::InvalidResponse("eth_accounts result is not an array".to_string())
        })?;
        entries
            .iter()
            .map(|entry| parse_address(entry.as_str().unwrap_or_default()))
            .collect()
    }

    pub async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<B256, ContractError> {
        let value = self
            .request("eth_sendTransaction", json!([request.to_json()]))
            .await?;
        parse_hash(value.as_str().unwrap_or_default())
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ContractError> {
        let Some(value) = self
            .request_optional(
                "eth_getTransactionReceipt",
                json!([hex::encode_prefixed(hash)]),
            )
            .await?
        else {
            return Ok(None);
        };
        let raw: RawReceipt = serde_json::from_value(value)?;
        Ok(Some(convert_receipt(raw)?))
    }

    pub async fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>, ContractError> {
        let value = self
            .request("eth_call", json!([request.to_json(), "latest"]))
            .await?;
        let raw = value.as_str().ok_or_else(|| {
            ContractError::InvalidResponse("eth_call result is not a hex string".to_string())
        })?;
        Ok(hex::decode(raw)?)
    }
}

fn convert_receipt(raw: RawReceipt) -> Result<TransactionReceipt, ContractError> {
    let contract_address = raw
        .contract_address
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(parse_address)
        .transpose()?;
    let block_number = raw
        .block_number
        .as_deref()
        .map(parse_quantity_str)
        .transpose()?;
    let gas_used = raw
        .gas_used
        .as_deref()
        .map(parse_quantity_str)
        .transpose()?;
    // Pre-Byzantium receipts carry no status field; treat them as mined.
    let success = match raw.status.as_deref() {
        None => true,
        Some(value) => parse_quantity_str(value)? == 1,
    };
    Ok(TransactionReceipt {
        transaction_hash: parse_hash(&raw.transaction_hash)?,
        contract_address,
        block_number,
        gas_used,
        success,
    })
}

pub fn parse_address(raw: &str) -> Result<Address, ContractError> {
    Address::from_str(raw.trim())
        .map_err(|error| ContractError::InvalidResponse(format!("invalid address '{raw}': {error}")))
}

fn parse_hash(raw: &str) -> Result<B256, ContractError> {
    B256::from_str(raw.trim()).map_err(|error| {
        ContractError::InvalidResponse(format!("invalid transaction hash '{raw}': {error}"))
    })
}

fn parse_quantity(value: &Value) -> Result<u64, ContractError> {
    let raw = value.as_str().ok_or_else(|| {
        ContractError::InvalidResponse(format!("expected hex quantity, got {value}"))
    })?;
    parse_quantity_str(raw)
}

fn parse_quantity_str(raw: &str) -> Result<u64, ContractError> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| ContractError::InvalidResponse(format!("invalid hex quantity '{raw}'")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|_| ContractError::InvalidResponse(format!("invalid hex quantity '{raw}'")))
}
