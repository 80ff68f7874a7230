use std::time::{Duration, Instant};

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use crate::artifact::ContractArtifact;
use crate::rpc::{RpcClient, RpcConfig, TransactionRequest};
use crate::types::{
    parse_function, ContractCall, ContractDeployer, ContractError, DeployedContract,
    TransactionHandle, TransactionReceipt, TransactionStatus,
};

/// Reads, writes and deploys contracts through one sending account.
#[derive(Debug)]
pub struct ContractClient {
    rpc: RpcClient,
    from: Address,
}

impl ContractClient {
    pub fn new(rpc: RpcClient, from: Address) -> Self {
        Self { rpc, from }
    }

    /// Builds a client; without `from`, the node's first account signs.
    pub async fn connect(config: RpcConfig, from: Option<Address>) -> Result<Self, ContractError> {
        let rpc = RpcClient::new(config)?;
        let from = match from {
            Some(address) => address,
            None => rpc
                .accounts()
                .await?
                .into_iter()
                .next()
                .ok_or(ContractError::NoAccounts)?,
        };
        tracing::debug!(from = %from, "contract client ready");
        Ok(Self { rpc, from })
    }

    pub fn from_address(&self) -> Address {
        self.from
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// `eth_call` against `contract` with a textual signature, e.g.
    /// `getTotalMusic() returns (uint256)`.
    pub async fn read(
        &self,
        contract: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ContractError> {
        let function = parse_function(signature)?;
        let data = function.abi_encode_input(args)?;
        let output = self.eth_call(contract, data).await?;
        Ok(function.abi_decode_output(&output, true)?)
    }

    /// `eth_call` with a generated binding; returns its decoded return struct.
    pub async fn query<C: SolCall>(
        &self,
        contract: Address,
        call: &C,
    ) -> Result<C::Return, ContractError> {
        let output = self.eth_call(contract, call.abi_encode()).await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    async fn eth_call(&self, contract: Address, data: Vec<u8>) -> Result<Vec<u8>, ContractError> {
        self.rpc
            .call(&TransactionRequest {
                from: self.from,
                to: Some(contract),
                data,
                value: U256::ZERO,
            })
            .await
    }

    /// `eth_sendTransaction` with a textual function signature.
    pub async fn write(
        &self,
        contract: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<TransactionHandle, ContractError> {
        let call = ContractCall::from_signature(signature, args)?;
        self.send(contract, &call).await
    }

    pub async fn send(
        &self,
        contract: Address,
        call: &ContractCall,
    ) -> Result<TransactionHandle, ContractError> {
        let hash = self
            .rpc
            .send_transaction(&TransactionRequest {
                from: self.from,
                to: Some(contract),
                data: call.calldata.clone(),
                value: call.value,
            })
            .await?;
        tracing::debug!(
            function = %call.function,
            tx = %hash,
            "transaction submitted"
        );
        Ok(TransactionHandle { hash })
    }

    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[DynSolValue],
    ) -> Result<DeployedContract, ContractError> {
        let mut data = artifact.creation_code()?;
        if !constructor_args.is_empty() {
            data.extend(DynSolValue::Tuple(constructor_args.to_vec()).abi_encode_params());
        }
        let hash = self
            .rpc
            .send_transaction(&TransactionRequest {
                from: self.from,
                to: None,
                data,
                value: U256::ZERO,
            })
            .await?;
        let receipt = self
            .wait_for_confirmation(TransactionHandle { hash })
            .await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ContractError::InvalidResponse(format!(
                "deployment receipt for {} has no contractAddress",
                artifact.contract_name
            ))
        })?;
        Ok(DeployedContract {
            name: artifact.contract_name.clone(),
            address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// One receipt lookup, mapped onto the status flags.
    pub async fn transaction_status(&self, handle: TransactionHandle) -> TransactionStatus {
        match self.rpc.transaction_receipt(handle.hash).await {
            Ok(None) => TransactionStatus::Confirming(handle.hash),
            Ok(Some(receipt)) if receipt.success => TransactionStatus::Confirmed(receipt),
            Ok(Some(_)) => {
                TransactionStatus::Error(ContractError::Reverted(handle.to_string()).to_string())
            }
            Err(error) => TransactionStatus::Error(error.to_string()),
        }
    }

    /// Polls for a receipt until mined or the confirmation timeout elapses.
    pub async fn wait_for_confirmation(
        &self,
        handle: TransactionHandle,
    ) -> Result<TransactionReceipt, ContractError> {
        let config = self.rpc.config();
        let started = Instant::now();
        let timeout = Duration::from_millis(config.confirmation_timeout_ms);
        let interval = Duration::from_millis(config.confirmation_poll_ms.max(1));
        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(handle.hash).await? {
                if !receipt.success {
                    return Err(ContractError::Reverted(handle.to_string()));
                }
                return Ok(receipt);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(ContractError::ConfirmationTimeout {
                    hash: handle.to_string(),
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(interval.min(timeout - waited)).await;
        }
    }
}

#[async_trait]
impl ContractDeployer for ContractClient {
    async fn chain_id(&self) -> Result<u64, ContractError> {
        self.rpc.chain_id().await
    }

    async fn deploy_contract(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<DeployedContract, ContractError> {
        self.deploy(artifact, &[]).await
    }

    async fn execute(
        &self,
        contract: Address,
        call: &ContractCall,
    ) -> Result<TransactionReceipt, ContractError> {
        let handle = self.send(contract, call).await?;
        self.wait_for_confirmation(handle).await
    }
}

/// Tracks one write through `Idle -> Pending -> Confirming -> Confirmed | Error`.
#[derive(Debug, Clone, Default)]
pub struct TransactionTracker {
    status: TransactionStatus,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    pub async fn submit(
        &mut self,
        client: &ContractClient,
        contract: Address,
        call: &ContractCall,
    ) -> Result<TransactionHandle, ContractError> {
        self.status = TransactionStatus::Pending;
        match client.send(contract, call).await {
            Ok(handle) => {
                self.status = TransactionStatus::Confirming(handle.hash);
                Ok(handle)
            }
            Err(error) => {
                self.status = TransactionStatus::Error(error.to_string());
                Err(error)
            }
        }
    }

    /// Refreshes a confirming transaction once; other states are left as is.
    pub async fn refresh(&mut self, client: &ContractClient) -> &TransactionStatus {
        if let TransactionStatus::Confirming(hash) = self.status {
            self.status = client.transaction_status(TransactionHandle { hash }).await;
        }
        &self.status
    }

    pub async fn wait(
        &mut self,
        client: &ContractClient,
    ) -> Result<TransactionReceipt, ContractError> {
        let TransactionStatus::Confirming(hash) = self.status else {
            return match &self.status {
                TransactionStatus::Confirmed(receipt) => Ok(receipt.clone()),
                other => Err(ContractError::InvalidResponse(format!(
                    "no transaction awaiting confirmation (status {other:?})"
                ))),
            };
        };
        match client.wait_for_confirmation(TransactionHandle { hash }).await {
            Ok(receipt) => {
                self.status = TransactionStatus::Confirmed(receipt.clone());
                Ok(receipt)
            }
            Err(error) => {
                self.status = TransactionStatus::Error(error.to_string());
                Err(error)
            }
        }
    }
}
