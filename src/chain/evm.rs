//! alloy-backed chain client
//!
//! RPC traffic goes through the account's proxy: the provider is built on an
//! HTTP transport that wraps the same proxied `reqwest` client the HTTP
//! services use.

use super::{ChainClient, ChainConnector, TxRequest};
use crate::accounts::Account;
use crate::error::{ClaimerError, ClaimerResult};
use crate::networks::Network;
use crate::services::http_client;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::Http;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;

pub struct EvmChainClient {
    provider: DynProvider,
    address: Address,
}

impl EvmChainClient {
    pub fn connect(signer: PrivateKeySigner, rpc_url: &str, proxy: Option<&str>) -> ClaimerResult<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| ClaimerError::ConfigError(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

        let transport = Http::with_client(http_client(proxy)?, url);
        let client = RpcClient::new(transport, false);

        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_client(client)
            .erased();

        Ok(Self { provider, address })
    }

    fn request(&self, tx: &TxRequest) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_from(self.address)
            .with_to(tx.to)
            .with_input(tx.data.clone())
            .with_value(tx.value)
            .with_chain_id(tx.chain_id)
            .with_nonce(tx.nonce)
            .with_max_fee_per_gas(tx.fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(tx.fees.max_priority_fee_per_gas);

        match tx.gas_limit {
            Some(gas) => request.with_gas_limit(gas),
            None => request,
        }
    }
}

fn rpc_error(e: impl Display) -> ClaimerError {
    ClaimerError::RpcError(e.to_string())
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn call(&self, to: Address, data: Bytes) -> ClaimerResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider.call(request).await.map_err(rpc_error)
    }

    async fn nonce(&self) -> ClaimerResult<u64> {
        self.provider
            .get_transaction_count(self.address)
            .await
            .map_err(rpc_error)
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> ClaimerResult<u64> {
        self.provider
            .estimate_gas(self.request(tx))
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.to_lowercase().contains("insufficient funds") {
                    ClaimerError::InsufficientFunds(message)
                } else {
                    ClaimerError::RpcError(message)
                }
            })
    }

    async fn send_transaction(&self, tx: TxRequest) -> ClaimerResult<TxHash> {
        let pending = self
            .provider
            .send_transaction(self.request(&tx))
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_status(&self, hash: TxHash) -> ClaimerResult<Option<bool>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(rpc_error)?;
        Ok(receipt.map(|r| r.status()))
    }
}

/// Connects accounts to their network over their own proxy
#[derive(Debug, Default, Clone, Copy)]
pub struct EvmConnector;

impl ChainConnector for EvmConnector {
    fn connect(&self, account: &Account, network: &Network) -> ClaimerResult<Arc<dyn ChainClient>> {
        let client = EvmChainClient::connect(account.signer().clone(), &network.rpc_url, account.proxy())?;
        Ok(Arc::new(client))
    }
}
