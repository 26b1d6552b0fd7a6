//! Blockchain client seam
//!
//! The workflow only needs a handful of capabilities from a chain: read
//! calls, nonce lookup, gas estimation, signed broadcast and receipt lookup.
//! [`ChainClient`] is that surface; [`evm::EvmChainClient`] implements it over
//! alloy, and the `testing` module provides an in-memory ledger.

pub mod contracts;
pub mod evm;

use crate::accounts::Account;
use crate::error::ClaimerResult;
use crate::networks::Network;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

pub use evm::{EvmChainClient, EvmConnector};

/// EIP-1559 fee parameters, in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// A transaction the workflow wants signed and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub chain_id: u64,
    pub nonce: u64,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub fees: GasFees,
    /// Filled in from gas estimation before broadcast
    pub gas_limit: Option<u64>,
}

/// Chain capabilities for one signing account
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address this client signs for
    fn address(&self) -> Address;

    /// Read-only contract call
    async fn call(&self, to: Address, data: Bytes) -> ClaimerResult<Bytes>;

    /// Next nonce for [`ChainClient::address`]
    async fn nonce(&self) -> ClaimerResult<u64>;

    /// Estimate gas; fails with `InsufficientFunds` when the sender cannot pay
    async fn estimate_gas(&self, tx: &TxRequest) -> ClaimerResult<u64>;

    /// Sign and broadcast, returning the transaction hash
    async fn send_transaction(&self, tx: TxRequest) -> ClaimerResult<TxHash>;

    /// Receipt status if the transaction is mined: `true` = success
    async fn transaction_status(&self, hash: TxHash) -> ClaimerResult<Option<bool>>;
}

/// Builds a [`ChainClient`] for an account on the selected network
pub trait ChainConnector: Send + Sync {
    fn connect(&self, account: &Account, network: &Network) -> ClaimerResult<Arc<dyn ChainClient>>;
}

/// Token balance of `owner`
pub async fn token_balance(chain: &dyn ChainClient, token: Address, owner: Address) -> ClaimerResult<U256> {
    let raw = chain.call(token, contracts::encode_balance_of(owner)).await?;
    contracts::decode_balance(&raw)
}

/// Poll for a receipt until `timeout`
///
/// Lookup errors are logged and polling continues. Returns `None` if no
/// receipt appeared in time.
pub async fn wait_for_receipt(
    chain: &dyn ChainClient,
    hash: TxHash,
    timeout: Duration,
    logging_prefix: &str,
) -> Option<bool> {
    let start = Instant::now();
    let pause = (timeout / 10).min(Duration::from_secs(5));

    loop {
        match chain.transaction_status(hash).await {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => warn!(
                "[{}] Exception occurred while waiting for transaction receipt: {}",
                logging_prefix, e
            ),
        }

        if start.elapsed() >= timeout {
            return None;
        }
        tokio::time::sleep(pause).await;
    }
}
