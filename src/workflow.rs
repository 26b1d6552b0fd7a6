//! Per-account claim workflow
//!
//! Each attempt starts from the account's token balance:
//!
//! 1. Zero balance and not yet claimed: fetch the proof, submit the claim,
//!    wait for the tokens to arrive, then record the address as claimed.
//! 2. Send the outstanding commission share to the commission recipient and
//!    settle it against the paid-commission ledger.
//! 3. Send whatever is left to the account's deposit address.
//!
//! Recoverable failures restart the attempt from the balance check. A
//! commission share that was already transferred is never sent again.

use crate::accounts::Account;
use crate::chain::contracts::encode_transfer;
use crate::chain::{token_balance, wait_for_receipt, ChainClient, ChainConnector, GasFees, TxRequest};
use crate::claim::prepare_claim;
use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::amounts::format_units;
use crate::logic::{format_token_amount, CommissionRate, LedgerEntry, TOKEN_DECIMALS};
use crate::networks::Network;
use crate::pacing::SleepPolicy;
use crate::services::{AirdropApi, CommissionRouter, GasOracle};
use crate::store::ProgressStore;
use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tunables shared by every workflow in a run
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Attempts per account; values below 1 are treated as 1
    pub max_retries: u32,
    pub commission_rate: CommissionRate,
    pub eth_price_usd: u64,
    pub balance_poll_interval: Duration,
    pub receipt_timeout: Duration,
    pub sleep: SleepPolicy,
}

/// Everything a workflow talks to
pub struct ClaimContext {
    pub network: Network,
    pub token: Address,
    pub store: Arc<ProgressStore>,
    pub airdrop: Arc<dyn AirdropApi>,
    pub gas: Arc<dyn GasOracle>,
    pub commission_router: Arc<dyn CommissionRouter>,
    pub connector: Arc<dyn ChainConnector>,
    pub settings: WorkflowSettings,
}

/// Terminal state of an account's workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Tokens claimed (or already held) and fully distributed
    Completed,
    /// Stopped for good: the account cannot make progress
    Abandoned(String),
    /// Every attempt ended in a recoverable failure
    RetriesExhausted,
}

pub struct ClaimWorkflow {
    ctx: Arc<ClaimContext>,
    ledger: Arc<Vec<LedgerEntry>>,
    account: Account,
    commission_outstanding: U256,
}

impl ClaimWorkflow {
    pub fn new(ctx: Arc<ClaimContext>, ledger: Arc<Vec<LedgerEntry>>, account: Account, commission: U256) -> Self {
        Self {
            ctx,
            ledger,
            account,
            commission_outstanding: commission,
        }
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    /// Drive the account to a terminal state
    pub async fn run(mut self) -> AccountOutcome {
        info!(
            "[Claim] Processing account {} ({}) with {} $ZRO and {} $ZRO as commission",
            self.account.address(),
            self.account.short_private_key(),
            format_token_amount(self.account.allocation()),
            format_token_amount(self.commission_outstanding)
        );

        let chain = match self.ctx.connector.connect(&self.account, &self.ctx.network) {
            Ok(chain) => chain,
            Err(e) => {
                error!("[Claim] Failed to connect {} to {}: {}", self.address(), self.ctx.network, e);
                return AccountOutcome::Abandoned(e.to_string());
            }
        };

        let attempts = self.ctx.settings.max_retries.max(1);
        for attempt in 1..=attempts {
            debug!("[Claim] {} attempt {}/{}", self.address(), attempt, attempts);

            match self.attempt(chain.as_ref()).await {
                Ok(()) => {
                    info!("[Claim] Finished processing account {}", self.address());
                    return AccountOutcome::Completed;
                }
                Err(e) if e.is_fatal_for_account() => {
                    error!("[Claim] CRITICAL: Abandoning account {}: {}", self.address(), e);
                    return AccountOutcome::Abandoned(e.to_string());
                }
                Err(e) => {
                    error!("[Claim] Exception occurred while processing account {}: {}", self.address(), e);
                }
            }
        }

        warn!("[Claim] Gave up on {} after {} attempts", self.address(), attempts);
        AccountOutcome::RetriesExhausted
    }

    async fn attempt(&mut self, chain: &dyn ChainClient) -> ClaimerResult<()> {
        let address = self.address();
        let balance = token_balance(chain, self.ctx.token, address).await?;

        let balance = if !balance.is_zero() {
            debug!("[Claim] {} already holds {} $ZRO", address, format_token_amount(balance));
            balance
        } else if self.ctx.store.is_claimed(address).await? {
            info!("[Claim] {} is already claimed and has nothing left to distribute", address);
            return Ok(());
        } else {
            self.claim(chain).await?
        };

        self.distribute(chain, balance).await
    }

    /// Submit the claim and wait for the tokens; returns the new balance
    async fn claim(&self, chain: &dyn ChainClient) -> ClaimerResult<U256> {
        let address = self.address();
        let proof = self.ctx.airdrop.proof(address, self.account.proxy()).await?;

        let prepared = prepare_claim(
            &self.ctx.network,
            chain,
            &proof,
            address,
            self.ctx.settings.eth_price_usd,
        )
        .await?;

        info!(
            "[Claim] Claiming {} $ZRO for {} with a donation of {} native",
            format_token_amount(proof.amount),
            address,
            format_units(prepared.donation, TOKEN_DECIMALS)
        );

        let tx = TxRequest {
            chain_id: self.ctx.network.chain_id,
            nonce: chain.nonce().await?,
            to: prepared.contract,
            data: prepared.data,
            value: prepared.value,
            fees: self.gas_fees().await?,
            gas_limit: None,
        };
        let hash = self.submit(chain, tx, "claim").await?;

        match wait_for_receipt(chain, hash, self.ctx.settings.receipt_timeout, "Claim").await {
            Some(true) => info!("[Claim] Claimed $ZRO: {}", self.ctx.network.tx_link(hash)),
            Some(false) => error!("[Claim] Claim transaction reverted: {}", self.ctx.network.tx_link(hash)),
            None => warn!("[Claim] No receipt for claim transaction {}", self.ctx.network.tx_link(hash)),
        }

        // Unbounded: a claim that never lands keeps this account waiting here.
        let balance = loop {
            let balance = token_balance(chain, self.ctx.token, address).await?;
            if !balance.is_zero() {
                break balance;
            }
            debug!("[Claim] Waiting for $ZRO to arrive at {}", address);
            tokio::time::sleep(self.ctx.settings.balance_poll_interval).await;
        };

        self.ctx.store.mark_claimed(address).await?;
        self.ctx.settings.sleep.sleep().await;

        Ok(balance)
    }

    async fn distribute(&mut self, chain: &dyn ChainClient, balance: U256) -> ClaimerResult<()> {
        let address = self.address();
        let commission = self.commission_outstanding.min(balance);

        if !commission.is_zero() {
            info!("[Claim] Sending {} $ZRO as commission", format_token_amount(commission));

            let recipient = self
                .ctx
                .commission_router
                .commission_address(address, self.account.proxy())
                .await?;
            let hash = self.transfer(chain, recipient, commission, "commission").await?;

            info!("[Claim] Sent commission: {}", self.ctx.network.tx_link(hash));
            self.commission_outstanding -= commission;

            let settled = self
                .ctx
                .store
                .settle_commission(&self.ledger, commission, self.ctx.settings.commission_rate)
                .await;
            match settled {
                Ok(appended) => debug!("[Claim] Commission ledger now covers {} more accounts", appended.len()),
                Err(e) => error!("[Claim] Failed to record paid commission for {}: {}", address, e),
            }

            self.ctx.settings.sleep.sleep().await;
        }

        let remainder = balance - commission;
        if remainder.is_zero() {
            return Ok(());
        }

        let deposit = self.account.deposit_address();
        info!("[Claim] Sending {} $ZRO to {}", format_token_amount(remainder), deposit);

        let hash = self.transfer(chain, deposit, remainder, "transfer").await?;
        info!("[Claim] Sent $ZRO to deposit address: {}", self.ctx.network.tx_link(hash));

        Ok(())
    }

    /// Token transfer that only returns once it is confirmed successful
    async fn transfer(
        &self,
        chain: &dyn ChainClient,
        to: Address,
        amount: U256,
        step: &str,
    ) -> ClaimerResult<TxHash> {
        let tx = TxRequest {
            chain_id: self.ctx.network.chain_id,
            nonce: chain.nonce().await?,
            to: self.ctx.token,
            data: encode_transfer(to, amount),
            value: U256::ZERO,
            fees: self.gas_fees().await?,
            gas_limit: None,
        };
        let hash = self.submit(chain, tx, step).await?;

        match wait_for_receipt(chain, hash, self.ctx.settings.receipt_timeout, "Claim").await {
            Some(true) => Ok(hash),
            _ => {
                error!("[Claim] Failed to send {}: {}", step, self.ctx.network.tx_link(hash));
                Err(ClaimerError::TransactionFailed {
                    step: step.to_string(),
                    tx_hash: hash.to_string(),
                })
            }
        }
    }

    async fn gas_fees(&self) -> ClaimerResult<GasFees> {
        let chain_id = self.ctx.network.chain_id;
        self.ctx
            .gas
            .suggest_gas_fees(chain_id, self.account.proxy())
            .await
            .ok_or(ClaimerError::GasUnavailable { chain_id })
    }

    async fn submit(&self, chain: &dyn ChainClient, mut tx: TxRequest, step: &str) -> ClaimerResult<TxHash> {
        match chain.estimate_gas(&tx).await {
            Ok(gas) => tx.gas_limit = Some(gas),
            Err(ClaimerError::InsufficientFunds(reason)) => {
                error!("[Claim] CRITICAL: Insufficient balance for {} from {}", step, self.address());
                return Err(ClaimerError::InsufficientFunds(reason));
            }
            Err(e) => {
                error!("[Claim] Exception occurred while estimating gas for {}: {}", step, e);
                return Err(e);
            }
        }
        chain.send_transaction(tx).await
    }
}
