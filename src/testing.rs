//! In-memory collaborators for tests
//!
//! [`MockChain`] is one shared token ledger that every account's client
//! reads and writes, so commission and remainder transfers from concurrent
//! workflows land in the same place.

use crate::accounts::Account;
use crate::chain::contracts::{IZroClaim, IERC20};
use crate::chain::{ChainClient, ChainConnector, GasFees, TxRequest};
use crate::config::PathsConfig;
use crate::error::{ClaimerError, ClaimerResult};
use crate::networks::{Network, TOKEN_ADDRESS};
use crate::services::{AirdropApi, Allocation, ClaimProof, CommissionRouter, GasOracle};
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Account with a deterministic key derived from `seed` (must be non-zero)
pub fn test_account(seed: u8, deposit_address: Address) -> ClaimerResult<Account> {
    let key = format!("0x{}", hex::encode([seed; 32]));
    Account::new(&key, None, deposit_address)
}

/// Progress document paths inside `dir`
pub fn test_paths(dir: &Path) -> PathsConfig {
    PathsConfig {
        accounts: dir.join("accounts.json"),
        eligibilities: dir.join("eligibilities.json"),
        claimed: dir.join("claimed.json"),
        paid_commission: dir.join("paid_commission.json"),
        log_file: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimRecord {
    pub account: Address,
    pub recipient: Address,
    pub amount: U256,
    pub value: U256,
    pub succeeded: bool,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    transfers: Vec<TokenTransfer>,
    claims: Vec<ClaimRecord>,
    receipts: HashMap<TxHash, bool>,
    nonces: HashMap<Address, u64>,
    insufficient_funds: HashSet<Address>,
    reverts: HashMap<Address, usize>,
    claim_reverts: usize,
    credit_delay: usize,
    pending_credits: HashMap<Address, (U256, usize)>,
    balance_reads: HashMap<Address, usize>,
    remote_quote: (U256, U256),
    tx_count: u64,
}

impl LedgerState {
    fn take_revert(&mut self, to: Address) -> bool {
        match self.reverts.get_mut(&to) {
            Some(pending) if *pending > 0 => {
                *pending -= 1;
                true
            }
            _ => false,
        }
    }

    fn apply_transfer(&mut self, from: Address, to: Address, amount: U256) -> bool {
        if self.take_revert(to) {
            return false;
        }
        let balance = self.balances.get(&from).copied().unwrap_or_default();
        if balance < amount {
            return false;
        }
        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_default() += amount;
        self.transfers.push(TokenTransfer { from, to, amount });
        true
    }

    fn read_balance(&mut self, owner: Address) -> U256 {
        *self.balance_reads.entry(owner).or_default() += 1;
        let credit = match self.pending_credits.get_mut(&owner) {
            Some((amount, 0)) => Some(*amount),
            Some((_, hidden_reads)) => {
                *hidden_reads -= 1;
                None
            }
            None => None,
        };
        if let Some(amount) = credit {
            self.pending_credits.remove(&owner);
            *self.balances.entry(owner).or_default() += amount;
        }
        self.balances.get(&owner).copied().unwrap_or_default()
    }
}

/// Shared in-memory token ledger and claim contract
pub struct MockChain {
    token: Address,
    state: Mutex<LedgerState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            token: TOKEN_ADDRESS,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Client signing as `address`
    pub fn client(self: &Arc<Self>, address: Address) -> Arc<dyn ChainClient> {
        Arc::new(MockChainClient {
            chain: Arc::clone(self),
            address,
        })
    }

    pub fn set_token_balance(&self, owner: Address, amount: U256) {
        lock(&self.state).balances.insert(owner, amount);
    }

    pub fn token_balance(&self, owner: Address) -> U256 {
        lock(&self.state).balances.get(&owner).copied().unwrap_or_default()
    }

    /// Quote returned by the remote claim contract: (native donation, callback fee)
    pub fn set_remote_quote(&self, donation: U256, fee: U256) {
        lock(&self.state).remote_quote = (donation, fee);
    }

    /// Gas estimation for `address` fails with insufficient funds
    pub fn set_insufficient_funds(&self, address: Address) {
        lock(&self.state).insufficient_funds.insert(address);
    }

    /// The next `count` token transfers to `to` revert
    pub fn revert_next_transfers_to(&self, to: Address, count: usize) {
        lock(&self.state).reverts.insert(to, count);
    }

    /// The next `count` claim transactions revert without minting
    pub fn revert_next_claims(&self, count: usize) {
        lock(&self.state).claim_reverts = count;
    }

    /// Claimed tokens stay invisible for the next `reads` balance reads
    pub fn delay_claim_credit(&self, reads: usize) {
        lock(&self.state).credit_delay = reads;
    }

    /// Number of `balanceOf` calls made for `owner`
    pub fn balance_reads(&self, owner: Address) -> usize {
        lock(&self.state).balance_reads.get(&owner).copied().unwrap_or_default()
    }

    pub fn transfers(&self) -> Vec<TokenTransfer> {
        lock(&self.state).transfers.clone()
    }

    pub fn claims(&self) -> Vec<ClaimRecord> {
        lock(&self.state).claims.clone()
    }

    /// Total token amount received by `to` through transfers
    pub fn received(&self, to: Address) -> U256 {
        lock(&self.state)
            .transfers
            .iter()
            .filter(|t| t.to == to)
            .fold(U256::ZERO, |sum, t| sum + t.amount)
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MockChainClient {
    chain: Arc<MockChain>,
    address: Address,
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn call(&self, to: Address, data: Bytes) -> ClaimerResult<Bytes> {
        let mut state = lock(&self.chain.state);
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ClaimerError::RpcError("calldata too short".into()))?;

        if to == self.chain.token && selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(&data)
                .map_err(|e| ClaimerError::RpcError(e.to_string()))?;
            return Ok(state.read_balance(call.account).abi_encode().into());
        }

        let (donation, fee) = state.remote_quote;
        if selector == IZroClaim::requiredDonationCall::SELECTOR {
            return Ok((U256::ZERO, U256::ZERO, donation).abi_encode().into());
        }
        if selector == IZroClaim::quoteClaimCallbackCall::SELECTOR {
            return Ok((fee, U256::ZERO).abi_encode().into());
        }

        Err(ClaimerError::RpcError(format!("execution reverted: unknown call to {}", to)))
    }

    async fn nonce(&self) -> ClaimerResult<u64> {
        Ok(lock(&self.chain.state).nonces.get(&self.address).copied().unwrap_or_default())
    }

    async fn estimate_gas(&self, _tx: &TxRequest) -> ClaimerResult<u64> {
        if lock(&self.chain.state).insufficient_funds.contains(&self.address) {
            return Err(ClaimerError::InsufficientFunds(
                "insufficient funds for gas * price + value".to_string(),
            ));
        }
        Ok(100_000)
    }

    async fn send_transaction(&self, tx: TxRequest) -> ClaimerResult<TxHash> {
        let mut state = lock(&self.chain.state);

        let success = if tx.to == self.chain.token {
            let call = IERC20::transferCall::abi_decode(&tx.data)
                .map_err(|e| ClaimerError::RpcError(e.to_string()))?;
            state.apply_transfer(self.address, call.to, call.amount)
        } else if let Ok(call) = IZroClaim::donateAndClaimCall::abi_decode(&tx.data) {
            let succeeded = state.claim_reverts == 0;
            state.claim_reverts = state.claim_reverts.saturating_sub(1);
            state.claims.push(ClaimRecord {
                account: self.address,
                recipient: call.to,
                amount: call.zroAmount,
                value: tx.value,
                succeeded,
            });
            if succeeded {
                if state.credit_delay > 0 {
                    let delay = state.credit_delay;
                    state.pending_credits.insert(call.to, (call.zroAmount, delay));
                } else {
                    *state.balances.entry(call.to).or_default() += call.zroAmount;
                }
            }
            succeeded
        } else {
            return Err(ClaimerError::RpcError(format!("unknown transaction to {}", tx.to)));
        };

        state.tx_count += 1;
        *state.nonces.entry(self.address).or_default() += 1;
        let hash = B256::left_padding_from(&state.tx_count.to_be_bytes());
        state.receipts.insert(hash, success);
        Ok(hash)
    }

    async fn transaction_status(&self, hash: TxHash) -> ClaimerResult<Option<bool>> {
        Ok(lock(&self.chain.state).receipts.get(&hash).copied())
    }
}

/// Connects every account to the same [`MockChain`]
pub struct MockConnector {
    chain: Arc<MockChain>,
    connections: Mutex<Vec<Address>>,
}

impl MockConnector {
    pub fn new(chain: Arc<MockChain>) -> Self {
        Self {
            chain,
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Accounts connected so far, in order
    pub fn connections(&self) -> Vec<Address> {
        lock(&self.connections).clone()
    }
}

impl ChainConnector for MockConnector {
    fn connect(&self, account: &Account, _network: &Network) -> ClaimerResult<Arc<dyn ChainClient>> {
        lock(&self.connections).push(account.address());
        Ok(self.chain.client(account.address()))
    }
}

/// Scripted allocation and proof API that records its requests
#[derive(Default)]
pub struct MockAirdropApi {
    allocations: Mutex<HashMap<Address, U256>>,
    failing: Mutex<HashSet<Address>>,
    withheld_proofs: Mutex<HashSet<Address>>,
    allocation_requests: Mutex<Vec<Address>>,
    proof_requests: AtomicUsize,
    proof_delay: Mutex<Duration>,
    proofs_in_flight: AtomicUsize,
    peak_proofs_in_flight: AtomicUsize,
}

impl MockAirdropApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// `address` is eligible for `amount`, and its proof claims that amount
    pub fn set_allocation(&self, address: Address, amount: U256) {
        lock(&self.allocations).insert(address, amount);
    }

    /// Allocation lookups for `address` fail with a server error
    pub fn fail_allocation(&self, address: Address) {
        lock(&self.failing).insert(address);
    }

    /// Proof lookups for `address` fail
    pub fn withhold_proof(&self, address: Address) {
        lock(&self.withheld_proofs).insert(address);
    }

    pub fn allocation_requests(&self) -> Vec<Address> {
        lock(&self.allocation_requests).clone()
    }

    pub fn proof_requests(&self) -> usize {
        self.proof_requests.load(Ordering::SeqCst)
    }

    /// Each proof lookup takes `delay` to answer
    pub fn delay_proofs(&self, delay: Duration) {
        *lock(&self.proof_delay) = delay;
    }

    /// Most proof lookups that were ever outstanding at once
    pub fn peak_proofs_in_flight(&self) -> usize {
        self.peak_proofs_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AirdropApi for MockAirdropApi {
    async fn allocation(&self, address: Address, _proxy: Option<&str>) -> ClaimerResult<Allocation> {
        lock(&self.allocation_requests).push(address);

        if lock(&self.failing).contains(&address) {
            return Err(ClaimerError::ApiCallFailed {
                endpoint: "allocation".to_string(),
                status: 500,
                reason: "Internal Server Error".to_string(),
            });
        }

        Ok(match lock(&self.allocations).get(&address) {
            Some(amount) => Allocation::Eligible(*amount),
            None => Allocation::NotFound,
        })
    }

    async fn proof(&self, address: Address, _proxy: Option<&str>) -> ClaimerResult<ClaimProof> {
        self.proof_requests.fetch_add(1, Ordering::SeqCst);

        let in_flight = self.proofs_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_proofs_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let delay = *lock(&self.proof_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.proofs_in_flight.fetch_sub(1, Ordering::SeqCst);

        let amount = lock(&self.allocations).get(&address).copied();
        match amount {
            Some(amount) if !lock(&self.withheld_proofs).contains(&address) => Ok(ClaimProof {
                proof: vec![B256::repeat_byte(0x11), B256::repeat_byte(0x22)],
                amount,
            }),
            _ => Err(ClaimerError::ProofUnavailable {
                address: address.to_checksum(None),
                reason: "Not Found".to_string(),
            }),
        }
    }
}

/// Fixed fee suggestion, optionally unavailable for the first few requests
pub struct StaticGasOracle {
    fees: GasFees,
    outages: AtomicUsize,
    calls: AtomicUsize,
}

impl StaticGasOracle {
    pub fn new() -> Self {
        Self::with_outages(0)
    }

    /// The first `outages` suggestions are unavailable
    pub fn with_outages(outages: usize) -> Self {
        Self {
            fees: GasFees {
                max_fee_per_gas: 30_000_000_000,
                max_priority_fee_per_gas: 1_000_000_000,
            },
            outages: AtomicUsize::new(outages),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticGasOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GasOracle for StaticGasOracle {
    async fn suggest_gas_fees(&self, _chain_id: u64, _proxy: Option<&str>) -> Option<GasFees> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let in_outage = self
            .outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if in_outage {
            None
        } else {
            Some(self.fees)
        }
    }
}

/// Fixed recipient that rejects the first few requests
pub struct MockCommissionRouter {
    address: Address,
    rejections: AtomicUsize,
    requests: AtomicUsize,
}

impl MockCommissionRouter {
    pub fn new(address: Address, rejections: usize) -> Self {
        Self {
            address,
            rejections: AtomicUsize::new(rejections),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommissionRouter for MockCommissionRouter {
    async fn commission_address(&self, _account: Address, _proxy: Option<&str>) -> ClaimerResult<Address> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let rejected = self
            .rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(ClaimerError::CommissionRejected("try again later".to_string()));
        }
        Ok(self.address)
    }
}
