//! Shared harness for the integration tests

#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zro_claimer::config::PathsConfig;
use zro_claimer::logic::{CommissionRate, LedgerEntry};
use zro_claimer::networks::{Network, NetworkName, TOKEN_ADDRESS};
use zro_claimer::pacing::SleepPolicy;
use zro_claimer::services::{CommissionRouter, FixedCommissionRouter};
use zro_claimer::store::ProgressStore;
use zro_claimer::testing::{
    test_account, test_paths, MockAirdropApi, MockChain, MockConnector, StaticGasOracle,
};
use zro_claimer::{Account, AccountOutcome, ClaimContext, ClaimWorkflow, WorkflowSettings};

pub fn commission_address() -> Address {
    Address::repeat_byte(0xcc)
}

pub fn deposit_address(seed: u8) -> Address {
    Address::left_padding_from(&[0xde, seed])
}

pub struct Harness {
    pub dir: TempDir,
    pub paths: PathsConfig,
    pub store: Arc<ProgressStore>,
    pub chain: Arc<MockChain>,
    pub connector: Arc<MockConnector>,
    pub airdrop: Arc<MockAirdropApi>,
    pub gas: Arc<StaticGasOracle>,
    pub router: Arc<dyn CommissionRouter>,
    pub network: Network,
    pub settings: WorkflowSettings,
}

impl Harness {
    pub async fn new(network: NetworkName) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = test_paths(dir.path());
        ProgressStore::initialize_missing(&paths).await.unwrap();
        let store = Arc::new(ProgressStore::open(&paths).await.unwrap());
        let chain = Arc::new(MockChain::new());

        Self {
            dir,
            paths,
            store,
            connector: Arc::new(MockConnector::new(Arc::clone(&chain))),
            chain,
            airdrop: Arc::new(MockAirdropApi::new()),
            gas: Arc::new(StaticGasOracle::new()),
            router: Arc::new(FixedCommissionRouter::new(commission_address())),
            network: Network::resolve(network, &HashMap::new()),
            settings: WorkflowSettings {
                max_retries: 3,
                commission_rate: CommissionRate::from_bps(300),
                eth_price_usd: 3500,
                balance_poll_interval: Duration::from_millis(5),
                receipt_timeout: Duration::from_secs(1),
                sleep: SleepPolicy::none(),
            },
        }
    }

    pub fn context(&self) -> Arc<ClaimContext> {
        Arc::new(ClaimContext {
            network: self.network.clone(),
            token: TOKEN_ADDRESS,
            store: Arc::clone(&self.store),
            airdrop: self.airdrop.clone(),
            gas: self.gas.clone(),
            commission_router: Arc::clone(&self.router),
            connector: self.connector.clone(),
            settings: self.settings.clone(),
        })
    }

    /// Account with a resolved allocation that the airdrop API can prove
    pub fn account(&self, seed: u8, allocation: u64) -> Account {
        let mut account = test_account(seed, deposit_address(seed)).unwrap();
        account.set_allocation(U256::from(allocation)).unwrap();
        if allocation > 0 {
            self.airdrop.set_allocation(account.address(), U256::from(allocation));
        }
        account
    }

    /// Run a single workflow whose ledger holds only this account
    pub async fn run_one(&self, account: Account, commission: u64) -> AccountOutcome {
        let ledger = Arc::new(vec![LedgerEntry {
            address: account.address(),
            allocation: account.allocation(),
        }]);
        ClaimWorkflow::new(self.context(), ledger, account, U256::from(commission))
            .run()
            .await
    }
}
