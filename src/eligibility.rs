//! Allocation lookup with a persistent cache

use crate::accounts::Account;
use crate::error::ClaimerResult;
use crate::logic::format_token_amount;
use crate::services::{AirdropApi, Allocation};
use crate::store::ProgressStore;
use alloy::primitives::U256;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct EligibilityResolver {
    store: Arc<ProgressStore>,
    api: Arc<dyn AirdropApi>,
}

impl EligibilityResolver {
    pub fn new(store: Arc<ProgressStore>, api: Arc<dyn AirdropApi>) -> Self {
        Self { store, api }
    }

    /// Set every account's allocation, asking the API only for unknown addresses
    ///
    /// Accounts are resolved one at a time and each new answer is persisted
    /// before the next lookup. The first failed lookup stops resolution and
    /// is returned; answers recorded before it stay on disk.
    pub async fn resolve(&self, mut accounts: Vec<Account>) -> ClaimerResult<Vec<Account>> {
        for account in accounts.iter_mut().filter(|a| !a.has_allocation()) {
            let address = account.address();

            let amount = match self.store.eligibility(address).await {
                Some(amount) => amount,
                None => {
                    let amount = match self.api.allocation(address, account.proxy()).await {
                        Ok(Allocation::Eligible(amount)) => amount,
                        Ok(Allocation::NotFound) => {
                            warn!("[Eligibility] Account with address {} is not eligible", address);
                            U256::ZERO
                        }
                        Err(e) => {
                            error!("[Eligibility] Failed to get eligibility for {}: {}", address, e);
                            return Err(e);
                        }
                    };
                    self.store.record_eligibility(address, amount).await?;
                    amount
                }
            };

            account.set_allocation(amount)?;
        }

        let eligible = accounts.iter().filter(|a| !a.allocation().is_zero()).count();
        let total = accounts.iter().fold(U256::ZERO, |sum, a| sum + a.allocation());
        info!(
            "[Eligibility] {} of {} accounts are eligible for {} $ZRO in total",
            eligible,
            accounts.len(),
            format_token_amount(total)
        );

        Ok(accounts)
    }
}
