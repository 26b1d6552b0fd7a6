//! Concurrency-bounded launch of account workflows
//!
//! Accounts with an allocation are launched largest first. A semaphore caps
//! how many workflows run at once, and a random pause separates launches.

use crate::accounts::Account;
use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::{format_token_amount, total_commission_target, CommissionAllocator, LedgerEntry};
use crate::workflow::{AccountOutcome, ClaimContext, ClaimWorkflow};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// What a dispatch run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Accounts in launch order
    pub launched: Vec<Address>,
    pub total_commission: U256,
    pub completed: usize,
    pub abandoned: usize,
    pub retries_exhausted: usize,
}

impl DispatchSummary {
    fn record(&mut self, outcome: &AccountOutcome) {
        match outcome {
            AccountOutcome::Completed => self.completed += 1,
            AccountOutcome::Abandoned(_) => self.abandoned += 1,
            AccountOutcome::RetriesExhausted => self.retries_exhausted += 1,
        }
    }
}

/// Drop zero allocations and order by allocation, largest first
///
/// The sort is stable, so equal allocations keep their file order.
pub fn launch_order(accounts: Vec<Account>) -> Vec<Account> {
    let mut queue: Vec<Account> = accounts
        .into_iter()
        .filter(|account| !account.allocation().is_zero())
        .collect();
    queue.sort_by(|a, b| b.allocation().cmp(&a.allocation()));
    queue
}

pub struct Dispatcher {
    ctx: Arc<ClaimContext>,
    threads: usize,
}

impl Dispatcher {
    pub fn new(ctx: Arc<ClaimContext>, threads: usize) -> Self {
        Self {
            ctx,
            threads: threads.max(1),
        }
    }

    pub async fn run(&self, accounts: Vec<Account>) -> ClaimerResult<DispatchSummary> {
        let queue = launch_order(accounts);
        let ledger: Arc<Vec<LedgerEntry>> = Arc::new(
            queue
                .iter()
                .map(|account| LedgerEntry {
                    address: account.address(),
                    allocation: account.allocation(),
                })
                .collect(),
        );

        let paid = self.ctx.store.paid_commission().await?;
        let target = total_commission_target(&ledger, &paid, self.ctx.settings.commission_rate);
        info!("[Main] Total commission: {} $ZRO", format_token_amount(target));

        let mut summary = DispatchSummary {
            total_commission: target,
            ..Default::default()
        };
        let mut allocator = CommissionAllocator::new(target);
        let semaphore = Arc::new(Semaphore::new(self.threads));
        let mut tasks = JoinSet::new();

        info!(
            "[Main] Launching {} accounts on {} with {} concurrent workflows",
            queue.len(),
            self.ctx.network,
            self.threads
        );

        for account in queue {
            let commission = allocator.next_contribution(account.allocation());
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| ClaimerError::Other(format!("Launch semaphore closed: {}", e)))?;

            summary.launched.push(account.address());
            let workflow = ClaimWorkflow::new(Arc::clone(&self.ctx), Arc::clone(&ledger), account, commission);
            tasks.spawn(async move {
                let _permit = permit;
                workflow.run().await
            });

            self.ctx.settings.sleep.sleep().await;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("[Main] Workflow task failed: {}", e);
                    summary.abandoned += 1;
                }
            }
        }

        info!(
            "[Main] Done: {} completed, {} abandoned, {} out of retries",
            summary.completed, summary.abandoned, summary.retries_exhausted
        );
        Ok(summary)
    }
}
