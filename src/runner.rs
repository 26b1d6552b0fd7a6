//! One interactive claimer run
//!
//! Load accounts, resolve allocations, ask the operator for a network, then
//! hand the eligible accounts to the dispatcher.

use crate::accounts::load_accounts;
use crate::chain::EvmConnector;
use crate::config::{ClaimerConfig, CommissionMode};
use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::eligibility::EligibilityResolver;
use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::parse_network_index;
use crate::networks::{Network, NetworkName, TOKEN_ADDRESS};
use crate::output::{ConsoleOutput, Output};
use crate::pacing::SleepPolicy;
use crate::services::{CommissionRouter, FixedCommissionRouter, HttpAirdropApi, HttpCommissionRouter, HttpGasOracle};
use crate::store::ProgressStore;
use crate::workflow::{ClaimContext, WorkflowSettings};
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Prompt until the operator picks a valid network
///
/// End of input aborts with a configuration error.
pub fn select_network<R: BufRead>(
    reader: &mut R,
    output: &dyn Output,
    rpc_overrides: &HashMap<NetworkName, String>,
) -> ClaimerResult<Network> {
    output.header("Networks")?;
    for (index, name) in NetworkName::ALL.iter().enumerate() {
        output.print(&format!("[{}] {}", index + 1, name))?;
    }

    loop {
        output.prompt("Enter network number: ")?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(ClaimerError::ConfigError("No network selected".to_string()));
        }

        match parse_network_index(&line, NetworkName::ALL.len()) {
            Some(index) => {
                let network = Network::resolve(NetworkName::ALL[index], rpc_overrides);
                info!("[Main] Selected network: {}", network);
                return Ok(network);
            }
            None => {
                warn!("[Main] Invalid network number");
                output.error("Invalid network number")?;
            }
        }
    }
}

fn commission_router(config: &ClaimerConfig) -> ClaimerResult<Arc<dyn CommissionRouter>> {
    match config.commission_mode {
        CommissionMode::Default => Ok(Arc::new(FixedCommissionRouter::new(config.commission_address))),
        CommissionMode::Server => {
            let url = config
                .commission_server_url
                .clone()
                .ok_or_else(|| ClaimerError::ConfigError("commission_server_url is not set".to_string()))?;
            Ok(Arc::new(HttpCommissionRouter::new(url)))
        }
    }
}

/// Run the claimer end to end
///
/// Returns `Ok(None)` when allocation lookup failed and nothing was
/// dispatched.
pub async fn run_claimer(config: &ClaimerConfig) -> ClaimerResult<Option<DispatchSummary>> {
    let accounts = load_accounts(&config.paths.accounts)?;

    ProgressStore::initialize_missing(&config.paths).await?;
    let store = Arc::new(ProgressStore::open(&config.paths).await?);
    let airdrop = Arc::new(HttpAirdropApi::new(config.endpoints.airdrop_api.clone()));

    let resolver = EligibilityResolver::new(Arc::clone(&store), airdrop.clone());
    let accounts = match resolver.resolve(accounts).await {
        Ok(accounts) => accounts,
        Err(e) => {
            error!("[Main] Stopping before dispatch: {}", e);
            return Ok(None);
        }
    };

    let overrides = config.rpc_overrides()?;
    let network = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let mut reader = stdin.lock();
        select_network(&mut reader, &ConsoleOutput, &overrides)
    })
    .await
    .map_err(|e| ClaimerError::Other(format!("Network prompt failed: {}", e)))??;

    let ctx = Arc::new(ClaimContext {
        network,
        token: TOKEN_ADDRESS,
        store,
        airdrop,
        gas: Arc::new(HttpGasOracle::new(config.endpoints.gas_api.clone())),
        commission_router: commission_router(config)?,
        connector: Arc::new(EvmConnector),
        settings: WorkflowSettings {
            max_retries: config.max_retries,
            commission_rate: config.commission_rate(),
            eth_price_usd: config.eth_price_usd,
            balance_poll_interval: config.balance_poll_interval(),
            receipt_timeout: config.receipt_timeout(),
            sleep: SleepPolicy::new(config.min_sleep_time, config.max_sleep_time),
        },
    });

    let summary = Dispatcher::new(ctx, config.threads).run(accounts).await?;
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::MockOutput;
    use std::io::Cursor;

    #[test]
    fn test_select_network_reprompts() {
        let output = MockOutput::new();
        let mut input = Cursor::new("9\nbase\n3\n");

        let network = select_network(&mut input, &output, &HashMap::new()).unwrap();
        assert_eq!(network.name, NetworkName::Base);
        assert_eq!(output.get_errors().len(), 2);
        assert!(output.get_messages().iter().any(|m| m == "[1] Arbitrum"));
    }

    #[test]
    fn test_select_network_eof() {
        let output = MockOutput::new();
        let mut input = Cursor::new("0\n");

        let err = select_network(&mut input, &output, &HashMap::new()).unwrap_err();
        assert!(matches!(err, ClaimerError::ConfigError(_)));
    }

    #[test]
    fn test_select_network_uses_rpc_override() {
        let output = MockOutput::new();
        let mut input = Cursor::new("1\n");
        let overrides = HashMap::from([(NetworkName::Arbitrum, "http://localhost:8545".to_string())]);

        let network = select_network(&mut input, &output, &overrides).unwrap();
        assert_eq!(network.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_server_router_requires_url() {
        let config = ClaimerConfig {
            commission_mode: CommissionMode::Server,
            commission_server_url: None,
            ..Default::default()
        };
        assert!(commission_router(&config).is_err());
    }
}
