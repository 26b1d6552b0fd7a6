//! Gas fee suggestions

use crate::chain::GasFees;
use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::parse_gwei;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::http_client;

#[async_trait]
pub trait GasOracle: Send + Sync {
    /// Suggested `high`-tier fees; `None` when no usable suggestion exists
    async fn suggest_gas_fees(&self, chain_id: u64, proxy: Option<&str>) -> Option<GasFees>;
}

pub struct HttpGasOracle {
    base_url: String,
}

impl HttpGasOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, chain_id: u64, proxy: Option<&str>) -> ClaimerResult<GasFees> {
        let url = format!("{}/networks/{}/suggestedGasFees", self.base_url, chain_id);
        let response = http_client(proxy)?.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_gas_response(status, &body)
    }
}

#[async_trait]
impl GasOracle for HttpGasOracle {
    async fn suggest_gas_fees(&self, chain_id: u64, proxy: Option<&str>) -> Option<GasFees> {
        match self.fetch(chain_id, proxy).await {
            Ok(fees) => Some(fees),
            Err(e) => {
                warn!("[Gas] Failed to get gas price for chain with ID {}: {}", chain_id, e);
                None
            }
        }
    }
}

#[derive(Deserialize)]
struct SuggestedFees {
    high: FeeTier,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeTier {
    suggested_max_fee_per_gas: String,
    suggested_max_priority_fee_per_gas: String,
}

/// Anything but a 200 is an outage, whatever the body says
pub fn parse_gas_response(status: u16, body: &str) -> ClaimerResult<GasFees> {
    if status != 200 {
        return Err(ClaimerError::ApiCallFailed {
            endpoint: "suggestedGasFees".to_string(),
            status,
            reason: body.to_string(),
        });
    }
    parse_gas_fees(body)
}

/// Convert the `high` tier's gwei strings to wei
pub fn parse_gas_fees(body: &str) -> ClaimerResult<GasFees> {
    let fees: SuggestedFees = serde_json::from_str(body)?;
    Ok(GasFees {
        max_fee_per_gas: parse_gwei(&fees.high.suggested_max_fee_per_gas)?,
        max_priority_fee_per_gas: parse_gwei(&fees.high.suggested_max_priority_fee_per_gas)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_high_tier() {
        let body = r#"{
            "low": {"suggestedMaxFeePerGas": "1", "suggestedMaxPriorityFeePerGas": "0.001"},
            "high": {"suggestedMaxFeePerGas": "30.5", "suggestedMaxPriorityFeePerGas": "0.01"}
        }"#;
        let fees = parse_gas_fees(body).unwrap();
        assert_eq!(fees.max_fee_per_gas, 30_500_000_000);
        assert_eq!(fees.max_priority_fee_per_gas, 10_000_000);
    }

    #[test]
    fn test_non_200_is_an_outage() {
        let body = r#"{"high": {"suggestedMaxFeePerGas": "30", "suggestedMaxPriorityFeePerGas": "1"}}"#;
        assert!(parse_gas_response(200, body).is_ok());

        let err = parse_gas_response(503, body).unwrap_err();
        assert!(matches!(err, ClaimerError::ApiCallFailed { status: 503, .. }));
        assert!(parse_gas_response(201, body).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_oracle_suggests_nothing() {
        let oracle = HttpGasOracle::new("http://127.0.0.1:1/");
        assert!(oracle.suggest_gas_fees(42161, None).await.is_none());
    }

    #[test]
    fn test_parse_missing_tier() {
        assert!(parse_gas_fees(r#"{"low": {}}"#).is_err());
    }
}
