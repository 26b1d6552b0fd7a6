//! Commission recipient resolution

use crate::error::{ClaimerError, ClaimerResult};
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::error;

use super::http_client;

/// Decides where an account's commission is sent
#[async_trait]
pub trait CommissionRouter: Send + Sync {
    async fn commission_address(&self, account: Address, proxy: Option<&str>) -> ClaimerResult<Address>;
}

/// Always the same recipient
pub struct FixedCommissionRouter {
    address: Address,
}

impl FixedCommissionRouter {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

#[async_trait]
impl CommissionRouter for FixedCommissionRouter {
    async fn commission_address(&self, _account: Address, _proxy: Option<&str>) -> ClaimerResult<Address> {
        Ok(self.address)
    }
}

/// Asks a commission server for a per-account deposit address
pub struct HttpCommissionRouter {
    url: String,
}

impl HttpCommissionRouter {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl CommissionRouter for HttpCommissionRouter {
    async fn commission_address(&self, account: Address, proxy: Option<&str>) -> ClaimerResult<Address> {
        let response = http_client(proxy)?
            .post(&self.url)
            .json(&json!({ "address": account.to_checksum(None) }))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let result = parse_commission_response(status, &body);
        if let Err(e) = &result {
            error!("[Claim] CRITICAL: Exception occurred while getting commission address: {}", e);
        }
        result
    }
}

#[derive(Deserialize)]
struct DepositBody {
    deposit_address: String,
}

pub fn parse_commission_response(status: u16, body: &str) -> ClaimerResult<Address> {
    match status {
        200 => {
            let parsed: DepositBody = serde_json::from_str(body)?;
            Address::from_str(&parsed.deposit_address).map_err(|e| ClaimerError::InvalidResponse {
                endpoint: "commission".to_string(),
                reason: format!("invalid deposit_address '{}': {}", parsed.deposit_address, e),
            })
        }
        400 => Err(ClaimerError::CommissionRejected(body.to_string())),
        _ => Err(ClaimerError::ApiCallFailed {
            endpoint: "commission".to_string(),
            status,
            reason: body.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_address_response() {
        let body = r#"{"deposit_address":"0x32846a9aaf5eb8533095515785643a3bd3fdb5e9"}"#;
        assert_eq!(
            parse_commission_response(200, body).unwrap(),
            Address::from_str("0x32846a9aaf5eb8533095515785643a3bd3fdb5e9").unwrap()
        );
    }

    #[test]
    fn test_rejection_and_failure() {
        assert!(matches!(
            parse_commission_response(400, "address banned"),
            Err(ClaimerError::CommissionRejected(ref reason)) if reason == "address banned"
        ));
        assert!(matches!(
            parse_commission_response(503, "down"),
            Err(ClaimerError::ApiCallFailed { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fixed_router() {
        let recipient = Address::repeat_byte(0x33);
        let router = FixedCommissionRouter::new(recipient);
        assert_eq!(
            router.commission_address(Address::ZERO, None).await.unwrap(),
            recipient
        );
    }
}
