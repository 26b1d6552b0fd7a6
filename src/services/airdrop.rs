//! Airdrop allocation and Merkle proof API

use crate::error::{ClaimerError, ClaimerResult};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

use super::http_client;

/// Marker the API returns for addresses without an allocation
const NOT_FOUND_MARKER: &str = "Record not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Eligible(U256),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimProof {
    pub proof: Vec<B256>,
    pub amount: U256,
}

#[async_trait]
pub trait AirdropApi: Send + Sync {
    async fn allocation(&self, address: Address, proxy: Option<&str>) -> ClaimerResult<Allocation>;

    /// Merkle proof; a non-success response is `ProofUnavailable`
    async fn proof(&self, address: Address, proxy: Option<&str>) -> ClaimerResult<ClaimProof>;
}

pub struct HttpAirdropApi {
    base_url: String,
}

impl HttpAirdropApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, kind: &str, address: Address) -> String {
        format!("{}/api/{}/{}", self.base_url, kind, lower_hex(address))
    }
}

fn lower_hex(address: Address) -> String {
    format!("{:#x}", address)
}

#[async_trait]
impl AirdropApi for HttpAirdropApi {
    async fn allocation(&self, address: Address, proxy: Option<&str>) -> ClaimerResult<Allocation> {
        let url = self.url("allocation", address);
        debug!("[Eligibility] GET {}", url);

        let response = http_client(proxy)?.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_allocation(status, &body)
    }

    async fn proof(&self, address: Address, proxy: Option<&str>) -> ClaimerResult<ClaimProof> {
        let url = self.url("proof", address);
        let unavailable = |reason: String| ClaimerError::ProofUnavailable {
            address: address.to_checksum(None),
            reason,
        };

        let response = http_client(proxy)?.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(unavailable(body));
        }
        parse_proof(&body).map_err(|e| ClaimerError::InvalidResponse {
            endpoint: "proof".to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct AllocationBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(rename = "zroAllocation")]
    zro_allocation: Option<AllocationAmount>,
}

#[derive(Deserialize)]
struct AllocationAmount {
    #[serde(rename = "asBigInt")]
    as_big_int: Value,
}

/// Interpret an allocation response
///
/// The not-found marker is honoured on 2xx and 404 alike. Other non-2xx
/// statuses are API failures.
pub fn parse_allocation(status: u16, body: &str) -> ClaimerResult<Allocation> {
    let parsed: Option<AllocationBody> = serde_json::from_str(body).ok();

    let not_found = parsed
        .as_ref()
        .and_then(|b| b.error.as_deref())
        .map_or(false, |error| error == NOT_FOUND_MARKER);
    if not_found && ((200..300).contains(&status) || status == 404) {
        return Ok(Allocation::NotFound);
    }

    if !(200..300).contains(&status) {
        return Err(ClaimerError::ApiCallFailed {
            endpoint: "allocation".to_string(),
            status,
            reason: body.to_string(),
        });
    }

    let invalid = |reason: &str| ClaimerError::InvalidResponse {
        endpoint: "allocation".to_string(),
        reason: reason.to_string(),
    };

    let amount = parsed
        .and_then(|b| b.zro_allocation)
        .ok_or_else(|| invalid("missing zroAllocation.asBigInt"))?;

    let digits = match &amount.as_big_int {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(invalid("asBigInt is not a number")),
    };

    U256::from_str(&digits)
        .map(Allocation::Eligible)
        .map_err(|_| invalid(&format!("asBigInt '{}' is not an integer", digits)))
}

#[derive(Deserialize)]
struct ProofBody {
    proof: String,
    amount: Value,
}

/// Parse a `{ "proof": "0x..|0x..", "amount": "..." }` body
pub fn parse_proof(body: &str) -> ClaimerResult<ClaimProof> {
    let parsed: ProofBody = serde_json::from_str(body)?;

    let proof = parsed
        .proof
        .split('|')
        .filter(|node| !node.trim().is_empty())
        .map(|node| {
            B256::from_str(node.trim())
                .map_err(|e| ClaimerError::Other(format!("invalid proof node '{}': {}", node, e)))
        })
        .collect::<ClaimerResult<Vec<_>>>()?;

    let digits = match parsed.amount {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => return Err(ClaimerError::Other(format!("invalid proof amount {}", other))),
    };
    let amount = U256::from_str(digits.trim())
        .map_err(|_| ClaimerError::Other(format!("invalid proof amount '{}'", digits)))?;

    Ok(ClaimProof { proof, amount })
}
