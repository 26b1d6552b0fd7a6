//! HTTP collaborators
//!
//! Each external service sits behind a trait so the workflow can run against
//! in-memory doubles. The reqwest implementations keep response parsing in
//! pure functions next to them.

pub mod airdrop;
pub mod commission;
pub mod gas;

use crate::error::ClaimerResult;
use std::time::Duration;

pub use airdrop::{Allocation, AirdropApi, ClaimProof, HttpAirdropApi};
pub use commission::{CommissionRouter, FixedCommissionRouter, HttpCommissionRouter};
pub use gas::{GasOracle, HttpGasOracle};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client routed through `proxy` when one is set
pub fn http_client(proxy: Option<&str>) -> ClaimerResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}
