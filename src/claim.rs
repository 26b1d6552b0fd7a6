//! Per-network claim transaction preparation

use crate::chain::contracts::{
    decode_claim_callback_fee, decode_required_native_donation, encode_donate_and_claim,
    encode_quote_claim_callback, encode_required_donation,
};
use crate::chain::ChainClient;
use crate::error::{ClaimerError, ClaimerResult};
use crate::logic::fixed_donation;
use crate::networks::{ClaimRoute, Network};
use crate::services::ClaimProof;
use alloy::primitives::{Address, Bytes, U256};

/// A ready-to-sign claim call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedClaim {
    pub contract: Address,
    pub data: Bytes,
    /// Native value attached to the call
    pub value: U256,
    /// Donation part of `value`
    pub donation: U256,
}

/// Build the claim call for `network`
///
/// The local route donates a fixed fraction priced off `eth_price_usd`. The
/// remote routes ask the claim contract for the required donation and add the
/// cross-chain callback fee on top.
pub async fn prepare_claim(
    network: &Network,
    chain: &dyn ChainClient,
    proof: &ClaimProof,
    recipient: Address,
    eth_price_usd: u64,
) -> ClaimerResult<PreparedClaim> {
    match network.claim_route {
        ClaimRoute::Local { contract } => {
            let donation = fixed_donation(proof.amount, eth_price_usd);
            Ok(PreparedClaim {
                contract,
                data: encode_donate_and_claim(donation, proof.amount, &proof.proof, recipient),
                value: donation,
                donation,
            })
        }
        ClaimRoute::Remote { contract } => {
            let raw = chain.call(contract, encode_required_donation(proof.amount)).await?;
            let donation = decode_required_native_donation(&raw)?;

            let raw = chain.call(contract, encode_quote_claim_callback(donation)).await?;
            let fee = decode_claim_callback_fee(&raw)?;

            Ok(PreparedClaim {
                contract,
                data: encode_donate_and_claim(donation, proof.amount, &proof.proof, recipient),
                value: donation + fee,
                donation,
            })
        }
        ClaimRoute::Unsupported => Err(ClaimerError::ClaimUnsupported {
            network: network.label.clone(),
        }),
    }
}
